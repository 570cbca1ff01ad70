use crate::{
    configuration::MockProviderConfig,
    data::{Pact, Request, Response},
    error::Error,
    ledger::MismatchLedger,
    matching::{ExactMatcher, InteractionMatcher, MatchResult},
    pact_writer::{JsonPactWriter, PactWriter},
    runner::{self, RunningServer},
    verdict::{MismatchRecord, TestFailure, TestOutcome, VerificationVerdict},
};
use futures::FutureExt;
use std::{
    any::Any,
    future::Future,
    io,
    net::SocketAddr,
    panic::AssertUnwindSafe,
    sync::Arc,
};

pub const UNEXPECTED_REQUEST_HEADER: &str = "X-Pact-Unexpected-Request";

/// The synthetic response sent for any request that isn't an exact match.
pub fn unexpected_request_response(request: &Request) -> Response {
    let body = serde_json::json!({
        "error": format!("Unexpected request : {}", request),
    });

    Response::new(500)
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header("Content-Type", "application/json")
        .with_header(UNEXPECTED_REQUEST_HEADER, "1")
        .with_body(body.to_string())
}

/// Per-request decision procedure, shared by every connection of one server.
#[derive(Debug)]
pub(crate) struct RequestHandler {
    pact: Arc<Pact>,
    matcher: Arc<dyn InteractionMatcher + Send + Sync>,
    ledger: Arc<MismatchLedger>,
}

impl RequestHandler {
    pub(crate) fn handle(&self, request: Request) -> Response {
        match self
            .matcher
            .match_interaction(&request, &self.pact.interactions)
        {
            MatchResult::FullMatch(interaction) => {
                tracing::debug!(
                    method = request.method(),
                    path = request.path(),
                    interaction = interaction.description.as_str(),
                    "Request matched"
                );
                interaction.response.clone()
            }
            MatchResult::PartialMatch(interaction, problems) => {
                tracing::warn!(
                    method = request.method(),
                    path = request.path(),
                    interaction = interaction.description.as_str(),
                    problems = problems.len(),
                    "Request partially matched"
                );
                // keyed by the expected request so repeated near misses collect together
                self.ledger.record(
                    interaction.request.clone(),
                    MismatchRecord::PartialMismatch {
                        description: interaction.description.clone(),
                        problems,
                    },
                );
                unexpected_request_response(&request)
            }
            MatchResult::NoMatch => {
                tracing::warn!(
                    method = request.method(),
                    path = request.path(),
                    "Unexpected request"
                );
                let response = unexpected_request_response(&request);
                self.ledger
                    .record(request.clone(), MismatchRecord::UnexpectedRequest(request));
                response
            }
        }
    }
}

/// What the consumer test gets to talk to the running mock provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockProviderHandle {
    address: SocketAddr,
}

impl MockProviderHandle {
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn url_for<S: AsRef<str>>(&self, path: S) -> String {
        format!("{}{}", self.url(), path.as_ref())
    }
}

#[derive(Debug)]
enum ServerState {
    Created,
    Started(RunningServer),
    Stopped,
}

/// A mock provider for one consumer test run.
///
/// The lifecycle is start, consumer calls, validate, stop, which [`MockProvider::run`] drives
/// end to end. Every provider owns a fresh [`MismatchLedger`], so nothing leaks between
/// runs.
#[derive(Debug)]
pub struct MockProvider {
    config: MockProviderConfig,
    pact: Arc<Pact>,
    matcher: Arc<dyn InteractionMatcher + Send + Sync>,
    pact_writer: Arc<dyn PactWriter + Send + Sync>,
    ledger: Arc<MismatchLedger>,
    state: ServerState,
}

impl MockProvider {
    pub fn new(pact: Pact, config: MockProviderConfig) -> Self {
        let pact_writer = Arc::new(JsonPactWriter::new(config.overwrite_pacts()));

        Self {
            config,
            pact: Arc::new(pact),
            matcher: Arc::new(ExactMatcher::new()),
            pact_writer,
            ledger: Arc::new(MismatchLedger::new()),
            state: ServerState::Created,
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn InteractionMatcher + Send + Sync>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_pact_writer(mut self, pact_writer: Arc<dyn PactWriter + Send + Sync>) -> Self {
        self.pact_writer = pact_writer;
        self
    }

    pub fn pact(&self) -> &Pact {
        &self.pact
    }

    pub fn config(&self) -> &MockProviderConfig {
        &self.config
    }

    /// The bound address, while the server is running.
    pub fn address(&self) -> Option<SocketAddr> {
        match &self.state {
            ServerState::Started(server) => Some(server.address()),
            ServerState::Created | ServerState::Stopped => None,
        }
    }

    pub fn handle(&self) -> Result<MockProviderHandle, Error> {
        self.address()
            .map(|address| MockProviderHandle { address })
            .ok_or(Error::NotStarted)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ServerState::Started(_))
    }

    /// Binds the listener and starts serving. A provider can only be started once.
    pub async fn start(&mut self) -> Result<MockProviderHandle, Error> {
        if !matches!(self.state, ServerState::Created) {
            return Err(Error::AlreadyStarted);
        }

        let address = tokio::net::lookup_host((self.config.hostname(), self.config.port()))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("couldn't resolve {}", self.config.hostname()),
                )
            })?;

        let handler = Arc::new(RequestHandler {
            pact: self.pact.clone(),
            matcher: self.matcher.clone(),
            ledger: self.ledger.clone(),
        });

        let server = runner::start(address, handler)?;
        let handle = MockProviderHandle {
            address: server.address(),
        };
        self.state = ServerState::Started(server);

        Ok(handle)
    }

    pub async fn wait_for_server(&self) -> Result<(), Error> {
        let address = self.address().ok_or(Error::NotStarted)?;

        self.config
            .readiness_probe()
            .wait_until_ready(address)
            .await
    }

    /// Unbinds the listener. Stopping a provider that isn't running does nothing.
    pub async fn stop(&mut self) {
        match std::mem::replace(&mut self.state, ServerState::Stopped) {
            ServerState::Started(server) => server.stop(self.config.shutdown_grace()).await,
            ServerState::Created => self.state = ServerState::Created,
            ServerState::Stopped => tracing::debug!("Mock provider already stopped"),
        }
    }

    /// Turns the ledger, and the test's own outcome, into the verdict for this run.
    pub fn validate(&self, test_result: Result<(), TestFailure>) -> VerificationVerdict {
        match test_result {
            Ok(()) => self.ledger.snapshot(),
            Err(failure) => VerificationVerdict::Error {
                failure,
                mock_server_state: Box::new(self.ledger.snapshot()),
            },
        }
    }

    /// Starts the server, runs `test` against it and stops the server again, whatever the test
    /// did. Only failing to start or to become ready is an `Err`.
    pub async fn run<F, Fut>(&mut self, test: F) -> Result<VerificationVerdict, Error>
    where
        F: FnOnce(MockProviderHandle) -> Fut,
        Fut: Future,
        Fut::Output: TestOutcome,
    {
        let handle = self.start().await?;

        let verdict = match self.wait_for_server().await {
            Ok(()) => {
                let test_result = AssertUnwindSafe(async move { test(handle).await })
                    .catch_unwind()
                    .await;

                let test_result = match test_result {
                    Ok(outcome) => outcome.into_test_result(),
                    Err(panic) => Err(TestFailure::Panicked(panic_message(panic))),
                };

                Ok(self.validate(test_result))
            }
            Err(e) => Err(e),
        };

        self.stop().await;
        verdict
    }

    /// [`MockProvider::run`], then writes the pact if and only if the verdict is `Ok`.
    pub async fn run_and_write_pact<F, Fut>(
        &mut self,
        test: F,
    ) -> Result<VerificationVerdict, Error>
    where
        F: FnOnce(MockProviderHandle) -> Fut,
        Fut: Future,
        Fut::Output: TestOutcome,
    {
        let verdict = self.run(test).await?;

        if verdict.is_ok() {
            if let Err(e) = self.pact_writer.write(
                &self.pact,
                self.config.pact_directory(),
                self.config.spec_version(),
            ) {
                tracing::error!(error = %e, "Couldn't write the pact");
                return Err(e);
            }
        } else {
            tracing::info!(
                consumer = self.pact.consumer.as_str(),
                provider = self.pact.provider.as_str(),
                "Verification failed, not writing the pact"
            );
        }

        Ok(verdict)
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        String::from(*message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("<non-string panic payload>")
    }
}
