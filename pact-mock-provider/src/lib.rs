mod configuration;
mod data;
mod error;
mod ledger;
mod matching;
mod mock_provider;
mod pact_writer;
mod readiness;
mod runner;
mod test_session;
pub mod transport;
mod util;
mod verdict;

pub use configuration::{MockProviderConfig, PACT_OVERWRITE_ENV, PACT_ROOT_DIR_ENV};
pub use data::{Interaction, OptionalBody, Pact, PactSpecVersion, Request, Response};
pub use error::Error;
pub use ledger::MismatchLedger;
pub use matching::{ExactMatcher, InteractionMatcher, MatchResult, RequestDiff};
pub use mock_provider::{
    unexpected_request_response, MockProvider, MockProviderHandle, UNEXPECTED_REQUEST_HEADER,
};
pub use pact_mock_provider_codegen::pact_consumer_test;
pub use pact_writer::{JsonPactWriter, PactWriter};
pub use readiness::{NoWait, ReadinessProbe, TcpConnectProbe};
pub use test_session::{block_on_consumer_test, run_consumer_test};
pub use util::{Charset, DEFAULT_CHARSET};
pub use verdict::{MismatchRecord, TestFailure, TestOutcome, VerificationVerdict};
