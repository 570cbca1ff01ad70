use crate::{
    configuration::MockProviderConfig,
    data::Pact,
    error::Error,
    mock_provider::{MockProvider, MockProviderHandle},
    verdict::{TestOutcome, VerificationVerdict},
};
use std::future::Future;

/// Runs `test` against a fresh mock provider for `pact` and writes the pact if every request
/// matched.
pub async fn run_consumer_test<F, Fut>(
    pact: Pact,
    config: MockProviderConfig,
    test: F,
) -> Result<VerificationVerdict, Error>
where
    F: FnOnce(MockProviderHandle) -> Fut,
    Fut: Future,
    Fut::Output: TestOutcome,
{
    MockProvider::new(pact, config).run_and_write_pact(test).await
}

/// [`run_consumer_test`] on its own multi-threaded runtime, for synchronous tests.
pub fn block_on_consumer_test<F, Fut>(
    pact: Pact,
    config: MockProviderConfig,
    test: F,
) -> Result<VerificationVerdict, Error>
where
    F: FnOnce(MockProviderHandle) -> Fut,
    Fut: Future,
    Fut::Output: TestOutcome,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_consumer_test(pact, config, test))
}
