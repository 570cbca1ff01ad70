use crate::{data::Request, matching::RequestDiff};
use std::fmt::{self, Display};

/// A problem observed while the consumer exercised the mock provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchRecord {
    /// An interaction was close to the request but some parts diverged.
    PartialMismatch {
        description: String,
        problems: Vec<RequestDiff>,
    },
    /// No interaction was expected for the request.
    UnexpectedRequest(Request),
}

impl Display for MismatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchRecord::PartialMismatch {
                description,
                problems,
            } => {
                write!(f, "Partial match for '{}':", description)?;
                for problem in problems {
                    write!(f, "\n\t{}", problem)?;
                }
                Ok(())
            }
            MismatchRecord::UnexpectedRequest(request) => {
                write!(f, "Unexpected request:\n{}", request)
            }
        }
    }
}

/// Why the consumer test function itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestFailure {
    Failed(String),
    Panicked(String),
}

impl Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestFailure::Failed(message) => write!(f, "test failed: {}", message),
            TestFailure::Panicked(message) => write!(f, "test panicked: {}", message),
        }
    }
}

/// The single outcome of a run against the mock provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationVerdict {
    Ok,
    Mismatches(Vec<MismatchRecord>),
    Error {
        failure: TestFailure,
        mock_server_state: Box<VerificationVerdict>,
    },
}

impl VerificationVerdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, VerificationVerdict::Ok)
    }

    pub fn into_result(self) -> Result<(), VerificationVerdict> {
        match self {
            VerificationVerdict::Ok => Ok(()),
            verdict => Err(verdict),
        }
    }
}

impl Display for VerificationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationVerdict::Ok => write!(f, "all requests matched"),
            VerificationVerdict::Mismatches(mismatches) => {
                write!(f, "{} mismatch(es):", mismatches.len())?;
                for mismatch in mismatches {
                    write!(f, "\n{}", mismatch)?;
                }
                Ok(())
            }
            VerificationVerdict::Error {
                failure,
                mock_server_state,
            } => write!(f, "{}; mock provider state: {}", failure, mock_server_state),
        }
    }
}

/// What a consumer test function may return.
pub trait TestOutcome {
    fn into_test_result(self) -> Result<(), TestFailure>;
}

impl TestOutcome for () {
    fn into_test_result(self) -> Result<(), TestFailure> {
        Ok(())
    }
}

impl<E: Display> TestOutcome for Result<(), E> {
    fn into_test_result(self) -> Result<(), TestFailure> {
        self.map_err(|e| TestFailure::Failed(e.to_string()))
    }
}
