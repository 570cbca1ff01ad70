use crate::data::{Interaction, OptionalBody, Request};
use std::{collections::BTreeMap, fmt, fmt::Debug};

/// One way an actual request diverges from an expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestDiff {
    Method {
        expected: String,
        actual: String,
    },
    Path {
        expected: String,
        actual: String,
    },
    Query {
        expected: BTreeMap<String, Vec<String>>,
        actual: BTreeMap<String, Vec<String>>,
    },
    Header {
        name: String,
        expected: String,
        actual: Option<String>,
    },
    Body {
        expected: String,
        actual: String,
    },
}

impl fmt::Display for RequestDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestDiff::Method { expected, actual } => {
                write!(f, "Expected method {} but received {}", expected, actual)
            }
            RequestDiff::Path { expected, actual } => {
                write!(f, "Expected path '{}' but received '{}'", expected, actual)
            }
            RequestDiff::Query { expected, actual } => write!(
                f,
                "Expected query {:?} but received {:?}",
                expected, actual
            ),
            RequestDiff::Header {
                name,
                expected,
                actual: Some(actual),
            } => write!(
                f,
                "Expected header '{}' to have value '{}' but was '{}'",
                name, expected, actual
            ),
            RequestDiff::Header {
                name,
                expected,
                actual: None,
            } => write!(
                f,
                "Expected a header '{}' with value '{}' but was missing",
                name, expected
            ),
            RequestDiff::Body { expected, actual } => {
                write!(f, "Expected body '{}' but received '{}'", expected, actual)
            }
        }
    }
}

/// The decision for a single inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'a> {
    FullMatch(&'a Interaction),
    PartialMatch(&'a Interaction, Vec<RequestDiff>),
    NoMatch,
}

pub trait InteractionMatcher: Debug {
    fn match_interaction<'a>(
        &self,
        request: &Request,
        interactions: &'a [Interaction],
    ) -> MatchResult<'a>;
}

/// Method and path select candidates; query, headers and body decide between a full and a
/// partial match. Extra actual headers are allowed, missing or different expected ones are not.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatcher;

impl ExactMatcher {
    pub fn new() -> Self {
        Self
    }

    fn diff(expected: &Request, actual: &Request) -> Vec<RequestDiff> {
        let mut diffs = Vec::new();

        if !expected.method().eq_ignore_ascii_case(actual.method()) {
            diffs.push(RequestDiff::Method {
                expected: expected.method().into(),
                actual: actual.method().into(),
            });
        }

        if expected.path() != actual.path() {
            diffs.push(RequestDiff::Path {
                expected: expected.path().into(),
                actual: actual.path().into(),
            });
        }

        if expected.query() != actual.query() {
            diffs.push(RequestDiff::Query {
                expected: expected.query().clone(),
                actual: actual.query().clone(),
            });
        }

        for (name, expected_value) in expected.headers() {
            let actual_value = actual.header(name);
            if !actual_value.map_or(false, |value| header_values_equal(expected_value, value)) {
                diffs.push(RequestDiff::Header {
                    name: name.clone(),
                    expected: expected_value.clone(),
                    actual: actual_value.map(String::from),
                });
            }
        }

        if !expected.body().is_missing() && !bodies_equal(expected.body(), actual.body()) {
            diffs.push(RequestDiff::Body {
                expected: expected.body().to_string(),
                actual: actual.body().to_string(),
            });
        }

        diffs
    }
}

impl InteractionMatcher for ExactMatcher {
    fn match_interaction<'a>(
        &self,
        request: &Request,
        interactions: &'a [Interaction],
    ) -> MatchResult<'a> {
        let mut best: Option<(&'a Interaction, Vec<RequestDiff>)> = None;

        for interaction in interactions {
            let diffs = Self::diff(&interaction.request, request);
            if diffs.is_empty() {
                return MatchResult::FullMatch(interaction);
            }

            let is_candidate = diffs
                .iter()
                .all(|diff| !matches!(diff, RequestDiff::Method { .. } | RequestDiff::Path { .. }));
            let is_better = best
                .as_ref()
                .map_or(true, |(_, best_diffs)| diffs.len() < best_diffs.len());

            if is_candidate && is_better {
                best = Some((interaction, diffs));
            }
        }

        match best {
            Some((interaction, diffs)) => MatchResult::PartialMatch(interaction, diffs),
            None => MatchResult::NoMatch,
        }
    }
}

fn header_values_equal(expected: &str, actual: &str) -> bool {
    let expected = expected.split(',').map(str::trim);
    let actual = actual.split(',').map(str::trim);

    expected.eq(actual)
}

fn bodies_equal(expected: &OptionalBody, actual: &OptionalBody) -> bool {
    if expected == actual {
        return true;
    }

    let expected_json = serde_json::from_slice::<serde_json::Value>(expected.as_bytes());
    let actual_json = serde_json::from_slice::<serde_json::Value>(actual.as_bytes());

    match (expected_json, actual_json) {
        (Ok(expected), Ok(actual)) => expected == actual,
        _ => false,
    }
}
