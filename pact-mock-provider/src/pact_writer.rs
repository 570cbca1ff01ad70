use crate::{
    data::{Interaction, OptionalBody, Pact, PactSpecVersion},
    error::Error,
    util,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

pub trait PactWriter: Debug {
    /// Persists the pact inside `directory`, returning the path of the written file.
    fn write(
        &self,
        pact: &Pact,
        directory: &Path,
        spec_version: PactSpecVersion,
    ) -> Result<PathBuf, Error>;
}

#[derive(Serialize)]
struct Participant<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PactSpecification {
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    pact_specification: PactSpecification,
}

#[derive(Serialize)]
struct PactFile<'a> {
    consumer: Participant<'a>,
    provider: Participant<'a>,
    interactions: Vec<Value>,
    metadata: Metadata,
}

/// Writes pacts as `{consumer}-{provider}.json`. An existing file is merged unless `overwrite`
/// is set.
#[derive(Debug, Default, Clone)]
pub struct JsonPactWriter {
    overwrite: bool,
}

impl JsonPactWriter {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    fn merge(path: &Path, interactions: Vec<Value>) -> Result<Vec<Value>, Error> {
        let existing: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        let mut merged = existing
            .get("interactions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for interaction in interactions {
            match merged
                .iter()
                .position(|existing| existing["description"] == interaction["description"])
            {
                Some(index) if merged[index] != interaction => {
                    return Err(Error::PactMergeConflict {
                        path: path.to_path_buf(),
                        description: interaction["description"]
                            .as_str()
                            .unwrap_or_default()
                            .into(),
                    })
                }
                Some(_) => {}
                None => merged.push(interaction),
            }
        }

        Ok(merged)
    }
}

impl PactWriter for JsonPactWriter {
    fn write(
        &self,
        pact: &Pact,
        directory: &Path,
        spec_version: PactSpecVersion,
    ) -> Result<PathBuf, Error> {
        fs::create_dir_all(directory).map_err(|source| Error::PactDirectory {
            path: directory.to_path_buf(),
            source,
        })?;

        let path = directory.join(pact.file_name());
        let mut interactions = pact
            .interactions
            .iter()
            .map(|interaction| interaction_to_json(interaction, spec_version))
            .collect::<Vec<_>>();

        if !self.overwrite && path.exists() {
            interactions = Self::merge(&path, interactions)?;
        }

        let pact_file = PactFile {
            consumer: Participant {
                name: &pact.consumer,
            },
            provider: Participant {
                name: &pact.provider,
            },
            interactions,
            metadata: Metadata {
                pact_specification: PactSpecification {
                    version: spec_version.version_str(),
                },
            },
        };

        fs::write(&path, serde_json::to_string_pretty(&pact_file)?)?;
        tracing::info!(path = %path.display(), "Pact written");

        Ok(path)
    }
}

fn interaction_to_json(interaction: &Interaction, spec_version: PactSpecVersion) -> Value {
    let request = &interaction.request;
    let response = &interaction.response;

    let mut request_json = Map::new();
    request_json.insert("method".into(), json!(request.method()));
    request_json.insert("path".into(), json!(request.path()));
    if !request.query().is_empty() {
        request_json.insert("query".into(), query_to_json(request.query(), spec_version));
    }
    if !request.headers().is_empty() {
        request_json.insert("headers".into(), json!(request.headers()));
    }
    if let Some(body) = body_to_json(request.body(), request.content_type()) {
        request_json.insert("body".into(), body);
    }

    let mut response_json = Map::new();
    response_json.insert("status".into(), json!(response.status));
    if !response.headers.is_empty() {
        let headers = response
            .headers
            .iter()
            .map(|(name, values)| (name.clone(), values.join(", ")))
            .collect::<BTreeMap<_, _>>();
        response_json.insert("headers".into(), json!(headers));
    }
    if let Some(body) = body_to_json(&response.body, response.header("content-type").as_deref()) {
        response_json.insert("body".into(), body);
    }

    let mut interaction_json = Map::new();
    interaction_json.insert("description".into(), json!(interaction.description));
    if let Some(provider_state) = &interaction.provider_state {
        interaction_json.insert("providerState".into(), json!(provider_state));
    }
    interaction_json.insert("request".into(), Value::Object(request_json));
    interaction_json.insert("response".into(), Value::Object(response_json));

    Value::Object(interaction_json)
}

fn query_to_json(query: &BTreeMap<String, Vec<String>>, spec_version: PactSpecVersion) -> Value {
    match spec_version {
        PactSpecVersion::V3 => json!(query),
        PactSpecVersion::V1 | PactSpecVersion::V1_1 | PactSpecVersion::V2 => {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (name, values) in query {
                for value in values {
                    serializer.append_pair(name, value);
                }
            }
            json!(serializer.finish())
        }
    }
}

fn body_to_json(body: &OptionalBody, content_type: Option<&str>) -> Option<Value> {
    match body {
        OptionalBody::Missing => None,
        OptionalBody::Empty => Some(json!("")),
        OptionalBody::Present(bytes) => {
            let is_json = content_type.map_or(false, util::is_json_content_type);
            let parsed: Option<Value> = if is_json {
                serde_json::from_slice(bytes).ok()
            } else {
                None
            };
            Some(parsed.unwrap_or_else(|| json!(body.to_text())))
        }
    }
}
