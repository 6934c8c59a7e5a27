//! CKAN action API client.
//!
//! Both reads go through `datastore_search` with `limit = 0`: its `fields`
//! list carries the column ids (schema) and their types plus `info`
//! (dictionary). Writes go through `datastore_create` with `force = false`.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument, warn};

use crate::lexicon::tools::config::Credentials;
use crate::lexicon::tools::error::{Result, ToolError};
use crate::lexicon::tools::gateway::{MetadataGateway, WriteAck};
use crate::lexicon::tools::model::{DictionaryField, FieldDefinition, SchemaField, to_catalog_fields};

const SEARCH_ACTION: &str = "datastore_search";
const CREATE_ACTION: &str = "datastore_create";
const NOT_FOUND_TYPE: &str = "Not Found Error";
const READ_ONLY_MARKER: &str = "read-only";

/// Gateway speaking to a CKAN site.
pub struct CkanGateway {
    agent: ureq::Agent,
    credentials: Credentials,
}

impl CkanGateway {
    pub fn new(credentials: Credentials) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(credentials.timeout_secs))
            .user_agent(concat!("lexicon-tools/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent, credentials }
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/api/3/action/{action}", self.credentials.site)
    }

    fn call<T: DeserializeOwned>(&self, action: &str, resource_id: &str, body: Value) -> Result<T> {
        let url = self.action_url(action);
        debug!(%url, "calling catalog action");

        let mut request = self.agent.post(&url);
        if let Some(key) = &self.credentials.api_key {
            request = request.set("Authorization", key);
        }

        let response = match request.send_json(body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let error = response
                    .into_json::<Envelope<Value>>()
                    .ok()
                    .and_then(|envelope| envelope.error);
                return Err(classify(action, resource_id, status, error));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(ToolError::Transport(format!("{action}: {transport}")));
            }
        };

        let envelope: Envelope<T> = response
            .into_json()
            .map_err(|error| ToolError::Transport(format!("{action}: unreadable response: {error}")))?;
        if !envelope.success {
            return Err(classify(action, resource_id, 200, envelope.error));
        }
        envelope
            .result
            .ok_or_else(|| ToolError::Transport(format!("{action}: response carried no result")))
    }

    fn search_fields<F: DeserializeOwned>(&self, resource_id: &str) -> Result<Vec<F>> {
        let result: SearchResult<F> = self.call(
            SEARCH_ACTION,
            resource_id,
            json!({ "resource_id": resource_id, "limit": 0 }),
        )?;
        result.fields.ok_or_else(|| ToolError::NotFound {
            resource_id: resource_id.to_string(),
        })
    }
}

impl MetadataGateway for CkanGateway {
    #[instrument(level = "debug", skip(self))]
    fn fetch_schema(&self, resource_id: &str) -> Result<Vec<SchemaField>> {
        self.search_fields(resource_id)
    }

    #[instrument(level = "debug", skip(self))]
    fn fetch_dictionary(&self, resource_id: &str) -> Result<Vec<DictionaryField>> {
        self.search_fields(resource_id)
    }

    #[instrument(level = "debug", skip(self, definitions), fields(field_count = definitions.len()))]
    fn write_dictionary(
        &self,
        resource_id: &str,
        definitions: &[FieldDefinition],
    ) -> Result<WriteAck> {
        let fields = to_catalog_fields(definitions);
        let _: Value = self.call(
            CREATE_ACTION,
            resource_id,
            json!({ "resource_id": resource_id, "fields": fields, "force": false }),
        )?;
        Ok(WriteAck {
            resource_id: resource_id.to_string(),
            field_count: fields.len(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    error: Option<ActionError>,
}

#[derive(Debug, Deserialize)]
struct SearchResult<F> {
    fields: Option<Vec<F>>,
}

/// Error object of a failed action, e.g.
/// `{"__type": "Validation Error", "read-only": ["Cannot edit read-only resource..."]}`.
#[derive(Debug, Default, Deserialize)]
struct ActionError {
    #[serde(rename = "__type")]
    kind: Option<String>,
    message: Option<String>,
    #[serde(flatten)]
    details: Map<String, Value>,
}

impl ActionError {
    fn describe(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        for (key, value) in &self.details {
            let text = match value {
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                    .collect::<Vec<_>>()
                    .join("; "),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            parts.push(format!("{key}: {text}"));
        }
        if parts.is_empty() {
            self.kind.clone().unwrap_or_else(|| "unknown error".to_string())
        } else {
            parts.join("; ")
        }
    }

    fn mentions_read_only(&self) -> bool {
        self.details.contains_key(READ_ONLY_MARKER)
            || self
                .message
                .as_deref()
                .is_some_and(|message| message.contains(READ_ONLY_MARKER))
    }
}

fn classify(action: &str, resource_id: &str, status: u16, error: Option<ActionError>) -> ToolError {
    let error = error.unwrap_or_default();
    if status == 404 || error.kind.as_deref() == Some(NOT_FOUND_TYPE) {
        return ToolError::NotFound {
            resource_id: resource_id.to_string(),
        };
    }
    if action == CREATE_ACTION && error.mentions_read_only() {
        let reason = error.describe();
        warn!(%resource_id, %reason, "catalog refused dictionary write");
        return ToolError::WriteRejected {
            resource_id: resource_id.to_string(),
            reason,
        };
    }
    ToolError::Transport(format!("{action} failed with status {status}: {}", error.describe()))
}
