#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use lexicon_tools::confirm::ConfirmationPolicy;
use lexicon_tools::gateway::{MetadataGateway, WriteAck};
use lexicon_tools::model::{
    CatalogField, DictionaryField, FieldDefinition, SchemaField, TypeChange, to_catalog_fields,
};
use lexicon_tools::{Result, ToolError};

/// In-memory catalog that records every call.
#[derive(Default)]
pub struct RecordingGateway {
    /// `None` makes every call fail with `NotFound`.
    pub schema: Option<Vec<SchemaField>>,
    pub dictionary: Vec<DictionaryField>,
    pub read_only: bool,
    pub offline: bool,
    pub writes: RefCell<Vec<(String, Vec<CatalogField>)>>,
    pub calls: RefCell<Vec<&'static str>>,
}

impl RecordingGateway {
    pub fn new(schema: &[&str], dictionary: &[(&str, &str)]) -> Self {
        Self {
            schema: Some(schema.iter().map(|id| SchemaField::new(*id)).collect()),
            dictionary: dictionary
                .iter()
                .map(|(id, field_type)| DictionaryField::new(*id, *field_type))
                .collect(),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(String, Vec<CatalogField>)> {
        self.writes.borrow().clone()
    }

    fn guard(&self, resource_id: &str, call: &'static str) -> Result<()> {
        self.calls.borrow_mut().push(call);
        if self.offline {
            return Err(ToolError::Transport("connection refused".into()));
        }
        if self.schema.is_none() {
            return Err(ToolError::NotFound {
                resource_id: resource_id.to_string(),
            });
        }
        Ok(())
    }
}

impl MetadataGateway for RecordingGateway {
    fn fetch_schema(&self, resource_id: &str) -> Result<Vec<SchemaField>> {
        self.guard(resource_id, "fetch_schema")?;
        Ok(self.schema.clone().unwrap_or_default())
    }

    fn fetch_dictionary(&self, resource_id: &str) -> Result<Vec<DictionaryField>> {
        self.guard(resource_id, "fetch_dictionary")?;
        Ok(self.dictionary.clone())
    }

    fn write_dictionary(
        &self,
        resource_id: &str,
        definitions: &[FieldDefinition],
    ) -> Result<WriteAck> {
        self.guard(resource_id, "write_dictionary")?;
        if self.read_only {
            return Err(ToolError::WriteRejected {
                resource_id: resource_id.to_string(),
                reason: "read-only: Cannot edit read-only resource".into(),
            });
        }
        self.writes
            .borrow_mut()
            .push((resource_id.to_string(), to_catalog_fields(definitions)));
        Ok(WriteAck {
            resource_id: resource_id.to_string(),
            field_count: definitions.len(),
        })
    }
}

/// Answers from a fixed script and remembers what it was asked.
pub struct ScriptedPolicy {
    answers: Vec<bool>,
    pub asked: Vec<TypeChange>,
}

impl ScriptedPolicy {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.to_vec(),
            asked: Vec::new(),
        }
    }
}

impl ConfirmationPolicy for ScriptedPolicy {
    fn decide(&mut self, change: &TypeChange) -> Result<bool> {
        self.asked.push(change.clone());
        Ok(if self.answers.is_empty() {
            false
        } else {
            self.answers.remove(0)
        })
    }
}

pub fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("fixture written");
    path
}
