//! Access to the remote catalog's datastore metadata.

pub mod ckan;

use crate::lexicon::tools::error::Result;
use crate::lexicon::tools::model::{DictionaryField, FieldDefinition, SchemaField};

pub use ckan::CkanGateway;

/// Acknowledgement returned by a successful dictionary write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub resource_id: String,
    pub field_count: usize,
}

/// Reads a resource's schema and stored dictionary, and replaces the
/// dictionary.
///
/// Reads are idempotent. `write_dictionary` is not, and implementations must
/// not retry it.
pub trait MetadataGateway {
    /// Physical columns of the resource, in table order.
    ///
    /// Fails with `NotFound` when the resource is missing or not tabular.
    fn fetch_schema(&self, resource_id: &str) -> Result<Vec<SchemaField>>;

    /// Stored dictionary entries, in table order. Columns that were never
    /// described come back without `info`.
    fn fetch_dictionary(&self, resource_id: &str) -> Result<Vec<DictionaryField>>;

    /// Replaces the stored dictionary with `definitions`, translated with
    /// [`crate::lexicon::tools::model::to_catalog_fields`]. A read-only
    /// resource fails with `WriteRejected`; the write is never forced.
    fn write_dictionary(&self, resource_id: &str, definitions: &[FieldDefinition])
    -> Result<WriteAck>;
}
