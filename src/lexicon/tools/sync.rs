use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::lexicon::tools::confirm::{self, ConfirmationPolicy, Decision};
use crate::lexicon::tools::error::{Result, ToolError};
use crate::lexicon::tools::gateway::{MetadataGateway, WriteAck};
use crate::lexicon::tools::io::{definitions, dictionary};
use crate::lexicon::tools::model::{
    CatalogField, DictionaryField, FieldDefinition, TypeChange, to_catalog_fields,
};
use crate::lexicon::tools::validate::{self, Accepted, stored_types};

/// Where a downloaded dictionary was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub path: PathBuf,
    /// `None` when the resource has no datastore table.
    pub field_count: Option<usize>,
}

/// Outcome of an upload that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    /// Fields sent (or, for a dry run, that would be sent) to the catalog.
    pub fields: Vec<CatalogField>,
    pub approved_changes: Vec<TypeChange>,
    /// `None` for a dry run.
    pub ack: Option<WriteAck>,
}

/// Saves the stored dictionary of `resource_id` as `<resource_id>-dd.json`
/// inside `output_dir`.
///
/// A resource without a datastore table is written as `null`; transport
/// failures propagate without touching the file system.
#[instrument(
    level = "info",
    skip_all,
    fields(resource_id = %resource_id, output_dir = %output_dir.display())
)]
pub fn download(
    gateway: &dyn MetadataGateway,
    resource_id: &str,
    output_dir: &Path,
) -> Result<DownloadReport> {
    let path = dictionary::path_for(output_dir, resource_id)?;
    let fields = match gateway.fetch_dictionary(resource_id) {
        Ok(fields) => Some(fields),
        Err(ToolError::NotFound { .. }) => {
            warn!("resource has no datastore table; writing an empty dictionary");
            None
        }
        Err(error) => return Err(error),
    };

    dictionary::write(&path, fields.as_deref())?;
    let field_count = fields.as_ref().map(Vec::len);
    info!(path = %path.display(), ?field_count, "data dictionary saved");
    Ok(DownloadReport { path, field_count })
}

/// Loads and validates `path` against the resource without prompting or
/// writing. Returns the accepted definitions and the type changes an upload
/// would ask about.
#[instrument(
    level = "info",
    skip_all,
    fields(resource_id = %resource_id, path = %path.display())
)]
pub fn check(gateway: &dyn MetadataGateway, resource_id: &str, path: &Path) -> Result<Accepted> {
    prepare(gateway, resource_id, path).map(|(accepted, _)| accepted)
}

/// Replaces the stored dictionary of `resource_id` with the definitions in
/// `path`.
///
/// The file is loaded, the schema and stored dictionary fetched, the
/// definitions validated, and every pending type change put to `policy`.
/// Nothing is written unless all of that succeeds. With `dry_run` the write
/// itself is skipped.
#[instrument(
    level = "info",
    skip_all,
    fields(resource_id = %resource_id, path = %path.display(), dry_run = dry_run)
)]
pub fn upload(
    gateway: &dyn MetadataGateway,
    resource_id: &str,
    path: &Path,
    policy: &mut dyn ConfirmationPolicy,
    dry_run: bool,
) -> Result<UploadReport> {
    let (accepted, stored) = prepare(gateway, resource_id, path)?;

    if let Decision::Declined(change) = confirm::confirm(&accepted.pending_changes, policy)? {
        return Err(ToolError::ConfirmationDeclined {
            column: change.column,
            old_type: change.old_type,
            new_type: change.new_type,
        });
    }

    let definitions = drop_redundant_types(accepted.definitions, &stored);
    let fields = to_catalog_fields(&definitions);
    let ack = if dry_run {
        info!(field_count = fields.len(), "dry run; dictionary not written");
        None
    } else {
        let ack = gateway.write_dictionary(resource_id, &definitions)?;
        info!(field_count = ack.field_count, "data dictionary updated");
        Some(ack)
    };

    Ok(UploadReport {
        fields,
        approved_changes: accepted.pending_changes,
        ack,
    })
}

/// Reserved for converting foreign dictionary layouts. Only checks that the
/// input exists.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn convert(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    warn!("conversion is not supported yet; nothing was written");
    Ok(())
}

fn prepare(
    gateway: &dyn MetadataGateway,
    resource_id: &str,
    path: &Path,
) -> Result<(Accepted, Vec<DictionaryField>)> {
    let loaded = definitions::load(path)?;
    let schema = gateway.fetch_schema(resource_id)?;
    let stored = gateway.fetch_dictionary(resource_id)?;
    debug!(
        schema_fields = schema.len(),
        stored_fields = stored.len(),
        "fetched remote metadata"
    );

    let accepted =
        validate::validate(loaded.definitions, &loaded.header, &schema, &stored).into_result()?;
    for change in &accepted.pending_changes {
        info!(%change, "pending type change");
    }
    Ok((accepted, stored))
}

/// A declared type equal to the stored type is not an override; it is
/// dropped so unchanged columns are written without `type_override`. A type
/// equal to the stored override is kept so the override is written back.
fn drop_redundant_types(
    definitions: Vec<FieldDefinition>,
    stored: &[DictionaryField],
) -> Vec<FieldDefinition> {
    let stored = stored_types(stored);
    definitions
        .into_iter()
        .map(|mut definition| {
            if definition.field_type.as_deref() == stored.get(definition.column.as_str()).copied() {
                definition.field_type = None;
            }
            definition
        })
        .collect()
}
