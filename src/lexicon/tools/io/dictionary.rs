use std::fs;
use std::path::{Path, PathBuf};

use crate::lexicon::tools::error::{Result, ToolError};
use crate::lexicon::tools::model::DictionaryField;

/// Suffix appended to the resource identifier to name a downloaded dictionary.
pub const FILE_SUFFIX: &str = "-dd.json";

/// `<dir>/<resource_id>-dd.json`. The identifier must be a single path
/// component, so the file always lands directly inside `dir`.
pub fn path_for(dir: &Path, resource_id: &str) -> Result<PathBuf> {
    let unsafe_name = resource_id.is_empty()
        || resource_id == "."
        || resource_id == ".."
        || resource_id.contains(['/', '\\']);
    if unsafe_name {
        return Err(ToolError::InvalidResourceId(resource_id.to_string()));
    }
    Ok(dir.join(format!("{resource_id}{FILE_SUFFIX}")))
}

/// Writes the stored field list as pretty-printed JSON. `None` is written as
/// `null` so a resource without a datastore table still leaves a file behind.
pub fn write(path: &Path, fields: Option<&[DictionaryField]>) -> Result<()> {
    let mut json = serde_json::to_string_pretty(&fields)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// Reads a file produced by [`write`].
pub fn read(path: &Path) -> Result<Option<Vec<DictionaryField>>> {
    let source = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&source)?)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::lexicon::tools::model::FieldInfo;

    #[test]
    fn file_name_derives_from_resource() {
        assert_eq!(
            path_for(Path::new("out"), "9d1c01df").unwrap(),
            Path::new("out").join("9d1c01df-dd.json")
        );
    }

    #[test]
    fn identifiers_with_path_components_are_refused() {
        for resource_id in ["../escape", "a/b", "a\\b", "..", ""] {
            assert!(
                matches!(
                    path_for(Path::new("out"), resource_id),
                    Err(ToolError::InvalidResourceId(id)) if id == resource_id
                ),
                "{resource_id}"
            );
        }
    }

    #[test]
    fn fields_are_pretty_printed() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("r-dd.json");
        let fields = vec![
            DictionaryField::new("_id", "int"),
            DictionaryField::new("name", "text").with_info(FieldInfo {
                label: Some("Name".into()),
                ..FieldInfo::default()
            }),
        ];
        write(&path, Some(fields.as_slice())).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert_eq!(read(&path).unwrap(), Some(fields));
    }

    #[test]
    fn missing_dictionary_is_written_as_null() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("r-dd.json");
        write(&path, None).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "null\n");
        assert_eq!(read(&path).unwrap(), None);
    }
}
