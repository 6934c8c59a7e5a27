//! Structural parsing of local definitions files.
//!
//! Three layouts are understood, chosen by extension:
//!
//! - `.xlsx` / `.xlsm`: the first worksheet, header in the first row;
//! - `.json`: a field list as written by `download`;
//! - anything else: delimited text with a header row.
//!
//! Only structure is checked here. Attribute names outside the recognized set
//! are carried in the header untouched so validation can name them.

use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, XlsxError, open_workbook};
use tracing::{debug, instrument};

use crate::lexicon::tools::error::{Result, ToolError};
use crate::lexicon::tools::io::dictionary;
use crate::lexicon::tools::model::{FieldDefinition, IDENTIFIER_ATTRIBUTE, RECOGNIZED_ATTRIBUTES};

/// Header and rows read from a definitions file, both in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDefinitions {
    pub header: Vec<String>,
    pub definitions: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Workbook,
    Dictionary,
    Delimited,
}

fn layout_for(path: &Path) -> Layout {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Layout::Workbook,
        Some("json") => Layout::Dictionary,
        _ => Layout::Delimited,
    }
}

/// Reads the definitions stored at `path`.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<LoadedDefinitions> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let loaded = match layout_for(path) {
        Layout::Workbook => load_workbook(path)?,
        Layout::Dictionary => load_dictionary(path)?,
        Layout::Delimited => load_delimited(path)?,
    };
    if loaded.definitions.is_empty() && loaded.header.iter().any(|name| name == IDENTIFIER_ATTRIBUTE)
    {
        return Err(ToolError::malformed(path, "no field definitions below the header"));
    }
    debug!(
        header = ?loaded.header,
        definition_count = loaded.definitions.len(),
        "definitions loaded"
    );
    Ok(loaded)
}

fn load_delimited(path: &Path) -> Result<LoadedDefinitions> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|error| ToolError::malformed(path, error.to_string()))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|error| ToolError::malformed(path, error.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| ToolError::malformed(path, error.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    build(path, header, rows)
}

fn load_workbook(path: &Path) -> Result<LoadedDefinitions> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|error: XlsxError| ToolError::malformed(path, error.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ToolError::malformed(path, "workbook has no worksheets"))?
        .map_err(|error| ToolError::malformed(path, error.to_string()))?;

    let (header, rows) = range_rows(&range);
    build(path, header, rows)
}

fn range_rows(range: &Range<DataType>) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect::<Vec<_>>());
    let mut header: Vec<String> = rows.next().unwrap_or_default();
    while header.last().is_some_and(|name| name.trim().is_empty()) {
        header.pop();
    }
    let header = header.into_iter().map(|name| name.trim().to_string()).collect();
    (header, rows.collect())
}

fn load_dictionary(path: &Path) -> Result<LoadedDefinitions> {
    let fields = dictionary::read(path)
        .map_err(|error| match error {
            ToolError::Json(error) => ToolError::malformed(path, error.to_string()),
            other => other,
        })?
        .ok_or_else(|| {
            ToolError::malformed(path, "file holds no data dictionary (null field list)")
        })?;
    Ok(LoadedDefinitions {
        header: RECOGNIZED_ATTRIBUTES.iter().map(|name| name.to_string()).collect(),
        definitions: fields.iter().map(|field| field.to_definition()).collect(),
    })
}

fn build(path: &Path, header: Vec<String>, rows: Vec<Vec<String>>) -> Result<LoadedDefinitions> {
    if header.iter().all(|name| name.is_empty()) {
        return Err(ToolError::malformed(path, "missing header row"));
    }

    let position = |attribute: &str| header.iter().position(|name| name == attribute);
    // Without an identifier attribute no row can be mapped; validation
    // rejects such a header on its own.
    let Some(column_at) = position(IDENTIFIER_ATTRIBUTE) else {
        return Ok(LoadedDefinitions {
            header,
            definitions: Vec::new(),
        });
    };
    let type_at = position("type");
    let label_at = position("label");
    let description_at = position("description");

    let mut definitions = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |at: Option<usize>| {
            at.and_then(|at| row.get(at))
                .and_then(|value| normalize_optional(value))
        };
        let column = cell(Some(column_at)).ok_or_else(|| {
            ToolError::malformed(
                path,
                format!("row {} has no value for '{IDENTIFIER_ATTRIBUTE}'", index + 1),
            )
        })?;
        definitions.push(FieldDefinition {
            column,
            field_type: cell(type_at),
            label: cell(label_at),
            description: cell(description_at),
        });
    }

    Ok(LoadedDefinitions {
        header,
        definitions,
    })
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("fixture written");
        path
    }

    #[test]
    fn reads_header_and_rows_in_order() {
        let dir = tempdir().expect("temporary directory");
        let path = write(
            dir.path(),
            "dd.csv",
            "column,type,label,description\n\
             a,int,Alpha,\n\
             b, text ,,Second column\n",
        );
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.header, vec!["column", "type", "label", "description"]);
        assert_eq!(
            loaded.definitions,
            vec![
                FieldDefinition::new("a").with_type("int").with_label("Alpha"),
                FieldDefinition::new("b")
                    .with_type("text")
                    .with_description("Second column"),
            ]
        );
    }

    #[test]
    fn unknown_attributes_stay_in_header() {
        let dir = tempdir().expect("temporary directory");
        let path = write(dir.path(), "dd.csv", "column,units\na,m\n");
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.header, vec!["column", "units"]);
        assert_eq!(loaded.definitions, vec![FieldDefinition::new("a")]);
    }

    #[test]
    fn header_without_identifier_maps_no_rows() {
        let dir = tempdir().expect("temporary directory");
        let path = write(dir.path(), "dd.csv", "type,label\nint,A\n");
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.header, vec!["type", "label"]);
        assert!(loaded.definitions.is_empty());
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let dir = tempdir().expect("temporary directory");
        let path = write(dir.path(), "dd.csv", "column,type\na,int,extra\n");
        assert!(matches!(load(&path), Err(ToolError::MalformedFile { .. })));
    }

    #[test]
    fn empty_file_is_malformed() {
        let dir = tempdir().expect("temporary directory");
        let path = write(dir.path(), "dd.csv", "");
        assert!(matches!(load(&path), Err(ToolError::MalformedFile { .. })));
    }

    #[test]
    fn header_without_rows_is_malformed() {
        let dir = tempdir().expect("temporary directory");
        let csv = write(dir.path(), "dd.csv", "column,type\n\n");
        let error = load(&csv).unwrap_err();
        assert!(error.to_string().contains("no field definitions"), "{error}");

        let json = write(dir.path(), "res-dd.json", "[]");
        assert!(matches!(load(&json), Err(ToolError::MalformedFile { .. })));
    }

    #[test]
    fn blank_identifier_names_the_row() {
        let dir = tempdir().expect("temporary directory");
        let path = write(dir.path(), "dd.csv", "column,type\na,int\n,text\n");
        let error = load(&path).unwrap_err();
        assert!(error.to_string().contains("row 2 has no value for 'column'"), "{error}");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("absent.csv");
        assert!(matches!(load(&path), Err(ToolError::MissingInput(p)) if p == path));
    }

    #[test]
    fn downloaded_dictionary_loads_with_canonical_header() {
        let dir = tempdir().expect("temporary directory");
        let path = write(
            dir.path(),
            "res-dd.json",
            r#"[{"id": "_id", "type": "int"},
                {"id": "name", "type": "text", "info": {"label": "Name", "notes": "", "type_override": ""}}]"#,
        );
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.header, RECOGNIZED_ATTRIBUTES.to_vec());
        assert_eq!(
            loaded.definitions,
            vec![
                FieldDefinition::new("_id").with_type("int"),
                FieldDefinition::new("name").with_type("text").with_label("Name"),
            ]
        );
    }

    #[test]
    fn null_dictionary_is_malformed() {
        let dir = tempdir().expect("temporary directory");
        let path = write(dir.path(), "res-dd.json", "null");
        assert!(matches!(load(&path), Err(ToolError::MalformedFile { .. })));
    }

    #[test]
    fn workbook_first_sheet_is_read() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("dd.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let worksheet = workbook.add_worksheet();
        let cells = [
            ["column", "type", "label"],
            ["a", "int", ""],
            ["", "", ""],
            ["b", "varchar", "Borough"],
        ];
        for (row, values) in cells.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if !value.is_empty() {
                    worksheet
                        .write_string(row as u32, col as u16, *value)
                        .expect("cell written");
                }
            }
        }
        workbook.save(&path).expect("workbook saved");

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.header, vec!["column", "type", "label"]);
        assert_eq!(
            loaded.definitions,
            vec![
                FieldDefinition::new("a").with_type("int"),
                FieldDefinition::new("b").with_type("varchar").with_label("Borough"),
            ]
        );
    }
}
