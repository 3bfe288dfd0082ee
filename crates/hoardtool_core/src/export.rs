use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::ImportError;
use crate::record::{ExportDocument, NormalizedRecord};

#[derive(Serialize)]
struct ExportView<'a> {
    bookmarks: &'a [NormalizedRecord],
}

/// Serialize records as `{"bookmarks": [...]}` with four-space indentation.
/// Non-ASCII text is written as-is.
pub fn export_json(records: &[NormalizedRecord]) -> Result<Vec<u8>, ImportError> {
    let mut output = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut output, PrettyFormatter::with_indent(b"    "));
    ExportView { bookmarks: records }
        .serialize(&mut serializer)
        .map_err(ImportError::ExportFailure)?;
    output.push(b'\n');
    Ok(output)
}

/// Read back an export document. A bare array is not an export.
pub fn parse_export(bytes: &[u8]) -> Result<ExportDocument, ImportError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|error| ImportError::malformed("json", error.to_string()))?;
    if !value.is_object() {
        return Err(ImportError::SchemaMismatch(
            "export must be an object with a `bookmarks` field".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|error| ImportError::SchemaMismatch(error.to_string()))
}

pub fn write_export(path: &Path, records: &[NormalizedRecord]) -> Result<(), ImportError> {
    let bytes = export_json(records)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|error| ImportError::io(parent, error))?;
    }
    fs::write(path, bytes).map_err(|error| ImportError::io(path, error))?;
    tracing::info!(path = %path.display(), count = records.len(), "wrote export");
    Ok(())
}
