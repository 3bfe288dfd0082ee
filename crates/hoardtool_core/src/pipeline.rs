use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ImportError;
use crate::extract::{SourceFormat, resolve_extractor};
use crate::normalize::{SkippedRecord, normalize_with_report};
use crate::probe::{Clock, ReachabilityProbe};
use crate::record::NormalizedRecord;

/// Answers that confirm an export prompt, compared case-insensitively.
pub const AFFIRMATIVE_ANSWERS: [&str; 4] = ["yes", "y", "ja", "j"];

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub source: PathBuf,
    pub list_name: String,
    /// Overrides extension-based detection when set.
    pub format: Option<SourceFormat>,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub format: SourceFormat,
    pub extracted: usize,
    pub records: Vec<NormalizedRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Read a source file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String, ImportError> {
    let bytes = fs::read(path).map_err(|error| ImportError::io(path, error))?;
    String::from_utf8(bytes).map_err(|error| {
        ImportError::malformed(
            "text",
            format!(
                "{} is not valid UTF-8 (byte offset {})",
                path.display(),
                error.utf8_error().valid_up_to()
            ),
        )
    })
}

/// Dispatch, read, extract and normalize one file. Any error aborts before
/// records are produced.
pub fn run_import(
    request: &ImportRequest,
    probe: &dyn ReachabilityProbe,
    clock: &dyn Clock,
) -> Result<ImportOutcome, ImportError> {
    let extractor = resolve_extractor(&request.source, request.format)?;
    let content = read_source(&request.source)?;
    let raw = extractor.extract(&content)?;
    let extracted = raw.len();
    tracing::info!(
        source = %request.source.display(),
        format = extractor.format().as_str(),
        extracted,
        "extracted records"
    );

    let outcome = normalize_with_report(&raw, &request.list_name, probe, clock);
    Ok(ImportOutcome {
        format: extractor.format(),
        extracted,
        records: outcome.records,
        skipped: outcome.skipped,
    })
}

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    AFFIRMATIVE_ANSWERS
        .iter()
        .any(|candidate| answer.eq_ignore_ascii_case(candidate))
}
