use serde::Serialize;

use crate::probe::{Clock, ReachabilityProbe, is_well_formed};
use crate::record::{NormalizedRecord, RawRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingUrl,
    MalformedUrl,
    Unreachable,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingUrl => "missing url",
            Self::MalformedUrl => "malformed url",
            Self::Unreachable => "unreachable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// 1-based position in the extracted sequence.
    pub index: usize,
    pub url: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    pub skipped: Vec<SkippedRecord>,
}

pub fn normalize(
    records: &[RawRecord],
    list_name: &str,
    probe: &dyn ReachabilityProbe,
    clock: &dyn Clock,
) -> Vec<NormalizedRecord> {
    normalize_with_report(records, list_name, probe, clock).records
}

/// Coerce raw records into the canonical shape. Records are checked one at a
/// time in input order; every survivor shares one `createdAt`.
pub fn normalize_with_report(
    records: &[RawRecord],
    list_name: &str,
    probe: &dyn ReachabilityProbe,
    clock: &dyn Clock,
) -> NormalizeOutcome {
    let created_at = clock.now_unix();
    let mut outcome = NormalizeOutcome::default();

    for (index, record) in records.iter().enumerate() {
        let url = record.url_text().trim();
        let rejection = if url.is_empty() {
            Some(SkipReason::MissingUrl)
        } else if !is_well_formed(url) {
            Some(SkipReason::MalformedUrl)
        } else if !probe.is_reachable(url) {
            Some(SkipReason::Unreachable)
        } else {
            None
        };

        if let Some(reason) = rejection {
            tracing::debug!(row = index + 1, url, reason = reason.as_str(), "skipping record");
            outcome.skipped.push(SkippedRecord {
                index: index + 1,
                url: url.to_string(),
                reason,
            });
            continue;
        }

        outcome.records.push(NormalizedRecord {
            url: url.to_string(),
            title: record.title_text().to_string(),
            description: record.description_text().to_string(),
            tags: record.tag_list(),
            list: list_name.to_string(),
            created_at,
        });
    }

    tracing::info!(
        kept = outcome.records.len(),
        skipped = outcome.skipped.len(),
        list = list_name,
        "normalized records"
    );
    outcome
}
