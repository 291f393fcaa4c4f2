// ============================================================
// PASS OUTCOMES
// ============================================================
// Results handed across the session boundary to the caller/UI

use serde::{Deserialize, Serialize};

use super::record::CanonicalRecord;

/// Where the session currently stands. Linear forward flow with two
/// backward edges: Configuring -> Upload (choose another file) and
/// Previewing -> Configuring (back to filter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStage {
    Upload,
    Discovering,
    Configuring,
    Previewing,
    Exporting,
}

/// Coarse-grained progress snapshot, emitted every
/// `EngineConfig::progress_interval` rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanProgress {
    pub rows_scanned: u64,
    pub distinct_values: usize,
}

/// Summary of a completed discovery pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySummary {
    pub rows_scanned: u64,
    pub rows_skipped: u64,
    pub header_detected: bool,
    /// Distinct dimension values, sorted lexicographically for presentation.
    pub values: Vec<String>,
}

/// Outcome of Pass 1. `Empty` is an informational condition, not an error:
/// the file parsed but yielded no usable dimension values, so the caller
/// should prompt the user to check the file's formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiscoveryOutcome {
    Values(DiscoverySummary),
    Empty { rows_scanned: u64 },
    Cancelled,
}

/// A capped view over the Pass 2 match set. `total` is the true match
/// count, which the UI surfaces when it exceeds the preview length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub records: Vec<CanonicalRecord>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PreviewOutcome {
    Preview(Preview),
    Empty,
    Cancelled,
}

/// A fully-formed downloadable artifact. Producing the actual download is
/// the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExportOutcome {
    Artifact(ExportArtifact),
    Empty,
    Cancelled,
}
