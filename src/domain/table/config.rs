// ============================================================
// ENGINE CONFIGURATION
// ============================================================
// Tunables for the ingestion and filtering passes

use serde::{Deserialize, Serialize};

/// Configuration for the two-pass engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Read buffer size for the delimited tokenizer, in bytes (default: 4MB)
    pub chunk_size: usize,

    /// Report progress and yield control every N data rows (default: 10_000)
    pub progress_interval: u64,

    /// Distinct dimension values longer than this are implausible and
    /// excluded from the discovery set (default: 60)
    pub max_value_length: usize,

    /// Rows with fewer cells than this are skipped as malformed during
    /// discovery (default: 5)
    pub min_plausible_columns: usize,

    /// Number of records shown in a preview; the true total is reported
    /// alongside (default: 50)
    pub preview_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4 * 1024 * 1024,
            progress_interval: 10_000,
            max_value_length: 60,
            min_plausible_columns: 5,
            preview_limit: 50,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }
        if self.progress_interval == 0 {
            return Err("progress_interval must be > 0".to_string());
        }
        if self.max_value_length == 0 {
            return Err("max_value_length must be > 0".to_string());
        }
        if self.preview_limit == 0 {
            return Err("preview_limit must be > 0".to_string());
        }
        Ok(())
    }
}
