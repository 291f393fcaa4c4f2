// ============================================================
// TABLE DOMAIN LAYER
// ============================================================
// Core types and value objects for tabular ingestion and filtering
// No I/O, no async

mod config;
mod outcome;
mod record;
mod role;
mod row;

pub use config::EngineConfig;
pub use outcome::{
    DiscoveryOutcome, DiscoverySummary, ExportArtifact, ExportOutcome, Preview, PreviewOutcome,
    ScanProgress, SessionStage,
};
pub use record::{CanonicalRecord, Contact};
pub use role::{ColumnRole, ColumnRoleMap, RoleSpec, RoleTable};
pub use row::{cell_at, is_blank_row, RawRow};
