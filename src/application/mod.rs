pub mod use_cases;

pub use use_cases::contact_extractor::ContactExtractor;
pub use use_cases::filter_pipeline::SearchSession;
pub use use_cases::header_resolver::{HeaderResolution, HeaderResolver};
