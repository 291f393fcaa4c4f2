pub mod contact_extractor;
pub mod filter_pipeline;
pub mod header_resolver;
pub mod normalizer;
