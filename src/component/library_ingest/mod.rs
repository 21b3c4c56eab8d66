mod main;

pub use main::{IngestSummary, ingest_library};
