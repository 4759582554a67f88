//! Backend services: LLM scoring, PDF extraction, and the ingest queue.

pub mod extract;
pub mod ingest;
pub mod llm;

pub use extract::{ExtractClient, ExtractedText};
pub use ingest::{IngestContext, IngestJob, IngestQueue, IngestStatus};
pub use llm::ScriptScorer;
