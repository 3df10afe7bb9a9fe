pub mod document_fetcher;
pub mod error;
pub mod models;
pub mod perplexity_service;
pub mod query_service;

pub use document_fetcher::{DocumentFetcher, DocumentSource};
pub use error::QueryError;
pub use models::*;
pub use perplexity_service::{AnswerSynthesizer, PerplexityConfig, PerplexityService};
pub use query_service::QueryService;
