//! AI advisory functions: triage, vitals recommendation, timeline summary.
//!
//! Each call renders a fixed prompt, sends it to a language model through
//! `LlmClient`, and parses a JSON object out of the reply. Failures are
//! values; nothing here panics on a bad or missing model.

pub mod ollama;
pub mod parser;
pub mod prompt;
pub mod service;
pub mod types;

pub use ollama::*;
pub use parser::*;
pub use service::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("Language model unavailable at {0}")]
    Unavailable(String),

    #[error("Language model returned error (status {status}): {body}")]
    ModelError { status: u16, body: String },

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model response: {0}")]
    Malformed(String),

    #[error("Invalid advisory input: {0}")]
    InvalidInput(String),
}
