use agora_graph::EdgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
    #[error("invalid edge: {0}")]
    Edge(#[from] EdgeError),
}
