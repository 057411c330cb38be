//! Agora Ingest - interaction log loading
//!
//! Turns a question/answer log into an [`agora_graph::MultiDiGraph`]:
//! each row adds one edge from the participant who asked to the one who
//! answered.
//!
//! # Example
//!
//! ```
//! use agora_ingest::{read_csv, LoadOptions};
//!
//! let log = "question_id,question_user_id,response_user_id\nq1,alice,bob\n";
//! let result = read_csv(log.as_bytes(), &LoadOptions::default()).unwrap();
//!
//! assert_eq!(result.graph.out_degree("alice"), 1);
//! ```

mod builder;
mod error;
mod loader;
mod record;

pub use builder::{GraphBuilder, IngestResult};
pub use error::IngestError;
pub use loader::{load_csv, read_csv, LoadOptions};
pub use record::InteractionRecord;
