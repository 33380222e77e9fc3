//! Similarity-based diversity discounting.
//!
//! Each (instrument, type) pair may be assigned a similarity function that
//! maps two ASDPs to a score in `[0, 1]` via a kernel over numeric
//! diversity-descriptor vectors. The engine discounts a candidate's science
//! utility by its maximum similarity to same-typed products already queued,
//! in the manner of maximal-marginal-relevance reranking.

pub mod config;
pub mod engine;
pub mod function;

pub use config::{load_similarity_config, parse_similarity_config};
pub use engine::{FunctionKey, FunctionMap, Similarity};
pub use function::SimilarityFunction;
