//! # halluscope-core — LLM hallucination measurement pipeline
//!
//! Four independent file-to-file batch stages, composed only through shared
//! file-naming conventions on disk:
//!
//! 1. **Dataset loading** ([`dataset`]) — fetch or read a benchmark and
//!    normalize every record to `{dataset, question, reference_answer}`.
//! 2. **Response generation** ([`generate`]) — substitute each question into
//!    a prompt template and collect one model completion per sample.
//! 3. **Evaluation** ([`evaluate`]) — score responses against references
//!    with a string-similarity heuristic and bucket them into a three-level
//!    hallucination score.
//! 4. **Attribution analysis** ([`attribution`], [`plot`]) — aggregate
//!    hallucination rate, prompt sensitivity, and model variability, then
//!    write a metrics CSV and bar charts.
//!
//! No stage calls another in-process; data flows strictly left to right
//! through JSON array files.

pub mod attribution;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod generate;
pub mod inference;
pub mod plot;
pub mod prompt;
pub mod records;

pub use config::{HarnessConfig, load_config};
pub use error::HarnessError;
pub use records::{GenerationRecord, Sample};
