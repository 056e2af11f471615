//! Benchmark and custom dataset loading.
//!
//! Every loader normalizes its source into `Sample` records; the rest of the
//! pipeline never sees a dataset-specific shape.

pub mod catalog;
pub mod custom;

use crate::error::HarnessError;
use crate::records::Sample;

pub use catalog::CatalogAdapter;
pub use custom::CustomFormat;

/// The fixed set of supported benchmark datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    TruthfulQa,
    QaFactEval,
    HallucinationEval,
    CohS,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::TruthfulQa,
        DatasetKind::QaFactEval,
        DatasetKind::HallucinationEval,
        DatasetKind::CohS,
    ];

    /// Short name used in CLI flags and output file names.
    pub fn slug(self) -> &'static str {
        match self {
            DatasetKind::TruthfulQa => "truthfulqa",
            DatasetKind::QaFactEval => "qafacteval",
            DatasetKind::HallucinationEval => "hallucinationeval",
            DatasetKind::CohS => "cohs",
        }
    }

    pub fn adapter(self) -> &'static CatalogAdapter {
        match self {
            DatasetKind::TruthfulQa => &catalog::TRUTHFULQA,
            DatasetKind::QaFactEval => &catalog::QAFACTEVAL,
            DatasetKind::HallucinationEval => &catalog::HALLUCINATION_EVAL,
            DatasetKind::CohS => &catalog::COHS,
        }
    }
}

/// Loader output file name convention: `<dataset>_<split>_<n>.json`.
///
/// Uses the requested sample count, not the possibly clamped actual count.
pub fn output_file_name(slug: &str, split: &str, n_samples: usize) -> String {
    format!("{slug}_{split}_{n_samples}.json")
}

/// Fetch and normalize a catalog dataset.
pub async fn load_catalog(
    kind: DatasetKind,
    split: &str,
    n_samples: usize,
) -> Result<Vec<Sample>, HarnessError> {
    kind.adapter().load(split, n_samples).await
}
