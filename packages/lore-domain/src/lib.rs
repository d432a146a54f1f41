pub mod embed_policy;
pub mod paper;
pub mod quality;
pub mod taxonomy;

pub use paper::{NormalizedPaper, PaperSource, RetrievalCandidate, StageOrigin, provenance_id};
pub use quality::QualityVerdict;
