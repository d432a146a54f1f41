use serde::{Deserialize, Serialize};

use crate::paper::RetrievalCandidate;
use lore_config::Quality;

/// Snapshot of how a result list measures against the corpus policy.
/// Computed fresh on every evaluation; never cached.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct QualityVerdict {
	pub count_ok: bool,
	pub recency_ok: bool,
	pub total_found: usize,
	pub recent_count: usize,
}

/// The floor a result list must reach: the caller's ask, but never below the
/// corpus-wide minimum.
pub fn effective_floor(cfg: &Quality, target_count: usize) -> usize {
	(cfg.min_results as usize).max(target_count)
}

pub fn evaluate(
	cfg: &Quality,
	candidates: &[RetrievalCandidate],
	target_count: usize,
) -> QualityVerdict {
	let recent_count = candidates
		.iter()
		.filter(|candidate| {
			candidate.paper.year.map(|year| year >= cfg.recency_floor_year).unwrap_or(false)
		})
		.count();

	QualityVerdict {
		count_ok: candidates.len() >= effective_floor(cfg, target_count),
		recency_ok: recent_count >= cfg.min_recent_results as usize,
		total_found: candidates.len(),
		recent_count,
	}
}
