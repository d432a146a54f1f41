use std::collections::{HashMap, HashSet};

use tracing::warn;

use lore_domain::{NormalizedPaper, embed_policy};
use lore_storage::{papers, qdrant};

use crate::{LoreService, ServiceError, ServiceResult, embedding_text};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IngestRequest {
	pub papers: Vec<NormalizedPaper>,
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct IngestionReport {
	pub written: usize,
	pub skipped_duplicate: usize,
	pub embedded: usize,
}

impl IngestionReport {
	pub(crate) fn absorb(&mut self, other: IngestionReport) {
		self.written += other.written;
		self.skipped_duplicate += other.skipped_duplicate;
		self.embedded += other.embedded;
	}
}

impl LoreService {
	/// Writes a batch into the corpus. Duplicate ids, whether against the
	/// index or earlier in the same batch, are skipped and counted. Eligible
	/// papers are embedded in one provider call; each write lands the keyword
	/// row before its vector, so a vector never exists without a row. An
	/// embedding failure degrades the batch to keyword-only writes.
	pub async fn ingest(&self, batch: Vec<NormalizedPaper>) -> ServiceResult<IngestionReport> {
		let mut report = IngestionReport::default();
		let mut seen = HashSet::new();
		let mut fresh = Vec::new();

		for mut paper in batch {
			if paper.id.trim().is_empty() || paper.title.trim().is_empty() {
				return Err(ServiceError::InvalidRequest {
					message: "Every paper needs a non-empty id and title.".to_string(),
				});
			}
			if !seen.insert(paper.id.clone()) {
				report.skipped_duplicate += 1;

				continue;
			}
			if papers::paper_exists(&self.db.pool, &paper.id).await? {
				report.skipped_duplicate += 1;

				continue;
			}

			// Decided exactly once; the stored flag never flips afterwards.
			paper.embedding_eligible =
				embed_policy::embedding_eligible(&self.cfg.ingestion, &paper.id, paper.year);
			fresh.push(paper);
		}

		let mut vectors = self.embed_eligible(&fresh).await;

		for paper in &fresh {
			if !papers::insert_paper(&self.db.pool, paper).await? {
				// Lost a concurrent race; the row belongs to the earlier writer.
				report.skipped_duplicate += 1;
				vectors.remove(&paper.id);

				continue;
			}

			report.written += 1;

			if let Some(vector) = vectors.remove(&paper.id) {
				self.qdrant
					.upsert_points(vec![qdrant::paper_point(&paper.id, paper.year, vector)])
					.await?;
				report.embedded += 1;
			}
		}

		Ok(report)
	}

	async fn embed_eligible(&self, fresh: &[NormalizedPaper]) -> HashMap<String, Vec<f32>> {
		let eligible: Vec<&NormalizedPaper> =
			fresh.iter().filter(|paper| paper.embedding_eligible).collect();

		if eligible.is_empty() {
			return HashMap::new();
		}

		let texts: Vec<String> = eligible
			.iter()
			.map(|paper| embedding_text(&paper.title, &paper.abstract_text))
			.collect();

		match self.embed_checked(&texts).await {
			Ok(vectors) => eligible
				.iter()
				.zip(vectors)
				.map(|(paper, vector)| (paper.id.clone(), vector))
				.collect(),
			Err(err) => {
				warn!("Embedding failed for an ingestion batch, writing keyword-only: {err}");

				HashMap::new()
			},
		}
	}
}
