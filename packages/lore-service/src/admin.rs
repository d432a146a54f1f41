use tracing::warn;

use lore_storage::{papers, qdrant};

use crate::{LoreService, ServiceResult, embedding_text};

const REBUILD_BATCH_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct RebuildReport {
	pub rebuilt_count: usize,
	pub skipped_count: usize,
	pub error_count: usize,
}

impl LoreService {
	/// Drops and recreates the semantic collection, then re-embeds every
	/// eligible row in batches. A provider or upsert failure costs only its
	/// batch; ineligible rows are counted as skipped.
	pub async fn rebuild_semantic(&self) -> ServiceResult<RebuildReport> {
		self.qdrant.delete_collection().await?;
		self.qdrant.ensure_collection().await?;

		let total = papers::count_papers(&self.db.pool).await?;
		let eligible = papers::eligible_papers(&self.db.pool).await?;
		let mut report = RebuildReport {
			skipped_count: (total as usize).saturating_sub(eligible.len()),
			..Default::default()
		};

		for batch in eligible.chunks(REBUILD_BATCH_SIZE) {
			let texts: Vec<String> = batch
				.iter()
				.map(|paper| embedding_text(&paper.title, &paper.abstract_text))
				.collect();
			let vectors = match self.embed_checked(&texts).await {
				Ok(vectors) => vectors,
				Err(err) => {
					warn!("Embedding failed for a rebuild batch: {err}");
					report.error_count += batch.len();

					continue;
				},
			};
			let points: Vec<_> = batch
				.iter()
				.zip(vectors)
				.map(|(paper, vector)| qdrant::paper_point(&paper.id, paper.year, vector))
				.collect();

			if let Err(err) = self.qdrant.upsert_points(points).await {
				warn!("Point upsert failed for a rebuild batch: {err}");
				report.error_count += batch.len();

				continue;
			}

			report.rebuilt_count += batch.len();
		}

		Ok(report)
	}
}
