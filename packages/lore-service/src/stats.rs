use std::collections::BTreeMap;

use lore_storage::papers;

use crate::{LoreService, ServiceResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CorpusStats {
	pub total_papers: i64,
	pub embedded_papers: u64,
	pub recent_papers: i64,
	pub by_source: BTreeMap<String, i64>,
}

impl LoreService {
	/// Live counters straight from both indexes. `embedded_papers` is the
	/// exact point count, so it reflects vectors that actually exist rather
	/// than rows that were merely eligible.
	pub async fn corpus_stats(&self) -> ServiceResult<CorpusStats> {
		let total_papers = papers::count_papers(&self.db.pool).await?;
		let recent_papers =
			papers::count_recent_papers(&self.db.pool, self.cfg.quality.recency_floor_year).await?;
		let by_source = papers::count_papers_by_source(&self.db.pool).await?.into_iter().collect();
		let embedded_papers = self.qdrant.count_points().await?;

		Ok(CorpusStats { total_papers, embedded_papers, recent_papers, by_source })
	}
}
