use std::collections::{HashMap, HashSet};

use lore_domain::{NormalizedPaper, RetrievalCandidate, StageOrigin};
use lore_storage::papers;

use crate::{LoreService, ServiceError, ServiceResult};

impl LoreService {
	/// Read-only retrieval pass. Staged mode runs a wide keyword pass and
	/// re-scores the survivors semantically; traditional mode unions the two
	/// arms. Zero results is a valid outcome, an unreachable index is not.
	pub async fn retrieve(
		&self,
		topic: &str,
		target_count: usize,
		use_two_stage: bool,
	) -> ServiceResult<Vec<RetrievalCandidate>> {
		let topic = topic.trim();

		if topic.is_empty() {
			return Err(ServiceError::InvalidRequest { message: "topic is required.".to_string() });
		}
		if target_count == 0 {
			return Err(ServiceError::InvalidRequest {
				message: "target_count must be greater than zero.".to_string(),
			});
		}

		if use_two_stage {
			self.retrieve_staged(topic, target_count).await
		} else {
			self.retrieve_traditional(topic, target_count).await
		}
	}

	async fn retrieve_staged(
		&self,
		topic: &str,
		target_count: usize,
	) -> ServiceResult<Vec<RetrievalCandidate>> {
		let stage1 = papers::search_papers(
			&self.db.pool,
			topic,
			i64::from(self.cfg.retrieval.stage1_width),
		)
		.await?;

		if stage1.is_empty() {
			return Ok(Vec::new());
		}

		let vector = self.embed_topic(topic).await?;
		let candidate_ids: Vec<String> =
			stage1.iter().map(|(paper, _)| paper.id.clone()).collect();
		let scored = self
			.qdrant
			.query_similar(vector, Some(&candidate_ids), candidate_ids.len() as u64)
			.await?;
		let similarity: HashMap<String, f32> = scored.into_iter().collect();

		// Joining in stage-1 order means equal similarities keep keyword rank
		// order through the stable sort below. Papers without a stored vector
		// never appear in `similarity` and drop out here.
		let mut candidates: Vec<RetrievalCandidate> = stage1
			.into_iter()
			.filter_map(|(paper, _)| {
				let score = *similarity.get(&paper.id)?;

				if score < self.cfg.retrieval.relevance_floor {
					return None;
				}

				Some(RetrievalCandidate { paper, score, stage_origin: StageOrigin::Semantic })
			})
			.collect();

		sort_candidates(&mut candidates);
		candidates.truncate(target_count);

		Ok(candidates)
	}

	async fn retrieve_traditional(
		&self,
		topic: &str,
		target_count: usize,
	) -> ServiceResult<Vec<RetrievalCandidate>> {
		let keyword = papers::search_papers(&self.db.pool, topic, target_count as i64).await?;
		let vector = self.embed_topic(topic).await?;
		let scored = self.qdrant.query_similar(vector, None, target_count as u64).await?;
		let semantic_ids: Vec<String> =
			scored.iter().map(|(paper_id, _)| paper_id.clone()).collect();
		let mut by_id: HashMap<String, NormalizedPaper> =
			papers::fetch_papers_by_ids(&self.db.pool, &semantic_ids)
				.await?
				.into_iter()
				.map(|paper| (paper.id.clone(), paper))
				.collect();

		let mut results: Vec<RetrievalCandidate> = keyword
			.into_iter()
			.map(|(paper, score)| RetrievalCandidate {
				paper,
				score,
				stage_origin: StageOrigin::Keyword,
			})
			.collect();
		let mut seen: HashSet<String> =
			results.iter().map(|candidate| candidate.paper.id.clone()).collect();

		// Keyword results first; the semantic arm only fills ids not already
		// present. Scores keep their arm's scale and are never compared.
		for (paper_id, score) in scored {
			if !seen.insert(paper_id.clone()) {
				continue;
			}

			let Some(paper) = by_id.remove(&paper_id) else {
				continue;
			};

			results.push(RetrievalCandidate { paper, score, stage_origin: StageOrigin::Semantic });
		}

		results.truncate(target_count);

		Ok(results)
	}
}

/// Score descending, then more-recent year first with unknown years last; the
/// sort is stable, so remaining ties keep their prior order.
fn sort_candidates(candidates: &mut [RetrievalCandidate]) {
	candidates.sort_by(|a, b| {
		b.score
			.total_cmp(&a.score)
			.then_with(|| year_rank(b.paper.year).cmp(&year_rank(a.paper.year)))
	});
}

fn year_rank(year: Option<i32>) -> i32 {
	year.unwrap_or(i32::MIN)
}
