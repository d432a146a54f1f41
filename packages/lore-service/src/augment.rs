use tracing::warn;

use lore_domain::{QualityVerdict, RetrievalCandidate, quality};

use crate::{IngestionReport, LoreService, ServiceResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResearchRequest {
	pub topic: String,
	pub target_count: Option<u32>,
	pub use_two_stage: Option<bool>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AdapterPull {
	pub adapter: String,
	pub requested: usize,
	pub fetched: usize,
	pub failed: bool,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AugmentationSummary {
	pub attempted: bool,
	pub pulls: Vec<AdapterPull>,
	pub report: IngestionReport,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResearchResponse {
	pub topic: String,
	pub papers: Vec<RetrievalCandidate>,
	pub verdict: QualityVerdict,
	pub augmentation: AugmentationSummary,
	pub insufficient_corpus: bool,
	pub stale_corpus_warning: bool,
}

impl LoreService {
	/// One retrieval pass, at most one augmentation pass, one re-retrieval.
	/// Adapter failures are absorbed into the summary; a corpus that stays
	/// short is reported through `insufficient_corpus`, never thrown.
	pub async fn ensure_sufficient(&self, req: ResearchRequest) -> ServiceResult<ResearchResponse> {
		let topic = req.topic.trim().to_string();
		let target_count = req.target_count.unwrap_or(self.cfg.retrieval.stage2_width) as usize;
		let use_two_stage = req.use_two_stage.unwrap_or(self.cfg.retrieval.use_two_stage);

		let papers = self.retrieve(&topic, target_count, use_two_stage).await?;
		let verdict = quality::evaluate(&self.cfg.quality, &papers, target_count);

		if verdict.count_ok {
			return Ok(ResearchResponse {
				topic,
				papers,
				verdict,
				augmentation: AugmentationSummary::default(),
				insufficient_corpus: false,
				stale_corpus_warning: !verdict.recency_ok,
			});
		}

		let floor = quality::effective_floor(&self.cfg.quality, target_count);
		let needed = floor - verdict.total_found;
		let augmentation = self.augment_once(&topic, needed).await?;
		let papers = self.retrieve(&topic, target_count, use_two_stage).await?;
		let verdict = quality::evaluate(&self.cfg.quality, &papers, target_count);

		Ok(ResearchResponse {
			topic,
			papers,
			verdict,
			augmentation,
			insufficient_corpus: !verdict.count_ok,
			stale_corpus_warning: !verdict.recency_ok,
		})
	}

	async fn augment_once(&self, topic: &str, needed: usize) -> ServiceResult<AugmentationSummary> {
		let quotas = split_quota(needed, self.cfg.sources.len());
		let mut summary = AugmentationSummary { attempted: true, ..Default::default() };
		let mut remaining = needed;

		for (source, quota) in self.cfg.sources.iter().zip(quotas) {
			if remaining == 0 {
				break;
			}

			let requested = quota.min(remaining).min(source.request_cap as usize);

			if requested == 0 {
				continue;
			}

			let mut pull =
				AdapterPull { adapter: source.id.clone(), requested, fetched: 0, failed: false };

			match self
				.providers
				.sources
				.search(source, topic, requested as u32, self.cfg.augmentation.min_year)
				.await
			{
				Ok(fetched) => {
					pull.fetched = fetched.len();
					remaining = remaining.saturating_sub(fetched.len());

					// Ingest per adapter so later adapters' duplicates die
					// against the index instead of inflating the batch.
					match self.ingest(fetched).await {
						Ok(report) => summary.report.absorb(report),
						Err(err) => {
							warn!(adapter = %source.id, "Ingestion failed during augmentation: {err}");
							pull.failed = true;
						},
					}
				},
				Err(err) => {
					warn!(adapter = %source.id, "Source adapter failed during augmentation: {err}");
					pull.failed = true;
				},
			}

			summary.pulls.push(pull);
		}

		Ok(summary)
	}
}

/// Quota split for one augmentation pass: the primary adapter takes half the
/// need rounded up, the rest is divided evenly with the LAST adapter
/// absorbing the rounding remainder.
pub(crate) fn split_quota(needed: usize, adapter_count: usize) -> Vec<usize> {
	if adapter_count == 0 || needed == 0 {
		return vec![0; adapter_count];
	}
	if adapter_count == 1 {
		return vec![needed];
	}

	let primary = needed.div_ceil(2);
	let rest = needed - primary;
	let others = adapter_count - 1;
	let base = rest / others;
	let mut quotas = Vec::with_capacity(adapter_count);

	quotas.push(primary);

	for _ in 0..others - 1 {
		quotas.push(base);
	}

	quotas.push(rest - base * (others - 1));

	quotas
}
