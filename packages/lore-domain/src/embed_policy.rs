use lore_config::Ingestion;

const SAMPLE_BUCKETS: u64 = 10_000;

/// Decides once, at ingestion, whether a paper's abstract gets an embedding.
/// The decision is a pure function of the id, the year, and the config; it
/// does not depend on ingestion order or batch composition.
pub fn embedding_eligible(cfg: &Ingestion, id: &str, year: Option<i32>) -> bool {
	let Some(year) = year else {
		return false;
	};

	if year < cfg.embed_min_year {
		return false;
	}

	in_sample(id, cfg.embed_sample_rate)
}

/// Deterministic hash sampling keyed by the id alone. The first eight bytes
/// of the blake3 digest pick one of 10,000 buckets.
pub fn in_sample(id: &str, sample_rate: f32) -> bool {
	if sample_rate >= 1.0 {
		return true;
	}
	if sample_rate <= 0.0 {
		return false;
	}

	let digest = blake3::hash(id.as_bytes());
	let mut head = [0_u8; 8];

	head.copy_from_slice(&digest.as_bytes()[..8]);

	let bucket = u64::from_le_bytes(head) % SAMPLE_BUCKETS;

	bucket < (f64::from(sample_rate) * SAMPLE_BUCKETS as f64) as u64
}
