use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CountPointsBuilder, CreateCollectionBuilder, Distance, Filter, PointId,
		PointStruct, Query, QueryPointsBuilder, UpsertPointsBuilder, Vector, VectorParamsBuilder,
		VectorsConfigBuilder, value::Kind,
	},
};
use uuid::Uuid;

use crate::Result;

pub const DENSE_VECTOR_NAME: &str = "dense";

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &lore_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(&self.collection).await? {
			return Ok(());
		}

		let mut vectors = VectorsConfigBuilder::default();

		vectors.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
		);

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(vectors),
			)
			.await?;

		Ok(())
	}

	pub async fn delete_collection(&self) -> Result<()> {
		self.client.delete_collection(&self.collection).await?;

		Ok(())
	}

	pub async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<()> {
		if points.is_empty() {
			return Ok(());
		}

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
			.await?;

		Ok(())
	}

	/// Nearest-neighbour search over the dense vector. When `candidate_ids`
	/// is given, matching is restricted to exactly that id set; papers
	/// without a stored point simply cannot appear. Returns
	/// `(paper_id, similarity)` pairs, best first.
	pub async fn query_similar(
		&self,
		vector: Vec<f32>,
		candidate_ids: Option<&[String]>,
		limit: u64,
	) -> Result<Vec<(String, f32)>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(limit);

		if let Some(ids) = candidate_ids {
			let point_ids: Vec<PointId> =
				ids.iter().map(|id| PointId::from(point_id_for(id).to_string())).collect();

			search = search.filter(Filter::must([Condition::has_id(point_ids)]));
		}

		let response = self.client.query(search).await?;
		let mut hits = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(Kind::StringValue(paper_id)) =
				point.payload.get("paper_id").and_then(|value| value.kind.as_ref())
			else {
				continue;
			};

			hits.push((paper_id.clone(), point.score));
		}

		Ok(hits)
	}

	pub async fn count_points(&self) -> Result<u64> {
		let response = self
			.client
			.count(CountPointsBuilder::new(self.collection.clone()).exact(true))
			.await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}
}

/// Point ids are derived from the paper id, so re-upserting the same paper
/// overwrites its point instead of growing the collection.
pub fn point_id_for(paper_id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, paper_id.as_bytes())
}

pub fn paper_point(paper_id: &str, year: Option<i32>, vector: Vec<f32>) -> PointStruct {
	let mut payload = Payload::new();

	payload.insert("paper_id", paper_id);

	if let Some(year) = year {
		payload.insert("year", i64::from(year));
	}

	let mut vectors = HashMap::new();

	vectors.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(vector));

	PointStruct::new(point_id_for(paper_id).to_string(), vectors, payload)
}
