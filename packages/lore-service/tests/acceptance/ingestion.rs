use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};

use lore_domain::PaperSource;
use lore_service::Providers;

use super::{FailingEmbedding, FailingSources, SpyEmbedding, StubEmbedding};

async fn eligibility_flags(pool: &sqlx::PgPool, ids: &[String]) -> HashMap<String, bool> {
	lore_storage::papers::fetch_papers_by_ids(pool, ids)
		.await
		.expect("Failed to fetch papers.")
		.into_iter()
		.map(|paper| (paper.id, paper.embedding_eligible))
		.collect()
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn ingesting_the_same_batch_twice_writes_nothing_new() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping ingesting_the_same_batch_twice_writes_nothing_new; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping ingesting_the_same_batch_twice_writes_nothing_new; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let embed_calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(SpyEmbedding { vector_dim: 4, calls: embed_calls.clone() }),
		Arc::new(FailingSources),
	);
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	let batch = vec![
		super::paper(PaperSource::Arxiv, "2301.00001", "Vector retrieval at scale", Some(2023)),
		super::paper(PaperSource::Arxiv, "2301.00002", "Dense vector retrieval surveys", Some(2022)),
		super::paper(PaperSource::Pubmed, "38000001", "Vector retrieval in medicine", Some(2024)),
	];

	let first = service.ingest(batch.clone()).await.expect("First ingest failed.");

	assert_eq!(first.written, 3);
	assert_eq!(first.skipped_duplicate, 0);
	assert_eq!(first.embedded, 3);
	// One provider call for the whole batch.
	assert_eq!(embed_calls.load(Ordering::SeqCst), 1);
	assert_eq!(service.qdrant.count_points().await.expect("Failed to count points."), 3);

	let second = service.ingest(batch).await.expect("Second ingest failed.");

	assert_eq!(second.written, 0);
	assert_eq!(second.skipped_duplicate, 3);
	assert_eq!(second.embedded, 0);
	assert_eq!(embed_calls.load(Ordering::SeqCst), 1);
	assert_eq!(service.qdrant.count_points().await.expect("Failed to count points."), 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn duplicates_inside_one_batch_collapse_first_wins() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping duplicates_inside_one_batch_collapse_first_wins; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping duplicates_inside_one_batch_collapse_first_wins; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let providers =
		Providers::new(Arc::new(StubEmbedding { vector_dim: 4 }), Arc::new(FailingSources));
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	let keeper =
		super::paper(PaperSource::Arxiv, "2302.11111", "Sparse retrieval with learned indexes", Some(2023));
	let shadow =
		super::paper(PaperSource::Arxiv, "2302.11111", "A later duplicate of the same record", Some(2023));
	let report = service.ingest(vec![keeper.clone(), shadow]).await.expect("Ingest failed.");

	assert_eq!(report.written, 1);
	assert_eq!(report.skipped_duplicate, 1);

	let stored =
		lore_storage::papers::fetch_papers_by_ids(&service.db.pool, &[keeper.id.clone()])
			.await
			.expect("Failed to fetch papers.");

	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].title, keeper.title);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn eligibility_ignores_batch_order_and_shape() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping eligibility_ignores_batch_order_and_shape; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping eligibility_ignores_batch_order_and_shape; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let providers =
		Providers::new(Arc::new(StubEmbedding { vector_dim: 4 }), Arc::new(FailingSources));
	let collection = test_db.collection_name("lore_acceptance");
	let mut cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);

	// A partial sample rate, so the id hash actually decides per paper.
	cfg.ingestion.embed_sample_rate = 0.35;

	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	let papers: Vec<_> = (0..8)
		.map(|n| {
			super::paper(
				PaperSource::Arxiv,
				&format!("2400.0000{n}"),
				&format!("Retrieval design note {n}"),
				Some(2023),
			)
		})
		.collect();
	let ids: Vec<String> = papers.iter().map(|paper| paper.id.clone()).collect();

	service.ingest(papers.clone()).await.expect("Batched ingest failed.");

	let batched = eligibility_flags(&service.db.pool, &ids).await;

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	for paper in papers.into_iter().rev() {
		service.ingest(vec![paper]).await.expect("Single ingest failed.");
	}

	let one_by_one = eligibility_flags(&service.db.pool, &ids).await;

	assert_eq!(batched.len(), 8);
	assert_eq!(batched, one_by_one);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn embedding_failure_still_writes_keyword_rows() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping embedding_failure_still_writes_keyword_rows; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping embedding_failure_still_writes_keyword_rows; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let providers = Providers::new(Arc::new(FailingEmbedding), Arc::new(FailingSources));
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	let report = service
		.ingest(vec![
			super::paper(PaperSource::Crossref, "10.1000/lore.1", "Graded retrieval quality", Some(2023)),
			super::paper(PaperSource::Crossref, "10.1000/lore.2", "Ranked retrieval quality", Some(2024)),
		])
		.await
		.expect("Ingest failed.");

	assert_eq!(report.written, 2);
	assert_eq!(report.embedded, 0);
	assert_eq!(report.skipped_duplicate, 0);
	assert_eq!(service.qdrant.count_points().await.expect("Failed to count points."), 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
