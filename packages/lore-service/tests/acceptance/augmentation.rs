use std::{collections::HashMap, sync::Arc};

use lore_domain::PaperSource;
use lore_service::{Providers, ResearchRequest};

use super::{FailingSources, StubEmbedding, StubSources};

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn one_augmentation_pass_reaches_the_floor() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping one_augmentation_pass_reaches_the_floor; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping one_augmentation_pass_reaches_the_floor; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let sources = Arc::new(StubSources {
		by_adapter: HashMap::from([
			(
				"arxiv".to_string(),
				vec![
					super::paper(PaperSource::Arxiv, "2410.00001", "Vector retrieval pulled first", Some(2024)),
					super::paper(PaperSource::Arxiv, "2410.00002", "Vector retrieval pulled second", Some(2023)),
				],
			),
			(
				"semantic_scholar".to_string(),
				vec![super::paper(PaperSource::SemanticScholar, "aa11", "Vector retrieval spare", Some(2023))],
			),
			(
				"pubmed".to_string(),
				vec![
					super::paper(PaperSource::Pubmed, "38000010", "Vector retrieval pulled third", Some(2022)),
					super::paper(PaperSource::Pubmed, "38000011", "Vector retrieval never taken", Some(2022)),
				],
			),
		]),
		calls: std::sync::Mutex::new(Vec::new()),
	});
	let providers =
		Providers::new(Arc::new(StubEmbedding { vector_dim: 4 }), sources.clone());
	let collection = test_db.collection_name("lore_acceptance");
	let mut cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);

	cfg.quality.min_results = 5;
	cfg.sources =
		vec![super::test_source("arxiv"), super::test_source("semantic_scholar"), super::test_source("pubmed")];

	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	service
		.ingest(vec![
			super::paper(PaperSource::Arxiv, "2410.00090", "Vector retrieval seed one", Some(2024)),
			super::paper(PaperSource::Arxiv, "2410.00091", "Vector retrieval seed two", Some(2022)),
		])
		.await
		.expect("Seed ingest failed.");

	let response = service
		.ensure_sufficient(ResearchRequest {
			topic: "vector retrieval".to_string(),
			target_count: Some(5),
			use_two_stage: Some(true),
		})
		.await
		.expect("Research request failed.");

	assert!(response.augmentation.attempted);
	assert_eq!(response.augmentation.report.written, 3);
	assert_eq!(response.augmentation.report.embedded, 3);
	assert_eq!(response.papers.len(), 5);
	assert!(response.verdict.count_ok);
	assert!(!response.insufficient_corpus);
	assert!(!response.stale_corpus_warning);

	// Half the need goes to the primary adapter; the second adapter's quota
	// rounds down to zero, so it is never contacted.
	let pulls = &response.augmentation.pulls;

	assert_eq!(pulls.len(), 2);
	assert_eq!(pulls[0].adapter, "arxiv");
	assert_eq!(pulls[0].requested, 2);
	assert_eq!(pulls[0].fetched, 2);
	assert!(!pulls[0].failed);
	assert_eq!(pulls[1].adapter, "pubmed");
	assert_eq!(pulls[1].requested, 1);
	assert_eq!(pulls[1].fetched, 1);
	assert!(!pulls[1].failed);

	let calls = sources.calls.lock().expect("Calls lock poisoned.");

	assert_eq!(*calls, vec![("arxiv".to_string(), 2), ("pubmed".to_string(), 1)]);
	drop(calls);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn adapter_failures_only_flag_the_corpus() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping adapter_failures_only_flag_the_corpus; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping adapter_failures_only_flag_the_corpus; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let providers =
		Providers::new(Arc::new(StubEmbedding { vector_dim: 4 }), Arc::new(FailingSources));
	let collection = test_db.collection_name("lore_acceptance");
	let mut cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);

	cfg.sources = vec![super::test_source("arxiv"), super::test_source("semantic_scholar")];

	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	service
		.ingest(vec![super::paper(
			PaperSource::Arxiv,
			"2411.00001",
			"Vector retrieval lone seed",
			Some(2023),
		)])
		.await
		.expect("Seed ingest failed.");

	let response = service
		.ensure_sufficient(ResearchRequest {
			topic: "vector retrieval".to_string(),
			target_count: Some(3),
			use_two_stage: Some(true),
		})
		.await
		.expect("Research request failed.");

	assert!(response.augmentation.attempted);
	assert!(response.insufficient_corpus);
	assert!(!response.verdict.count_ok);
	assert_eq!(response.papers.len(), 1);
	assert_eq!(response.augmentation.report.written, 0);
	assert_eq!(response.augmentation.pulls.len(), 2);
	assert!(response.augmentation.pulls.iter().all(|pull| pull.failed));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn cross_adapter_duplicates_collapse_against_the_index() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping cross_adapter_duplicates_collapse_against_the_index; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping cross_adapter_duplicates_collapse_against_the_index; set LORE_QDRANT_URL to run this test."
		);

		return;
	};

	// The same preprint is mirrored by both adapters and normalizes to the
	// same id, so the second copy has to die against the index.
	let shared =
		super::paper(PaperSource::Arxiv, "2410.00077", "Vector retrieval shared preprint", Some(2023));
	let sources = Arc::new(StubSources {
		by_adapter: HashMap::from([
			(
				"arxiv".to_string(),
				vec![
					shared.clone(),
					super::paper(PaperSource::Arxiv, "2410.00078", "Vector retrieval arxiv find", Some(2024)),
				],
			),
			(
				"semantic_scholar".to_string(),
				vec![
					shared,
					super::paper(PaperSource::SemanticScholar, "bb22", "Vector retrieval scholar find", Some(2023)),
				],
			),
		]),
		calls: std::sync::Mutex::new(Vec::new()),
	});
	let providers =
		Providers::new(Arc::new(StubEmbedding { vector_dim: 4 }), sources.clone());
	let collection = test_db.collection_name("lore_acceptance");
	let mut cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);

	cfg.quality.min_results = 5;
	cfg.sources = vec![super::test_source("arxiv"), super::test_source("semantic_scholar")];

	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	service
		.ingest(vec![super::paper(
			PaperSource::Arxiv,
			"2410.00079",
			"Vector retrieval local seed",
			Some(2022),
		)])
		.await
		.expect("Seed ingest failed.");

	let response = service
		.ensure_sufficient(ResearchRequest {
			topic: "vector retrieval".to_string(),
			target_count: Some(5),
			use_two_stage: Some(true),
		})
		.await
		.expect("Research request failed.");

	assert_eq!(response.augmentation.report.written, 3);
	assert_eq!(response.augmentation.report.skipped_duplicate, 1);
	// The duplicate collapse leaves the floor unmet and there is no second
	// pass to make up for it.
	assert_eq!(response.papers.len(), 4);
	assert!(response.insufficient_corpus);
	assert_eq!(
		lore_storage::papers::count_papers(&service.db.pool).await.expect("Count failed."),
		4
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn satisfied_corpus_never_reaches_the_adapters() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping satisfied_corpus_never_reaches_the_adapters; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping satisfied_corpus_never_reaches_the_adapters; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let sources = Arc::new(StubSources {
		by_adapter: HashMap::from([(
			"arxiv".to_string(),
			vec![super::paper(PaperSource::Arxiv, "2412.00001", "Vector retrieval reserve", Some(2024))],
		)]),
		calls: std::sync::Mutex::new(Vec::new()),
	});
	let providers =
		Providers::new(Arc::new(StubEmbedding { vector_dim: 4 }), sources.clone());
	let collection = test_db.collection_name("lore_acceptance");
	let mut cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);

	cfg.sources = vec![super::test_source("arxiv")];

	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");

	super::reset_db(&service.db.pool).await.expect("Failed to reset test database.");

	// Enough papers, all predating the recency floor of 2021.
	service
		.ingest(vec![
			super::paper(PaperSource::Arxiv, "1501.00001", "Vector retrieval classic", Some(2015)),
			super::paper(PaperSource::Arxiv, "1601.00001", "Vector retrieval revisited", Some(2016)),
			super::paper(PaperSource::Arxiv, "1701.00001", "Vector retrieval redux", Some(2017)),
		])
		.await
		.expect("Seed ingest failed.");

	let response = service
		.ensure_sufficient(ResearchRequest {
			topic: "vector retrieval".to_string(),
			target_count: Some(3),
			use_two_stage: Some(true),
		})
		.await
		.expect("Research request failed.");

	assert!(!response.augmentation.attempted);
	assert!(response.augmentation.pulls.is_empty());
	assert!(sources.calls.lock().expect("Calls lock poisoned.").is_empty());
	assert_eq!(response.papers.len(), 3);
	assert!(response.verdict.count_ok);
	assert!(!response.insufficient_corpus);
	// Satisfied on count, stale on recency.
	assert!(response.stale_corpus_warning);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
