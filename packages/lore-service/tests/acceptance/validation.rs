use std::sync::Arc;

use lore_domain::PaperSource;
use lore_service::{LoreService, Providers, ResearchRequest, ServiceError};

use super::{FailingEmbedding, FailingSources};

fn service() -> LoreService {
	super::offline_service(Providers::new(Arc::new(FailingEmbedding), Arc::new(FailingSources)))
}

#[tokio::test]
async fn blank_topics_are_rejected() {
	let result = service().retrieve("   ", 5, true).await;

	assert!(matches!(result, Err(ServiceError::InvalidRequest { .. })));
}

#[tokio::test]
async fn zero_targets_are_rejected() {
	let result = service().retrieve("vector retrieval", 0, true).await;

	assert!(matches!(result, Err(ServiceError::InvalidRequest { .. })));
}

#[tokio::test]
async fn research_requests_need_a_topic() {
	let result = service()
		.ensure_sufficient(ResearchRequest {
			topic: "\t \n".to_string(),
			target_count: None,
			use_two_stage: None,
		})
		.await;

	assert!(matches!(result, Err(ServiceError::InvalidRequest { .. })));
}

#[tokio::test]
async fn ingested_papers_need_an_id_and_title() {
	let service = service();
	let mut missing_title =
		super::paper(PaperSource::Arxiv, "2301.00001", "Placeholder", Some(2023));

	missing_title.title = String::new();

	let result = service.ingest(vec![missing_title]).await;

	assert!(matches!(result, Err(ServiceError::InvalidRequest { .. })));

	let mut missing_id = super::paper(PaperSource::Arxiv, "2301.00002", "Placeholder", Some(2023));

	missing_id.id = String::new();

	let result = service.ingest(vec![missing_id]).await;

	assert!(matches!(result, Err(ServiceError::InvalidRequest { .. })));
}
