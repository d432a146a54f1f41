use time::OffsetDateTime;

use lore_domain::{NormalizedPaper, PaperSource};

#[derive(Debug, sqlx::FromRow)]
pub struct PaperRow {
	pub paper_id: String,
	pub title: String,
	pub authors: Vec<String>,
	pub year: Option<i32>,
	pub abstract_text: String,
	pub full_text_excerpt: String,
	pub venue: String,
	pub field: String,
	pub categories: Vec<String>,
	pub source: String,
	pub doi: Option<String>,
	pub url: Option<String>,
	pub embedding_eligible: bool,
	pub ingested_at: OffsetDateTime,
}

impl From<PaperRow> for NormalizedPaper {
	fn from(row: PaperRow) -> Self {
		Self {
			id: row.paper_id,
			title: row.title,
			authors: row.authors,
			year: row.year,
			abstract_text: row.abstract_text,
			full_text_excerpt: row.full_text_excerpt,
			venue: row.venue,
			field: row.field,
			categories: row.categories,
			source: PaperSource::from_label(&row.source),
			doi: row.doi,
			url: row.url,
			embedding_eligible: row.embedding_eligible,
		}
	}
}
