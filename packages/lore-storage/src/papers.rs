use sqlx::PgExecutor;

use crate::{Result, models::PaperRow};
use lore_domain::NormalizedPaper;

/// Inserts one paper. Returns `false` when a row with the same id already
/// exists; the existing row is left untouched.
pub async fn insert_paper<'e, E>(executor: E, paper: &NormalizedPaper) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO papers (
\tpaper_id,
\ttitle,
\tauthors,
\tyear,
\tabstract_text,
\tfull_text_excerpt,
\tvenue,
\tfield,
\tcategories,
\tsource,
\tdoi,
\turl,
\tembedding_eligible
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
ON CONFLICT (paper_id) DO NOTHING",
	)
	.bind(paper.id.as_str())
	.bind(paper.title.as_str())
	.bind(&paper.authors)
	.bind(paper.year)
	.bind(paper.abstract_text.as_str())
	.bind(paper.full_text_excerpt.as_str())
	.bind(paper.venue.as_str())
	.bind(paper.field.as_str())
	.bind(&paper.categories)
	.bind(paper.source.as_str())
	.bind(paper.doi.as_deref())
	.bind(paper.url.as_deref())
	.bind(paper.embedding_eligible)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn paper_exists<'e, E>(executor: E, paper_id: &str) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM papers WHERE paper_id = $1")
		.bind(paper_id)
		.fetch_optional(executor)
		.await?;

	Ok(found.is_some())
}

#[derive(sqlx::FromRow)]
struct ScoredPaperRow {
	#[sqlx(flatten)]
	paper: PaperRow,
	score: f32,
}

/// Weighted full-text search. Ties resolve to the newer paper, then to the
/// earlier insertion, so repeated queries return a stable order.
pub async fn search_papers<'e, E>(
	executor: E,
	query: &str,
	limit: i64,
) -> Result<Vec<(NormalizedPaper, f32)>>
where
	E: PgExecutor<'e>,
{
	let rows: Vec<ScoredPaperRow> = sqlx::query_as(
		"\
SELECT
\tpaper_id,
\ttitle,
\tauthors,
\tyear,
\tabstract_text,
\tfull_text_excerpt,
\tvenue,
\tfield,
\tcategories,
\tsource,
\tdoi,
\turl,
\tembedding_eligible,
\tingested_at,
\tts_rank_cd(search_tsv, plainto_tsquery('english', $1)) AS score
FROM papers
WHERE search_tsv @@ plainto_tsquery('english', $1)
ORDER BY score DESC, year DESC NULLS LAST, ingested_at ASC
LIMIT $2",
	)
	.bind(query)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().map(|row| (NormalizedPaper::from(row.paper), row.score)).collect())
}

pub async fn fetch_papers_by_ids<'e, E>(
	executor: E,
	paper_ids: &[String],
) -> Result<Vec<NormalizedPaper>>
where
	E: PgExecutor<'e>,
{
	let rows: Vec<PaperRow> = sqlx::query_as(
		"\
SELECT
\tpaper_id,
\ttitle,
\tauthors,
\tyear,
\tabstract_text,
\tfull_text_excerpt,
\tvenue,
\tfield,
\tcategories,
\tsource,
\tdoi,
\turl,
\tembedding_eligible,
\tingested_at
FROM papers
WHERE paper_id = ANY($1)",
	)
	.bind(paper_ids)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().map(NormalizedPaper::from).collect())
}

/// Every paper the embedding policy selected, oldest ingestion first. Used by
/// the semantic-index rebuild.
pub async fn eligible_papers<'e, E>(executor: E) -> Result<Vec<NormalizedPaper>>
where
	E: PgExecutor<'e>,
{
	let rows: Vec<PaperRow> = sqlx::query_as(
		"\
SELECT
\tpaper_id,
\ttitle,
\tauthors,
\tyear,
\tabstract_text,
\tfull_text_excerpt,
\tvenue,
\tfield,
\tcategories,
\tsource,
\tdoi,
\turl,
\tembedding_eligible,
\tingested_at
FROM papers
WHERE embedding_eligible
ORDER BY ingested_at ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows.into_iter().map(NormalizedPaper::from).collect())
}

pub async fn count_papers<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	Ok(sqlx::query_scalar("SELECT count(*) FROM papers").fetch_one(executor).await?)
}

pub async fn count_recent_papers<'e, E>(executor: E, floor_year: i32) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	Ok(sqlx::query_scalar("SELECT count(*) FROM papers WHERE year >= $1")
		.bind(floor_year)
		.fetch_one(executor)
		.await?)
}

pub async fn count_papers_by_source<'e, E>(executor: E) -> Result<Vec<(String, i64)>>
where
	E: PgExecutor<'e>,
{
	Ok(sqlx::query_as(
		"\
SELECT source, count(*)
FROM papers
GROUP BY source
ORDER BY source",
	)
	.fetch_all(executor)
	.await?)
}
