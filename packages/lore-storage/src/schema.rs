/// Idempotent bootstrap DDL. Statements are `;`-separated; none of them
/// contains an embedded semicolon.
pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS papers (
	paper_id TEXT PRIMARY KEY,
	title TEXT NOT NULL,
	authors TEXT[] NOT NULL DEFAULT '{}',
	year INT,
	abstract_text TEXT NOT NULL DEFAULT '',
	full_text_excerpt TEXT NOT NULL DEFAULT '',
	venue TEXT NOT NULL DEFAULT '',
	field TEXT NOT NULL DEFAULT 'general',
	categories TEXT[] NOT NULL DEFAULT '{}',
	source TEXT NOT NULL,
	doi TEXT,
	url TEXT,
	embedding_eligible BOOLEAN NOT NULL DEFAULT FALSE,
	ingested_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	search_tsv tsvector GENERATED ALWAYS AS (
		setweight(to_tsvector('english'::regconfig, title), 'A')
		|| setweight(to_tsvector('english'::regconfig, abstract_text), 'B')
		|| setweight(to_tsvector('english'::regconfig, full_text_excerpt), 'C')
	) STORED
);

CREATE INDEX IF NOT EXISTS papers_search_tsv_idx ON papers USING GIN (search_tsv);

CREATE INDEX IF NOT EXISTS papers_year_idx ON papers (year);

CREATE INDEX IF NOT EXISTS papers_source_idx ON papers (source);
";
