//! Narrow field extraction for the XML feeds served by arXiv and PubMed.
//!
//! Handles only the shallow, predictable markup those feeds emit. Not a
//! general XML parser.

use regex::Regex;

pub(crate) fn blocks<'a>(document: &'a str, tag: &str) -> Vec<&'a str> {
	let Ok(pattern) = Regex::new(&format!("(?s)<{tag}[ >].*?</{tag}>")) else {
		return Vec::new();
	};

	pattern.find_iter(document).map(|found| found.as_str()).collect()
}

pub(crate) fn first_block<'a>(document: &'a str, tag: &str) -> Option<&'a str> {
	let pattern = Regex::new(&format!("(?s)<{tag}[ >].*?</{tag}>")).ok()?;

	Some(pattern.find(document)?.as_str())
}

/// Text of the first `<tag>` element, with inline markup and entities removed.
pub(crate) fn tag_text(block: &str, tag: &str) -> Option<String> {
	let pattern = Regex::new(&format!("(?s)<{tag}[^>]*>(.*?)</{tag}>")).ok()?;

	Some(strip_tags(pattern.captures(block)?.get(1)?.as_str()))
}

pub(crate) fn tag_texts(block: &str, tag: &str) -> Vec<String> {
	let Ok(pattern) = Regex::new(&format!("(?s)<{tag}[^>]*>(.*?)</{tag}>")) else {
		return Vec::new();
	};

	pattern
		.captures_iter(block)
		.filter_map(|captures| captures.get(1))
		.map(|found| strip_tags(found.as_str()))
		.collect()
}

pub(crate) fn attr_value(block: &str, tag: &str, attr: &str) -> Option<String> {
	let pattern = Regex::new(&format!(r#"<{tag}[^>]*\b{attr}="([^"]*)""#)).ok()?;

	Some(unescape(pattern.captures(block)?.get(1)?.as_str()))
}

pub(crate) fn attr_values(block: &str, tag: &str, attr: &str) -> Vec<String> {
	let Ok(pattern) = Regex::new(&format!(r#"<{tag}[^>]*\b{attr}="([^"]*)""#)) else {
		return Vec::new();
	};

	pattern
		.captures_iter(block)
		.filter_map(|captures| captures.get(1))
		.map(|found| unescape(found.as_str()))
		.collect()
}

/// Drops tags, decodes the predefined entities, and collapses whitespace runs.
pub(crate) fn strip_tags(text: &str) -> String {
	let Ok(pattern) = Regex::new("<[^>]+>") else {
		return text.to_string();
	};

	collapse_whitespace(&unescape(&pattern.replace_all(text, " ")))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unescape(text: &str) -> String {
	text.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&apos;", "'")
		.replace("&amp;", "&")
}
