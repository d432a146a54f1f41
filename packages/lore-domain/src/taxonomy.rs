/// Maps an arXiv category term to a research field label. Exact category
/// first, then the archive prefix, then `general`.
pub fn field_for_category(category: &str) -> &'static str {
	match category {
		"cs.AI" => "artificial_intelligence",
		"cs.LG" => "machine_learning",
		"cs.CL" => "natural_language_processing",
		"cs.CV" => "computer_vision",
		"cs.CR" => "cryptography",
		"cs.DB" => "databases",
		"cs.DC" => "distributed_computing",
		"cs.DS" => "data_structures",
		"cs.NE" => "neural_networks",
		"cs.RO" => "robotics",
		"stat.ML" => "machine_learning",
		"quant-ph" => "quantum_computing",
		"physics.comp-ph" => "computational_physics",
		"q-bio" => "computational_biology",
		"eess.SP" => "signal_processing",
		"math.OC" => "optimization",
		_ => field_for_prefix(category),
	}
}

/// Canonical form for free-text field labels found in provider metadata.
pub fn normalize_field_label(label: &str) -> String {
	label.trim().to_lowercase().replace(' ', "_")
}

fn field_for_prefix(category: &str) -> &'static str {
	let prefix = match category.split_once('.') {
		Some((prefix, _)) => prefix,
		None => category,
	};

	match prefix {
		"cs" => "computer_science",
		"stat" => "statistics",
		"math" => "mathematics",
		"physics" => "physics",
		"q-bio" => "biology",
		"econ" => "economics",
		"eess" => "electrical_engineering",
		_ => "general",
	}
}
