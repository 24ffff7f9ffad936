use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use ccdr_config::Config;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let table = root
		.as_table_mut()
		.and_then(|root| root.get_mut(section))
		.and_then(Value::as_table_mut)
		.expect("Sample config must include the requested section.");

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("ccdr_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> ccdr_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = ccdr_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation_message(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");
	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn loads_sample_config_and_normalizes_fields() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML.to_string()).expect("Failed to load sample config.");

	assert_eq!(cfg.store.feedback_log_path, None);
	assert_eq!(cfg.providers.embedding.api_key, "key");
	assert_eq!(cfg.retrieval.keywords.len(), 2);
	assert_eq!(cfg.retrieval.keywords[1].aliases, vec!["colégio".to_string()]);
	assert_eq!(cfg.ranking.training.epochs, 4);
}

#[test]
fn missing_optional_sections_fall_back_to_defaults() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let table = root.as_table_mut().expect("Sample config must be a table.");

	table.remove("matcher");
	table.remove("retrieval");
	table.remove("ranking");

	let payload = toml::to_string(&root).expect("Failed to render sample config.");
	let cfg = load_payload(payload).expect("Failed to load config without optional sections.");

	assert_eq!(cfg.matcher.distance_threshold, 5.0);
	assert_eq!(cfg.retrieval.fallback_cap, 0);
	assert_eq!(cfg.retrieval.keywords.len(), 6);
	assert_eq!(cfg.retrieval.keywords[0].keyword, "estádio");
	assert_eq!(cfg.ranking.feedback_retention, "retain");
	assert_eq!(cfg.ranking.outcome, "click");
	assert_eq!(cfg.ranking.retrain_interval_seconds, 10);
}

#[test]
fn feedback_retention_must_be_known() {
	expect_validation_message(
		sample_toml_with("ranking", "feedback_retention", Value::String("forever".to_string())),
		"ranking.feedback_retention must be one of retain or prune.",
	);
}

#[test]
fn outcome_must_be_known() {
	expect_validation_message(
		sample_toml_with("ranking", "outcome", Value::String("stars".to_string())),
		"ranking.outcome must be one of click or relevance.",
	);
}

#[test]
fn retrain_interval_must_be_positive() {
	expect_validation_message(
		sample_toml_with("ranking", "retrain_interval_seconds", Value::Integer(0)),
		"ranking.retrain_interval_seconds must be greater than zero.",
	);
}

#[test]
fn distance_threshold_must_be_positive() {
	expect_validation_message(
		sample_toml_with("matcher", "distance_threshold", Value::Float(0.0)),
		"matcher.distance_threshold must be greater than zero.",
	);
}

#[test]
fn keyword_must_be_non_empty() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let keywords = root
		.get_mut("retrieval")
		.and_then(|retrieval| retrieval.get_mut("keywords"))
		.and_then(Value::as_array_mut)
		.expect("Sample config must include retrieval keywords.");
	let mut blank = toml::map::Map::new();

	blank.insert("keyword".to_string(), Value::String("  ".to_string()));
	keywords.push(Value::Table(blank));

	expect_validation_message(
		toml::to_string(&root).expect("Failed to render sample config."),
		"retrieval.keywords.keyword must be non-empty.",
	);
}

#[test]
fn parse_errors_name_the_file() {
	let err = load_payload("not = [valid".to_string()).expect_err("Expected parse error.");

	assert!(matches!(err, ccdr_config::Error::ParseConfig { .. }));
	assert!(err.to_string().contains("Failed to parse config file"));
}
