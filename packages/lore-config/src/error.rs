pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure messages carry the file path and the underlying cause, so a bad
/// deployment is diagnosable from the startup log alone.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}: {source}.")]
	ReadConfig { path: std::path::PathBuf, source: std::io::Error },
	#[error("Config file at {path:?} is not valid TOML: {source}.")]
	ParseConfig { path: std::path::PathBuf, source: toml::de::Error },
	#[error("{message}")]
	Validation { message: String },
}
