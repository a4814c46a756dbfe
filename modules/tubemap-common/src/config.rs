use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::ConfigError;

const DEFAULT_CATALOG_PATH: &str = "src/data/places.json";
const DEFAULT_WORKERS: usize = 3;
const MAX_WORKERS: usize = 10;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;

/// Secrets and env-specific values. Keyword lists and thresholds live in
/// [`crate::CurationRules`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Place lookup
    pub kakao_api_key: String,

    // Blog + image search
    pub naver_client_id: String,
    pub naver_client_secret: String,

    // Optional collaborators
    pub youtube_api_key: Option<String>,
    pub google_places_api_key: Option<String>,
    pub openai_api_key: Option<String>,

    // Paths
    pub catalog_path: PathBuf,
    pub rules_path: Option<PathBuf>,

    // Pipeline
    pub workers: usize,
    pub call_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::from_filename(".env.local").ok();
        dotenvy::dotenv().ok();

        let workers = match env::var("CURATOR_WORKERS") {
            Ok(v) => v.parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                key: "CURATOR_WORKERS".into(),
                message: e.to_string(),
            })?,
            Err(_) => DEFAULT_WORKERS,
        };
        let timeout_secs = match env::var("CALL_TIMEOUT_SECS") {
            Ok(v) => v.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "CALL_TIMEOUT_SECS".into(),
                message: e.to_string(),
            })?,
            Err(_) => DEFAULT_CALL_TIMEOUT_SECS,
        };

        let config = Self {
            kakao_api_key: required_env("KAKAO_REST_API_KEY")?,
            naver_client_id: required_env("NAVER_CLIENT_ID")?,
            naver_client_secret: required_env("NAVER_CLIENT_SECRET")?,
            youtube_api_key: optional_env("YOUTUBE_API_KEY"),
            google_places_api_key: optional_env("GOOGLE_PLACES_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            catalog_path: optional_env("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
            rules_path: optional_env("CURATION_RULES").map(PathBuf::from),
            workers: clamp_workers(workers),
            call_timeout: Duration::from_secs(timeout_secs.max(1)),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().count().min(4);
            let head: String = val.chars().take(n).collect();
            format!("{head}...")
        }
        fn preview_opt(val: &Option<String>) -> String {
            val.as_deref().map(preview).unwrap_or_else(|| "(unset)".into())
        }

        info!(
            kakao = %preview(&self.kakao_api_key),
            naver_id = %preview(&self.naver_client_id),
            youtube = %preview_opt(&self.youtube_api_key),
            google_places = %preview_opt(&self.google_places_api_key),
            openai = %preview_opt(&self.openai_api_key),
            catalog = %self.catalog_path.display(),
            workers = self.workers,
            "Configuration loaded"
        );
    }
}

/// Keep the worker pool inside the 1..=10 band the providers tolerate.
pub fn clamp_workers(requested: usize) -> usize {
    requested.clamp(1, MAX_WORKERS)
}

fn required_env(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnv(key.to_string())),
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_are_clamped() {
        assert_eq!(clamp_workers(0), 1);
        assert_eq!(clamp_workers(3), 3);
        assert_eq!(clamp_workers(64), 10);
    }

    #[test]
    fn missing_required_env_names_the_variable() {
        let err = required_env("TUBEMAP_TEST_DEFINITELY_UNSET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TUBEMAP_TEST_DEFINITELY_UNSET environment variable is required"
        );
    }
}
