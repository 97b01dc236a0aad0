use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Review provider
    pub serpapi_api_key: String,
    pub serpapi_timeout_secs: u64,

    // Classifier artifacts
    pub model_dir: PathBuf,
    pub labels_path: Option<PathBuf>,

    // Collection
    pub review_target: usize,

    // Results sink
    pub results_path: PathBuf,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            serpapi_api_key: lookup("SERPAPI_API_KEY")
                .unwrap_or_else(|| panic!("SERPAPI_API_KEY environment variable is required")),
            serpapi_timeout_secs: var_or("SERPAPI_TIMEOUT_SECS", "30")
                .parse()
                .expect("SERPAPI_TIMEOUT_SECS must be a number of seconds"),
            model_dir: PathBuf::from(var_or("MODEL_DIR", "./models/distilbert")),
            labels_path: lookup("LABELS_PATH").map(PathBuf::from),
            review_target: var_or("REVIEW_TARGET", "55")
                .parse()
                .expect("REVIEW_TARGET must be a number"),
            results_path: PathBuf::from(var_or("RESULTS_PATH", "analysis_results.csv")),
            web_host: var_or("WEB_HOST", "0.0.0.0"),
            web_port: var_or("WEB_PORT", "5000")
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }

    /// Upper bound on every single review-provider request.
    pub fn serpapi_timeout(&self) -> Duration {
        Duration::from_secs(self.serpapi_timeout_secs)
    }

    /// Log the effective configuration with credentials masked.
    pub fn log_redacted(&self) {
        info!(
            serpapi_api_key = %redact(&self.serpapi_api_key),
            serpapi_timeout_secs = self.serpapi_timeout_secs,
            model_dir = %self.model_dir.display(),
            labels_path = ?self.labels_path,
            review_target = self.review_target,
            results_path = %self.results_path.display(),
            web_host = self.web_host.as_str(),
            web_port = self.web_port,
            "Configuration loaded"
        );
    }
}

fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[("SERPAPI_API_KEY", "secret")]));
        assert_eq!(config.serpapi_api_key, "secret");
        assert_eq!(config.serpapi_timeout(), Duration::from_secs(30));
        assert_eq!(config.model_dir, PathBuf::from("./models/distilbert"));
        assert_eq!(config.labels_path, None);
        assert_eq!(config.review_target, 55);
        assert_eq!(config.results_path, PathBuf::from("analysis_results.csv"));
        assert_eq!(config.web_port, 5000);
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("SERPAPI_API_KEY", "secret"),
            ("SERPAPI_TIMEOUT_SECS", "5"),
            ("LABELS_PATH", "/models/labels.json"),
            ("REVIEW_TARGET", "80"),
            ("WEB_PORT", "8080"),
        ]));
        assert_eq!(config.serpapi_timeout(), Duration::from_secs(5));
        assert_eq!(config.labels_path, Some(PathBuf::from("/models/labels.json")));
        assert_eq!(config.review_target, 80);
        assert_eq!(config.web_port, 8080);
    }

    #[test]
    #[should_panic(expected = "SERPAPI_API_KEY")]
    fn missing_key_panics() {
        Config::from_lookup(lookup(&[]));
    }

    #[test]
    fn redact_keeps_only_tail() {
        assert_eq!(redact("894bf919c29b"), "****c29b");
        assert_eq!(redact("abc"), "****");
    }
}
