use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::errors::TodoError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Optional overrides read from `~/todo/config.json`
#[derive(Debug, Default, Deserialize, Serialize)]
struct TodoConfig {
    api_url: Option<String>,
    page_size: Option<usize>,
    health_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub page_size: usize,
    pub health_interval: Duration,
    pub request_timeout: Duration,
    pub credentials_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::from(DEFAULT_API_URL),
            page_size: DEFAULT_PAGE_SIZE,
            health_interval: Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            credentials_path: todo_dir().join("credentials"),
        }
    }
}

/// `~/todo`, where credentials and the config file live
pub fn todo_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("todo");
    path
}

impl Config {
    /// Defaults, then `~/todo/config.json`, then `.env` and the environment
    pub fn load() -> Result<Config, TodoError> {
        dotenv::dotenv().ok();

        let mut config = Config::default();
        config.apply_file(&todo_dir().join("config.json"))?;
        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    fn apply_file(&mut self, path: &std::path::Path) -> Result<(), TodoError> {
        if !path.exists() {
            return Ok(());
        }

        let contents = std::fs::read_to_string(path)?;
        let file: TodoConfig = serde_json::from_str(&contents).map_err(|e| {
            TodoError::Config(format!("{} is not valid: {}", path.display(), e))
        })?;

        log::debug!("Loaded config overrides from {}", path.display());

        if let Some(api_url) = file.api_url {
            self.api_url = normalize_api_url(&api_url);
        }
        if let Some(page_size) = file.page_size {
            self.page_size = check_page_size(page_size)?;
        }
        if let Some(secs) = file.health_interval_secs {
            self.health_interval = check_seconds("health_interval_secs", secs)?;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = check_seconds("request_timeout_secs", secs)?;
        }

        Ok(())
    }

    fn apply_env<F>(&mut self, var: F) -> Result<(), TodoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = var("TODO_API_URL").or_else(|| var("API_URL")) {
            self.api_url = normalize_api_url(&api_url);
        }

        if let Some(raw) = var("TODO_PAGE_SIZE") {
            self.page_size = check_page_size(parse_number("TODO_PAGE_SIZE", &raw)? as usize)?;
        }

        if let Some(raw) = var("TODO_HEALTH_INTERVAL_SECS") {
            self.health_interval = check_seconds(
                "TODO_HEALTH_INTERVAL_SECS",
                parse_number("TODO_HEALTH_INTERVAL_SECS", &raw)?,
            )?;
        }

        if let Some(raw) = var("TODO_REQUEST_TIMEOUT_SECS") {
            self.request_timeout = check_seconds(
                "TODO_REQUEST_TIMEOUT_SECS",
                parse_number("TODO_REQUEST_TIMEOUT_SECS", &raw)?,
            )?;
        }

        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, TodoError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| TodoError::Config(format!("{} must be a number, got '{}'", key, raw)))
}

fn check_page_size(page_size: usize) -> Result<usize, TodoError> {
    if page_size == 0 {
        return Err(TodoError::Config(String::from(
            "page size must be at least 1",
        )));
    }
    Ok(page_size)
}

fn check_seconds(key: &str, secs: u64) -> Result<Duration, TodoError> {
    if secs == 0 {
        return Err(TodoError::Config(format!("{} must be at least 1 second", key)));
    }
    Ok(Duration::from_secs(secs))
}

/// Accepts `host:port` as well as full URLs
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod config_test {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_normalize_api_url() {
        assert_eq!(normalize_api_url("localhost:5900"), "http://localhost:5900");
        assert_eq!(
            normalize_api_url("https://todo.example.com/api/"),
            "https://todo.example.com/api"
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();

        config
            .apply_env(env(&[
                ("API_URL", "localhost:9000"),
                ("TODO_PAGE_SIZE", "25"),
                ("TODO_HEALTH_INTERVAL_SECS", "5"),
            ]))
            .unwrap();

        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.health_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_todo_api_url_wins_over_legacy_name() {
        let mut config = Config::default();

        config
            .apply_env(env(&[
                ("API_URL", "localhost:9000"),
                ("TODO_API_URL", "http://api.internal/v1"),
            ]))
            .unwrap();

        assert_eq!(config.api_url, "http://api.internal/v1");
    }

    #[test]
    fn test_invalid_page_size() {
        let mut config = Config::default();

        let res = config.apply_env(env(&[("TODO_PAGE_SIZE", "0")]));
        assert!(matches!(res, Err(TodoError::Config(_))));

        let res = config.apply_env(env(&[("TODO_PAGE_SIZE", "ten")]));
        assert!(matches!(res, Err(TodoError::Config(_))));
    }

    #[test]
    fn test_zero_intervals_are_rejected() {
        let mut config = Config::default();

        let res = config.apply_env(env(&[("TODO_HEALTH_INTERVAL_SECS", "0")]));
        assert!(matches!(res, Err(TodoError::Config(_))));

        let res = config.apply_env(env(&[("TODO_REQUEST_TIMEOUT_SECS", "0")]));
        assert!(matches!(res, Err(TodoError::Config(_))));

        assert_eq!(config.health_interval, Duration::from_secs(30));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"health_interval_secs": 0}"#).unwrap();

        assert!(matches!(config.apply_file(&path), Err(TodoError::Config(_))));
    }

    #[test]
    fn test_config_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_url": "localhost:7000/api/", "page_size": 5}"#).unwrap();

        let mut config = Config::default();
        config.apply_file(&path).unwrap();

        assert_eq!(config.api_url, "http://localhost:7000/api");
        assert_eq!(config.page_size, 5);
        assert_eq!(
            config.health_interval,
            Duration::from_secs(DEFAULT_HEALTH_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_missing_config_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.apply_file(&dir.path().join("nope.json")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_broken_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ api_url").unwrap();

        let mut config = Config::default();

        assert!(matches!(config.apply_file(&path), Err(TodoError::Config(_))));
    }
}
