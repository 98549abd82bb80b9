use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use site_core::navigation::DEFAULT_SCROLL_THRESHOLD;
use site_shared::protocol::FORM_RELAY_ENDPOINT;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "site.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub form_endpoint: String,
    pub scroll_threshold: f64,
    /// Unset means a submission may wait on the relay indefinitely.
    pub submit_timeout_seconds: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            form_endpoint: FORM_RELAY_ENDPOINT.into(),
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            submit_timeout_seconds: None,
        }
    }
}

impl Settings {
    pub fn submit_timeout(&self) -> Option<Duration> {
        self.submit_timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    form_endpoint: Option<String>,
    scroll_threshold: Option<f64>,
    submit_timeout_seconds: Option<u64>,
}

/// Defaults, then the config file, then environment overrides. An explicit
/// `path` must be readable; the implicit `site.toml` may be absent.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, raw) = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            (path, Some(raw))
        }
        None => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            (path, fs::read_to_string(path).ok())
        }
    };
    if let Some(raw) = raw {
        apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    validate_endpoint(&settings.form_endpoint)?;
    Ok(settings)
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.form_endpoint {
        settings.form_endpoint = v;
    }
    if let Some(v) = file_cfg.scroll_threshold {
        settings.scroll_threshold = v;
    }
    if let Some(v) = file_cfg.submit_timeout_seconds {
        settings.submit_timeout_seconds = Some(v);
    }
    Ok(())
}

pub(crate) fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("FORM_ENDPOINT") {
        settings.form_endpoint = v;
    }
    if let Some(v) = lookup("APP__FORM_ENDPOINT") {
        settings.form_endpoint = v;
    }

    if let Some(v) = lookup("APP__SCROLL_THRESHOLD") {
        match v.trim().parse::<f64>() {
            Ok(parsed) => settings.scroll_threshold = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring unparsable APP__SCROLL_THRESHOLD"),
        }
    }

    if let Some(v) = lookup("APP__SUBMIT_TIMEOUT_SECONDS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.submit_timeout_seconds = Some(parsed),
            Err(_) => tracing::warn!(value = %v, "ignoring unparsable APP__SUBMIT_TIMEOUT_SECONDS"),
        }
    }
}

pub(crate) fn validate_endpoint(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid form endpoint '{raw}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("form endpoint must use http or https, got '{other}'"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
