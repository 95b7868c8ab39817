use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use travel_assistant::gemini_service::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use travel_assistant::{GeminiGenerationConfig, GeminiSettings};

/// Checked in order; the first one set wins.
const API_KEY_VARS: [&str; 2] = ["DEVFEST2024_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiSettings,
    pub qa_domain: Option<String>,
    pub interaction_log: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Idle time after which a session is dropped; `None` keeps sessions forever.
    pub session_ttl: Option<Duration>,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; empty values count as unset
    /// except where an empty value switches a feature off.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = API_KEY_VARS
            .into_iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                anyhow::anyhow!("{} environment variable not set", API_KEY_VARS.join(" or "))
            })?;

        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut gemini = GeminiSettings::new(api_key);
        gemini.model = set("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        gemini.base_url = set("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if let Some(secs) = set("GEMINI_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .context("GEMINI_TIMEOUT_SECS must be a number of seconds")?;
            gemini.timeout = Duration::from_secs(secs);
        }
        gemini.generation = GeminiGenerationConfig {
            temperature: set("GEMINI_TEMPERATURE")
                .map(|v| v.trim().parse::<f32>())
                .transpose()
                .context("GEMINI_TEMPERATURE must be a number")?,
            max_output_tokens: set("GEMINI_MAX_OUTPUT_TOKENS")
                .map(|v| v.trim().parse::<u32>())
                .transpose()
                .context("GEMINI_MAX_OUTPUT_TOKENS must be a positive integer")?,
        };

        let qa_domain = match lookup("PDF_QA_DOMAIN") {
            Some(domain) if domain.trim().is_empty() => None,
            Some(domain) => Some(domain.trim().to_string()),
            None => Some("travel".to_string()),
        };

        let interaction_log = match lookup("INTERACTION_LOG") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from("chatbot_interactions.log")),
        };

        let max_upload_mb = set("MAX_UPLOAD_MB")
            .map(|v| v.trim().parse::<usize>())
            .transpose()
            .context("MAX_UPLOAD_MB must be a whole number")?
            .unwrap_or(200);

        let session_ttl_mins = set("SESSION_TTL_MINS")
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .context("SESSION_TTL_MINS must be a whole number of minutes")?
            .unwrap_or(60);
        let session_ttl = (session_ttl_mins > 0)
            .then(|| Duration::from_secs(session_ttl_mins.saturating_mul(60)));

        let host = set("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = set("PORT").unwrap_or_else(|| "8080".to_string());
        let bind_addr = format!("{}:{}", host.trim(), port.trim())
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        Ok(Self {
            gemini,
            qa_domain,
            interaction_log,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            session_ttl,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_need_only_an_api_key() {
        let config = config(&[("GEMINI_API_KEY", "abc")]).unwrap();

        assert_eq!(config.gemini.api_key, "abc");
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.timeout, Duration::from_secs(60));
        assert!(config.gemini.generation.is_empty());
        assert_eq!(config.qa_domain.as_deref(), Some("travel"));
        assert_eq!(config.interaction_log, Some(PathBuf::from("chatbot_interactions.log")));
        assert_eq!(config.max_upload_bytes, 200 * 1024 * 1024);
        assert_eq!(config.session_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn devfest_key_takes_precedence() {
        let config = config(&[("DEVFEST2024_API_KEY", "first"), ("GEMINI_API_KEY", "second")]).unwrap();
        assert_eq!(config.gemini.api_key, "first");
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = config(&[("GEMINI_API_KEY", "  ")]).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn empty_values_switch_features_off() {
        let config = config(&[
            ("GEMINI_API_KEY", "abc"),
            ("PDF_QA_DOMAIN", ""),
            ("INTERACTION_LOG", ""),
        ])
        .unwrap();

        assert!(config.qa_domain.is_none());
        assert!(config.interaction_log.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config(&[
            ("GEMINI_API_KEY", "abc"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("GEMINI_TIMEOUT_SECS", "15"),
            ("GEMINI_TEMPERATURE", "0.3"),
            ("GEMINI_MAX_OUTPUT_TOKENS", "1000"),
            ("PORT", "3000"),
        ])
        .unwrap();

        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.timeout, Duration::from_secs(15));
        assert_eq!(config.gemini.generation.temperature, Some(0.3));
        assert_eq!(config.gemini.generation.max_output_tokens, Some(1000));
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn session_ttl_is_in_minutes_and_zero_disables_it() {
        let short = config(&[("GEMINI_API_KEY", "abc"), ("SESSION_TTL_MINS", "15")]).unwrap();
        assert_eq!(short.session_ttl, Some(Duration::from_secs(15 * 60)));

        let forever = config(&[("GEMINI_API_KEY", "abc"), ("SESSION_TTL_MINS", "0")]).unwrap();
        assert!(forever.session_ttl.is_none());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(config(&[("GEMINI_API_KEY", "abc"), ("GEMINI_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config(&[("GEMINI_API_KEY", "abc"), ("GEMINI_TEMPERATURE", "warm")]).is_err());
        assert!(config(&[("GEMINI_API_KEY", "abc"), ("SESSION_TTL_MINS", "-5")]).is_err());
    }
}
