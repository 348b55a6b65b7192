use std::env;
use anyhow::{Result, Context};

pub const DEFAULT_MODEL_ID: &str = "@cf/meta/llama-3.1-8b-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 1800;
pub const DEFAULT_SITE_TITLE: &str = "Daily Insight";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8787";

#[derive(Debug, Clone)]
pub struct CloudflareConfig {
    pub api_base: String,
    pub account_id: String,
    pub api_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvBackend {
    Cloudflare { namespace_id: String },
    Memory,
    None,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_id: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub hour: u32,
    pub minute: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { hour: 6, minute: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cloudflare: Option<CloudflareConfig>,
    pub kv_backend: KvBackend,
    /// `None` when generation is disabled or no credentials are present.
    pub model: Option<ModelConfig>,
    pub site_title: String,
    pub bind_addr: String,
    pub schedule: ScheduleConfig,
    /// Overrides the built-in topic table when non-empty.
    pub topics: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let cloudflare = match (env::var("CLOUDFLARE_ACCOUNT_ID"), env::var("CLOUDFLARE_API_TOKEN")) {
            (Ok(account_id), Ok(api_token)) => Some(CloudflareConfig {
                api_base: env::var("CLOUDFLARE_API_BASE")
                    .unwrap_or_else(|_| "https://api.cloudflare.com/client/v4".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                account_id,
                api_token,
            }),
            _ => None,
        };

        let namespace_id = env::var("KV_NAMESPACE_ID").ok();
        let kv_backend = match env::var("KV_BACKEND").ok().as_deref().map(str::trim) {
            Some("memory") => KvBackend::Memory,
            Some("none") => KvBackend::None,
            Some("cloudflare") => KvBackend::Cloudflare {
                namespace_id: namespace_id.context("KV_NAMESPACE_ID must be set when KV_BACKEND=cloudflare")?,
            },
            Some(other) => anyhow::bail!("Unknown KV_BACKEND '{}'", other),
            None => match (&cloudflare, namespace_id) {
                (Some(_), Some(namespace_id)) => KvBackend::Cloudflare { namespace_id },
                _ => KvBackend::None,
            },
        };

        let ai_enabled = env::var("AI_ENABLED").ok().map(|s| parse_flag(&s)).unwrap_or(true);
        let model = (ai_enabled && cloudflare.is_some()).then(|| ModelConfig {
            model_id: env::var("AI_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string()),
            max_tokens: env::var("AI_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_TOKENS),
        });

        let schedule = parse_schedule(
            env::var("GENERATION_HOUR").ok().as_deref(),
            env::var("GENERATION_MINUTE").ok().as_deref(),
        );

        let topics = env::var("TOPICS")
            .ok()
            .map(|topics_str| parse_topics(&topics_str))
            .unwrap_or_default();

        Ok(Config {
            cloudflare,
            kv_backend,
            model,
            site_title: env::var("SITE_TITLE").unwrap_or_else(|_| DEFAULT_SITE_TITLE.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            schedule,
            topics,
        })
    }

    pub fn require_cloudflare(&self) -> Result<&CloudflareConfig> {
        self.cloudflare
            .as_ref()
            .context("CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_API_TOKEN must be set")
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Missing or out-of-range parts fall back to the default schedule.
fn parse_schedule(hour: Option<&str>, minute: Option<&str>) -> ScheduleConfig {
    let default = ScheduleConfig::default();
    ScheduleConfig {
        hour: hour
            .and_then(|s| s.trim().parse().ok())
            .filter(|h| *h < 24)
            .unwrap_or(default.hour),
        minute: minute
            .and_then(|s| s.trim().parse().ok())
            .filter(|m| *m < 60)
            .unwrap_or(default.minute),
    }
}

fn parse_topics(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pipe_separated_topics() {
        let topics = parse_topics(" systems design | | databases|  ");
        assert_eq!(topics, vec!["systems design".to_string(), "databases".to_string()]);
    }

    #[test]
    fn default_schedule_is_six_utc() {
        let schedule = ScheduleConfig::default();
        assert_eq!((schedule.hour, schedule.minute), (6, 0));

        let schedule = parse_schedule(None, None);
        assert_eq!((schedule.hour, schedule.minute), (6, 0));
    }

    #[test]
    fn schedule_keeps_valid_parts_only() {
        let schedule = parse_schedule(Some("23"), Some(" 45 "));
        assert_eq!((schedule.hour, schedule.minute), (23, 45));

        let schedule = parse_schedule(Some("24"), Some("noon"));
        assert_eq!((schedule.hour, schedule.minute), (6, 0));
    }

    #[test]
    fn flags_are_case_insensitive() {
        for raw in ["1", "true", "TRUE", "Yes", " on ", "ON"] {
            assert!(parse_flag(raw), "{}", raw);
        }
        for raw in ["0", "false", "off", "no", "", "enabled"] {
            assert!(!parse_flag(raw), "{}", raw);
        }
    }
}
