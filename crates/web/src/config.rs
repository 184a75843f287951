use extract::{GenerationSettings, Provider};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ProviderSettings,
    pub endpoints: ProviderSettings,
    pub generation: GenerationConfig,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// One value per provider: model ids or base URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub openai: String,
    pub gemini: String,
    pub vertex: String,
}

impl ProviderSettings {
    pub fn get(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Gemini => &self.gemini,
            Provider::Vertex => &self.vertex,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub extract_temperature: f32,
    pub optimize_temperature: f32,
}

impl GenerationConfig {
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            extract_temperature: self.extract_temperature,
            optimize_temperature: self.optimize_temperature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Retry 4xx replies too; normally only 429, 5xx and transport errors
    pub retry_client_errors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "0.0.0.0:3000".to_string(),
            },
            models: ProviderSettings {
                openai: "gpt-4o-mini".to_string(),
                gemini: "gemini-1.5-flash".to_string(),
                vertex: "gemini-1.5-flash".to_string(),
            },
            endpoints: ProviderSettings {
                openai: Provider::OpenAI.default_base_url().to_string(),
                gemini: Provider::Gemini.default_base_url().to_string(),
                vertex: Provider::Vertex.default_base_url().to_string(),
            },
            generation: GenerationConfig {
                extract_temperature: 0.0,
                optimize_temperature: 0.3,
            },
            concurrency: ConcurrencyConfig {
                request_timeout_secs: 60,
            },
            // Single attempt unless configured otherwise
            retry: RetryConfig {
                max_retries: 0,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
                retry_client_errors: false,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 1000,
            },
        }
    }
}

impl AppConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let text = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value.trim().to_string();
            }
        };

        text("BIND_ADDR", &mut config.server.bind_addr);
        text("OPENAI_MODEL", &mut config.models.openai);
        text("GEMINI_MODEL", &mut config.models.gemini);
        text("VERTEX_MODEL", &mut config.models.vertex);
        text("OPENAI_BASE_URL", &mut config.endpoints.openai);
        text("GEMINI_BASE_URL", &mut config.endpoints.gemini);
        text("VERTEX_BASE_URL", &mut config.endpoints.vertex);

        parse_into(&lookup, "EXTRACT_TEMPERATURE", &mut config.generation.extract_temperature);
        parse_into(&lookup, "OPTIMIZE_TEMPERATURE", &mut config.generation.optimize_temperature);
        parse_into(&lookup, "REQUEST_TIMEOUT_SECS", &mut config.concurrency.request_timeout_secs);
        parse_into(&lookup, "MAX_RETRIES", &mut config.retry.max_retries);
        parse_into(&lookup, "INITIAL_BACKOFF_MS", &mut config.retry.initial_backoff_ms);
        parse_into(&lookup, "MAX_BACKOFF_MS", &mut config.retry.max_backoff_ms);
        parse_into(&lookup, "RETRY_CLIENT_ERRORS", &mut config.retry.retry_client_errors);
        parse_into(&lookup, "CACHE_ENABLED", &mut config.cache.enabled);
        parse_into(&lookup, "CACHE_MAX_ENTRIES", &mut config.cache.max_entries);

        config
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!(key, value = %raw, "Ignoring unparseable config value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.retry.max_retries, 0);
        assert!(!config.retry.retry_client_errors);
        assert!(config.cache.enabled);
        assert_eq!(config.models.get(Provider::OpenAI), "gpt-4o-mini");
        assert_eq!(config.endpoints.get(Provider::Gemini), extract::llm::GEMINI_BASE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("VERTEX_MODEL", " gemini-2.0-flash "),
            ("MAX_RETRIES", "2"),
            ("RETRY_CLIENT_ERRORS", "true"),
            ("CACHE_ENABLED", "false"),
            ("OPTIMIZE_TEMPERATURE", "0.9"),
        ]));

        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.models.get(Provider::Vertex), "gemini-2.0-flash");
        assert_eq!(config.retry.max_retries, 2);
        assert!(config.retry.retry_client_errors);
        assert!(!config.cache.enabled);
        assert_eq!(config.generation.settings().optimize_temperature, 0.9);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MAX_RETRIES", "lots"),
            ("REQUEST_TIMEOUT_SECS", "-5"),
            ("OPENAI_MODEL", "   "),
        ]));

        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.concurrency.request_timeout_secs, 60);
        assert_eq!(config.models.openai, "gpt-4o-mini");
    }
}
