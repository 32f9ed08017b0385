//! Loader for FalseGuard configuration with YAML + environment overlays.
//!
//! Sources are merged in order: inline/file YAML first, then
//! `FALSEGUARD__`-prefixed environment variables (`__` separates nesting,
//! e.g. `FALSEGUARD__SEARCH__MAX_RESULTS=3`). String values may reference
//! `${VAR}` placeholders, expanded recursively after merging. A value that is
//! exactly one unresolved placeholder reads as absent, so an unset
//! `${TAVILY_API_KEY}` surfaces later as a missing credential rather than as a
//! literal key.
//!
//! Every section is optional. Provider credentials default to the
//! conventional environment variables (`GEMINI_API_KEY`, `OPENAI_API_KEY`,
//! `TAVILY_API_KEY`, `BRAVE_API_KEY`).
use config::{Config, ConfigError, Environment, File};
use falseguard_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";
pub const BRAVE_API_KEY_ENV: &str = "BRAVE_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Upper bound on results requested from any search provider.
pub const MAX_SEARCH_RESULTS: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FalseguardConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error(transparent)]
    Source(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl FalseguardConfig {
    /// Reject values the rest of the system cannot honor.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.search.max_results == 0 || self.search.max_results > MAX_SEARCH_RESULTS {
            return Err(ConfigLoadError::Invalid(format!(
                "search.max_results must be within 1..={MAX_SEARCH_RESULTS}, got {}",
                self.search.max_results
            )));
        }
        if self.search.timeout_secs == 0 {
            return Err(ConfigLoadError::Invalid(
                "search.timeout_secs must be positive".into(),
            ));
        }
        if self.media.max_bytes == 0 {
            return Err(ConfigLoadError::Invalid(
                "media.max_bytes must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Gemini {
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default = "default_gemini_key")]
        api_key: Option<String>,
        #[serde(default = "default_gemini_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    Openai {
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default = "default_openai_key")]
        api_key: Option<String>,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    Ollama {
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::Gemini {
            model: default_gemini_model(),
            api_key: default_gemini_key(),
            endpoint: default_gemini_endpoint(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl LlmConfig {
    /// Default `(temperature, max_tokens)` for calls that set neither.
    pub fn sampling(&self) -> (Option<f32>, Option<u32>) {
        match self {
            LlmConfig::Gemini {
                temperature,
                max_tokens,
                ..
            }
            | LlmConfig::Openai {
                temperature,
                max_tokens,
                ..
            }
            | LlmConfig::Ollama {
                temperature,
                max_tokens,
                ..
            } => (*temperature, *max_tokens),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            LlmConfig::Gemini { .. } => "gemini",
            LlmConfig::Openai { .. } => "openai",
            LlmConfig::Ollama { .. } => "ollama",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(flatten)]
    pub provider: SearchProviderConfig,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderConfig::default(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum SearchProviderConfig {
    Tavily {
        #[serde(default = "default_tavily_key")]
        api_key: Option<String>,
        #[serde(default = "default_tavily_endpoint")]
        endpoint: String,
    },
    Brave {
        #[serde(default = "default_brave_key")]
        api_key: Option<String>,
        #[serde(default = "default_brave_endpoint")]
        endpoint: String,
    },
}

impl Default for SearchProviderConfig {
    fn default() -> Self {
        Self::Tavily {
            api_key: default_tavily_key(),
            endpoint: default_tavily_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub stderr: bool,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            dir: None,
            format: default_log_format(),
            stderr: false,
            filter: default_log_filter(),
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            app_name: self.app_name.clone(),
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

/// Limits applied by callers before a media payload reaches the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_media_mime_prefixes")]
    pub accepted_mime_prefixes: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_media_max_bytes(),
            accepted_mime_prefixes: default_media_mime_prefixes(),
        }
    }
}

impl MediaConfig {
    pub fn accepts(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        self.accepted_mime_prefixes
            .iter()
            .any(|p| mime.starts_with(&p.to_ascii_lowercase()))
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_gemini_key() -> Option<String> {
    env_key(GEMINI_API_KEY_ENV).or_else(|| env_key("GOOGLE_API_KEY"))
}
fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}
fn default_openai_key() -> Option<String> {
    env_key(OPENAI_API_KEY_ENV)
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_ollama_model() -> String {
    "llama3.2:3b".into()
}
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}
fn default_tavily_key() -> Option<String> {
    env_key(TAVILY_API_KEY_ENV)
}
fn default_tavily_endpoint() -> String {
    "https://api.tavily.com".into()
}
fn default_brave_key() -> Option<String> {
    env_key(BRAVE_API_KEY_ENV)
}
fn default_brave_endpoint() -> String {
    "https://api.search.brave.com".into()
}
fn default_max_results() -> usize {
    MAX_SEARCH_RESULTS
}
fn default_search_timeout_secs() -> u64 {
    20
}
fn default_app_name() -> String {
    "falseguard".into()
}
fn default_log_format() -> LogFormat {
    LogFormat::Text
}
fn default_log_filter() -> String {
    "info".into()
}
fn default_media_max_bytes() -> u64 {
    5 * 1024 * 1024
}
fn default_media_mime_prefixes() -> Vec<String> {
    vec!["application/pdf".into(), "image/".into()]
}

fn is_unresolved_placeholder(s: &str) -> bool {
    s.starts_with("${") && s.ends_with('}') && !s[2..].contains('$')
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                if is_unresolved_placeholder(&cur) {
                    *v = Value::Null;
                } else {
                    *s = cur;
                }
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FalseguardConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FalseguardConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FalseguardConfigLoader {
    /// Start with no files and `FALSEGUARD__` env overrides.
    ///
    /// ```
    /// use falseguard_config::{FalseguardConfigLoader, MAX_SEARCH_RESULTS};
    ///
    /// let config = FalseguardConfigLoader::new()
    ///     .with_yaml_str("search:\n  provider: tavily\n  timeout_secs: 5")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.search.timeout_secs, 5);
    /// assert_eq!(config.search.max_results, MAX_SEARCH_RESULTS);
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder();
        Self { builder }
    }

    /// Attach a required YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, for headless deployments driven by env only.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use falseguard_config::{FalseguardConfigLoader, SearchProviderConfig};
    ///
    /// unsafe { std::env::set_var("FG_DOC_BRAVE", "injected-from-env"); }
    ///
    /// let config = FalseguardConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// search:
    ///   provider: brave
    ///   api_key: "${FG_DOC_BRAVE}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match &config.search.provider {
    ///     SearchProviderConfig::Brave { api_key, endpoint } => {
    ///         assert_eq!(api_key.as_deref(), Some("injected-from-env"));
    ///         assert_eq!(endpoint, "https://api.search.brave.com");
    ///     }
    ///     _ => panic!("expected Brave configuration"),
    /// }
    ///
    /// unsafe { std::env::remove_var("FG_DOC_BRAVE"); }
    /// ```
    pub fn load(self) -> Result<FalseguardConfig, ConfigLoadError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("FALSEGUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FalseguardConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FG_FOO", Some("bar"), || {
            let mut v = json!("prefix-${FG_FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("FG_CITY", Some("Lagos")), ("FG_STATE", Some("LA"))], || {
            let mut v = json!(["hello-$FG_CITY", { "loc": "${FG_CITY}-${FG_STATE}" }, 42, true, null]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Lagos", { "loc": "Lagos-LA" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("FG_BAZ", Some("qux")),
                ("FG_BAR", Some("mid-${FG_BAZ}")),
                ("FG_TOP", Some("start-${FG_BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FG_TOP}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("FG_A", Some("${FG_B}")), ("FG_B", Some("${FG_A}"))], || {
            let mut v = json!("x=${FG_A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
        });
    }

    #[test]
    fn lone_unresolved_placeholder_becomes_null() {
        temp_env::with_var_unset("FG_DOES_NOT_EXIST", || {
            let mut v = json!({ "api_key": "${FG_DOES_NOT_EXIST}", "note": "hi-${FG_DOES_NOT_EXIST}" });
            expand_env_in_value(&mut v);
            assert_eq!(v["api_key"], Value::Null);
            assert_eq!(v["note"], json!("hi-${FG_DOES_NOT_EXIST}"));
        });
    }

    #[test]
    fn media_config_accepts_pdf_and_images_only() {
        let media = MediaConfig::default();
        assert!(media.accepts("application/pdf"));
        assert!(media.accepts("image/png"));
        assert!(media.accepts("IMAGE/JPEG"));
        assert!(!media.accepts("text/html"));
    }

    #[test]
    fn validate_rejects_out_of_range_result_cap() {
        let mut cfg = FalseguardConfig::default();
        cfg.search.max_results = MAX_SEARCH_RESULTS + 1;
        assert!(matches!(cfg.validate(), Err(ConfigLoadError::Invalid(_))));
        cfg.search.max_results = 0;
        assert!(cfg.validate().is_err());
        cfg.search.max_results = 3;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sampling_defaults_come_from_active_provider() {
        let cfg = LlmConfig::Ollama {
            model: default_ollama_model(),
            endpoint: default_ollama_endpoint(),
            temperature: Some(0.3),
            max_tokens: Some(512),
        };
        assert_eq!(cfg.sampling(), (Some(0.3), Some(512)));
        assert_eq!(cfg.provider_name(), "ollama");
        assert_eq!(LlmConfig::default().provider_name(), "gemini");
    }
}
