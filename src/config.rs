//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or
//! the file given with `-f`), then applies `POLYGLOT_LOG_LEVEL` and
//! `POLYGLOT_TIMEOUT_MS` env overrides. The LLM API key only ever comes from
//! `LLM_API_KEY`.

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::AppError;
use crate::router::{DEFAULT_FALLBACK, StreamingMode};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Router-wide request settings (`[router]`).
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub log_level: String,
    /// Per-call bound for the classifier and the handler. `None` when
    /// `timeout_ms = 0`.
    pub timeout: Option<Duration>,
    pub mode: StreamingMode,
    /// Fallback template; must contain `{categories}`.
    pub fallback: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Table,
    Script,
    Llm,
}

/// Classifier selection (`[classifier]`).
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    /// query -> category, from `[classifier.table]`. Only read by the
    /// `table` kind.
    pub table: HashMap<String, String>,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM backend configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"`, `"openai"`).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Echo,
    Llm,
}

/// One `[[handlers]]` entry.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub name: String,
    pub category: String,
    pub kind: HandlerKind,
    /// System prompt for `llm` handlers.
    pub role: Option<String>,
    /// Reply prefix for `echo` handlers.
    pub prefix: Option<String>,
    /// Answer as a fragment stream instead of one string.
    pub stream: bool,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub router: RouterConfig,
    pub classifier: ClassifierConfig,
    pub llm: LlmConfig,
    /// In registration order.
    pub handlers: Vec<HandlerConfig>,
    /// API key from `LLM_API_KEY` env var — `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    router: RawRouter,
    #[serde(default)]
    classifier: RawClassifier,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    handlers: Vec<RawHandler>,
}

#[derive(Deserialize)]
struct RawRouter {
    #[serde(default = "default_log_level")]
    log_level: String,
    /// `0` disables the timeout.
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default)]
    mode: StreamingMode,
    #[serde(default = "default_fallback")]
    fallback: String,
}

impl Default for RawRouter {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            timeout_ms: default_timeout_ms(),
            mode: StreamingMode::default(),
            fallback: default_fallback(),
        }
    }
}

#[derive(Deserialize)]
struct RawClassifier {
    #[serde(default = "default_classifier_kind")]
    kind: ClassifierKind,
    #[serde(default)]
    table: HashMap<String, String>,
}

impl Default for RawClassifier {
    fn default() -> Self {
        Self { kind: default_classifier_kind(), table: HashMap::new() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawHandler {
    name: String,
    category: String,
    #[serde(default = "default_handler_kind")]
    kind: HandlerKind,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    stream: bool,
}

fn default_log_level() -> String { "info".to_string() }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_fallback() -> String { DEFAULT_FALLBACK.to_string() }
fn default_classifier_kind() -> ClassifierKind { ClassifierKind::Script }
fn default_handler_kind() -> HandlerKind { HandlerKind::Echo }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_openai_timeout_seconds() -> u64 { 60 }

/// Load config from `path` (default `config/default.toml`), then apply
/// env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("POLYGLOT_LOG_LEVEL").ok();
    let timeout_override = env::var("POLYGLOT_TIMEOUT_MS").ok();
    let path = path.map(expand_home).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    load_from(&path, log_level_override.as_deref(), timeout_override.as_deref())
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    timeout_ms_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let r = parsed.router;

    let log_level = log_level_override.unwrap_or(&r.log_level).to_string();
    crate::logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
    let timeout_ms = match timeout_ms_override {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map_err(|e| AppError::Config(format!("POLYGLOT_TIMEOUT_MS={v:?}: {e}")))?,
        None => r.timeout_ms,
    };

    if parsed.handlers.is_empty() {
        return Err(AppError::Config(format!(
            "{}: at least one [[handlers]] entry is required",
            path.display()
        )));
    }
    for (i, h) in parsed.handlers.iter().enumerate() {
        if h.name.trim().is_empty() || h.category.trim().is_empty() {
            return Err(AppError::Config(format!(
                "{}: handlers[{i}] needs a non-empty name and category",
                path.display()
            )));
        }
    }

    Ok(Config {
        router: RouterConfig {
            log_level,
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            mode: r.mode,
            fallback: r.fallback,
        },
        classifier: ClassifierConfig {
            kind: parsed.classifier.kind,
            table: parsed.classifier.table,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        handlers: parsed
            .handlers
            .into_iter()
            .map(|h| HandlerConfig {
                name: h.name.trim().to_string(),
                category: h.category.trim().to_string(),
                kind: h.kind,
                role: h.role,
                prefix: h.prefix,
                stream: h.stream,
            })
            .collect(),
        llm_api_key: env::var("LLM_API_KEY").ok(),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests — dummy LLM, echo handlers, table classifier.
#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        let echo = |name: &str, category: &str| HandlerConfig {
            name: name.into(),
            category: category.into(),
            kind: HandlerKind::Echo,
            role: None,
            prefix: None,
            stream: false,
        };
        Self {
            router: RouterConfig {
                log_level: "info".into(),
                timeout: Some(Duration::from_secs(1)),
                mode: StreamingMode::Eager,
                fallback: default_fallback(),
            },
            classifier: ClassifierConfig {
                kind: ClassifierKind::Table,
                table: HashMap::from([
                    ("Comment allez-vous?".to_string(), "French".to_string()),
                    ("How are you?".to_string(), "English".to_string()),
                    ("你好吗？".to_string(), "Chinese".to_string()),
                    ("Come stai?".to_string(), "UNCLASSIFIED".to_string()),
                ]),
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            handlers: vec![
                echo("EchoEN", "English"),
                echo("EchoZH", "Chinese"),
                echo("EchoFR", "French"),
            ],
            llm_api_key: None,
        }
    }
}
