use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as float: {source}")]
    ParseFloat {
        name: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
///
/// Read once at startup; a scheduler run only ever sees an immutable snapshot.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot: BotSettings,
    pub forum: ForumConfig,
    pub generator: GeneratorConfig,
    pub stores: StorePaths,
    /// Upstream generator credentials, rotated across runs.
    pub api_keys: Vec<String>,
}

/// Behaviour of a single scheduler run.
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub board_id: String,
    pub persona: String,

    // Toggles
    pub write_article_enabled: bool,
    pub write_comment_enabled: bool,
    pub record_memory_enabled: bool,
    pub load_memory_enabled: bool,
    pub record_data_enabled: bool,
    pub use_time_limit: bool,

    // Timing
    pub article_interval: Duration,
    pub comment_interval: Duration,
    pub memory_record_interval: Duration,
    pub max_run_time: Duration,

    /// Number of recent items sampled for trends and memory.
    pub crawl_window: usize,
}

#[derive(Clone)]
pub struct ForumConfig {
    pub base_url: String,
    pub username: String,
    pub api_key: String,
}

impl fmt::Debug for ForumConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForumConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub backend: GeneratorBackend,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi,
    /// Local Ollama server.
    Ollama,
}

impl GeneratorBackend {
    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

/// Locations of the three store files.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub crawl: PathBuf,
    pub content: PathBuf,
    pub memory: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = parse_backend(&env_or_default("GENERATOR_BACKEND", "openai"))?;

        Ok(Self {
            bot: BotSettings {
                board_id: required_env("BOARD_ID")?,
                persona: required_env("BOT_PERSONA")?,

                write_article_enabled: parse_env_bool("BOT_WRITE_ARTICLE_ENABLED", true)?,
                write_comment_enabled: parse_env_bool("BOT_WRITE_COMMENT_ENABLED", true)?,
                record_memory_enabled: parse_env_bool("BOT_RECORD_MEMORY_ENABLED", true)?,
                load_memory_enabled: parse_env_bool("BOT_LOAD_MEMORY_ENABLED", true)?,
                record_data_enabled: parse_env_bool("BOT_RECORD_DATA_ENABLED", true)?,
                use_time_limit: parse_env_bool("BOT_USE_TIME_LIMIT", false)?,

                article_interval: Duration::from_secs(parse_env_u64("BOT_ARTICLE_INTERVAL", 90)?),
                comment_interval: Duration::from_secs(parse_env_u64("BOT_COMMENT_INTERVAL", 45)?),
                memory_record_interval: Duration::from_secs(parse_env_u64(
                    "BOT_MEMORY_RECORD_INTERVAL",
                    600,
                )?),
                max_run_time: Duration::from_secs(parse_env_u64("BOT_MAX_RUN_TIME", 1800)?),

                crawl_window: parse_env_usize("BOT_CRAWL_ARTICLE_COUNT", 20)?,
            },

            forum: ForumConfig {
                base_url: required_env("FORUM_BASE_URL")?,
                username: required_env("FORUM_USERNAME")?,
                api_key: required_env("FORUM_API_KEY")?,
            },

            generator: GeneratorConfig {
                backend,
                base_url: env_or_default("GENERATOR_BASE_URL", backend.default_base_url()),
                model: env_or_default("MODEL_NAME", "gpt-4o"),
                temperature: parse_env_f32("GEN_TEMPERATURE", 0.7)?,
                max_output_tokens: parse_env_u32("GEN_MAX_OUTPUT_TOKENS", 300)?,
                timeout: Duration::from_secs(parse_env_u64("GENERATION_TIMEOUT_SECS", 120)?),
            },

            stores: StorePaths {
                crawl: PathBuf::from(env_or_default(
                    "CRAWL_DATABASE_PATH",
                    "./data/crawling.sqlite",
                )),
                content: PathBuf::from(env_or_default(
                    "CONTENT_DATABASE_PATH",
                    "./data/data.sqlite",
                )),
                memory: PathBuf::from(env_or_default(
                    "MEMORY_DATABASE_PATH",
                    "./data/memory.sqlite",
                )),
            },

            api_keys: optional_env("API_KEYS")
                .map(|keys| parse_key_list(&keys))
                .unwrap_or_default(),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_empty("BOARD_ID", &self.bot.board_id)?;
        non_empty("BOT_PERSONA", &self.bot.persona)?;
        non_empty("FORUM_BASE_URL", &self.forum.base_url)?;
        non_empty("MODEL_NAME", &self.generator.model)?;

        for (name, url) in [
            ("FORUM_BASE_URL", &self.forum.base_url),
            ("GENERATOR_BASE_URL", &self.generator.base_url),
        ] {
            if url::Url::parse(url).is_err() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not a valid URL: '{url}'"),
                });
            }
        }

        for (name, value) in [
            ("BOT_ARTICLE_INTERVAL", self.bot.article_interval),
            ("BOT_COMMENT_INTERVAL", self.bot.comment_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: "must be at least 1 second".to_string(),
                });
            }
        }

        if self.bot.use_time_limit && self.bot.max_run_time.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "BOT_MAX_RUN_TIME".to_string(),
                message: "must be at least 1 second when BOT_USE_TIME_LIMIT is set".to_string(),
            });
        }

        if self.bot.crawl_window == 0 {
            return Err(ConfigError::InvalidValue {
                name: "BOT_CRAWL_ARTICLE_COUNT".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(ConfigError::InvalidValue {
                name: "GEN_TEMPERATURE".to_string(),
                message: format!("must be between 0.0 and 2.0, got {}", self.generator.temperature),
            });
        }

        if self.generator.backend == GeneratorBackend::OpenAi && self.api_keys.is_empty() {
            return Err(ConfigError::MissingEnvVar("API_KEYS".to_string()));
        }

        Ok(())
    }

    /// Credentials to rotate through. The local backend needs none, so it
    /// gets a single placeholder entry to keep the rotation shape.
    #[must_use]
    pub fn credentials(&self) -> Vec<String> {
        if self.api_keys.is_empty() && self.generator.backend == GeneratorBackend::Ollama {
            vec![String::new()]
        } else {
            self.api_keys.clone()
        }
    }

    /// Configuration suitable for tests: short intervals, stores in `./data`.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            bot: BotSettings::for_testing(),
            forum: ForumConfig {
                base_url: "http://localhost:4200".to_string(),
                username: "bot".to_string(),
                api_key: "forum-key".to_string(),
            },
            generator: GeneratorConfig {
                backend: GeneratorBackend::OpenAi,
                base_url: GeneratorBackend::OpenAi.default_base_url().to_string(),
                model: "gpt-4o".to_string(),
                temperature: 0.7,
                max_output_tokens: 300,
                timeout: Duration::from_secs(10),
            },
            stores: StorePaths {
                crawl: PathBuf::from("./data/crawling.sqlite"),
                content: PathBuf::from("./data/data.sqlite"),
                memory: PathBuf::from("./data/memory.sqlite"),
            },
            api_keys: vec!["key-a".to_string()],
        }
    }
}

impl BotSettings {
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            board_id: "programming".to_string(),
            persona: "A cheerful regular who loves Rust".to_string(),
            write_article_enabled: true,
            write_comment_enabled: true,
            record_memory_enabled: true,
            load_memory_enabled: true,
            record_data_enabled: true,
            use_time_limit: false,
            article_interval: Duration::from_secs(90),
            comment_interval: Duration::from_secs(45),
            memory_record_interval: Duration::from_secs(600),
            max_run_time: Duration::from_secs(1800),
            crawl_window: 20,
        }
    }
}

fn non_empty(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: "cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_f32(name: &str, default: f32) -> Result<f32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseFloat {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

fn parse_backend(value: &str) -> Result<GeneratorBackend, ConfigError> {
    match value.to_lowercase().as_str() {
        "openai" => Ok(GeneratorBackend::OpenAi),
        "ollama" | "local" => Ok(GeneratorBackend::Ollama),
        _ => Err(ConfigError::InvalidValue {
            name: "GENERATOR_BACKEND".to_string(),
            message: format!("must be 'openai' or 'ollama', got '{value}'"),
        }),
    }
}

fn parse_key_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}
