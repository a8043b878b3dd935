//! Integration tests for loading configuration from the environment.

use std::time::Duration;

use board_persona_bot::config::{Config, ConfigError, GeneratorBackend};
use serial_test::serial;

const ALL_VARS: &[&str] = &[
    "BOARD_ID",
    "BOT_PERSONA",
    "FORUM_BASE_URL",
    "FORUM_USERNAME",
    "FORUM_API_KEY",
    "API_KEYS",
    "GENERATOR_BACKEND",
    "GENERATOR_BASE_URL",
    "MODEL_NAME",
    "GEN_TEMPERATURE",
    "BOT_ARTICLE_INTERVAL",
    "BOT_USE_TIME_LIMIT",
    "BOT_WRITE_COMMENT_ENABLED",
    "BOT_RECORD_DATA_ENABLED",
    "MEMORY_DATABASE_PATH",
];

fn clear_env() {
    for name in ALL_VARS {
        std::env::remove_var(name);
    }
}

fn set_required() {
    std::env::set_var("BOARD_ID", "12");
    std::env::set_var("BOT_PERSONA", "A grumpy sysadmin");
    std::env::set_var("FORUM_BASE_URL", "https://forum.example.com");
    std::env::set_var("FORUM_USERNAME", "bot");
    std::env::set_var("FORUM_API_KEY", "secret");
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    set_required();
    std::env::set_var("API_KEYS", "sk-one, sk-two,,sk-three");

    let config = Config::from_env().expect("config should load");
    config.validate().expect("config should validate");

    assert_eq!(config.bot.board_id, "12");
    assert_eq!(config.bot.article_interval, Duration::from_secs(90));
    assert_eq!(config.bot.comment_interval, Duration::from_secs(45));
    assert_eq!(config.bot.memory_record_interval, Duration::from_secs(600));
    assert_eq!(config.bot.max_run_time, Duration::from_secs(1800));
    assert_eq!(config.bot.crawl_window, 20);
    assert!(config.bot.write_article_enabled);
    assert!(config.bot.record_data_enabled);
    assert!(!config.bot.use_time_limit);
    assert_eq!(config.generator.backend, GeneratorBackend::OpenAi);
    assert_eq!(config.generator.model, "gpt-4o");
    assert!((config.generator.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.generator.max_output_tokens, 300);
    assert_eq!(config.credentials(), ["sk-one", "sk-two", "sk-three"]);

    clear_env();
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    set_required();
    std::env::set_var("GENERATOR_BACKEND", "ollama");
    std::env::set_var("MODEL_NAME", "llama3");
    std::env::set_var("BOT_ARTICLE_INTERVAL", "300");
    std::env::set_var("BOT_USE_TIME_LIMIT", "yes");
    std::env::set_var("BOT_WRITE_COMMENT_ENABLED", "false");
    std::env::set_var("BOT_RECORD_DATA_ENABLED", "0");
    std::env::set_var("MEMORY_DATABASE_PATH", "/tmp/bot/memory.sqlite");

    let config = Config::from_env().unwrap();
    config.validate().unwrap();

    assert_eq!(config.generator.backend, GeneratorBackend::Ollama);
    assert_eq!(config.generator.base_url, "http://localhost:11434");
    assert_eq!(config.generator.model, "llama3");
    assert_eq!(config.bot.article_interval, Duration::from_secs(300));
    assert!(config.bot.use_time_limit);
    assert!(!config.bot.write_comment_enabled);
    assert!(!config.bot.record_data_enabled);
    assert_eq!(
        config.stores.memory.to_str(),
        Some("/tmp/bot/memory.sqlite")
    );
    // No keys needed locally; one placeholder keeps rotation going.
    assert_eq!(config.credentials().len(), 1);

    clear_env();
}

#[test]
#[serial]
fn test_from_env_missing_board() {
    clear_env();
    set_required();
    std::env::remove_var("BOARD_ID");

    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::MissingEnvVar(name)) if name == "BOARD_ID"
    ));

    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_bad_values() {
    clear_env();
    set_required();

    std::env::set_var("BOT_USE_TIME_LIMIT", "sometimes");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseBool { .. })
    ));
    std::env::remove_var("BOT_USE_TIME_LIMIT");

    std::env::set_var("BOT_ARTICLE_INTERVAL", "soon");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseInt { .. })
    ));
    std::env::remove_var("BOT_ARTICLE_INTERVAL");

    std::env::set_var("GEN_TEMPERATURE", "hot");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseFloat { .. })
    ));

    clear_env();
}
