use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::layout::{FontFamily, LayoutConfig, ScalingMode};
use crate::render::ColorRule;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    /// TTF used for both measuring and drawing. Optional at runtime.
    pub font_path: PathBuf,
    /// Metric table used when `font_path` cannot be loaded.
    pub font_family: FontFamily,
    pub canvas_width: i64,
    pub canvas_height: i64,
    pub min_font_size: u32,
    pub max_font_size: u32,
    pub scaling_mode: ScalingMode,
    pub max_words: usize,
    pub random_seed: u64,
    pub max_backoff_attempts: u32,
    pub prefer_horizontal: f32,
    pub word_margin: u32,
    /// Part-of-speech class kept for the cloud (jieba tag set).
    pub pos_class: String,
    pub color_rule: ColorRule,
    /// Per-run layout deadline in milliseconds; 0 disables it.
    pub layout_timeout_ms: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            upload_dir: env_or("UPLOAD_DIR", "uploads").into(),
            static_dir: env_or("STATIC_DIR", "static").into(),
            font_path: env_or("FONT_PATH", "SimHei.ttf").into(),
            font_family: parse_env_with("FONT_FAMILY", FontFamily::SimHei, |s| {
                FontFamily::from_str(s).map_err(|e| anyhow!(e))
            })?,
            canvas_width: parse_env("CANVAS_WIDTH", 800)?,
            canvas_height: parse_env("CANVAS_HEIGHT", 400)?,
            min_font_size: parse_env("MIN_FONT_SIZE", 8)?,
            max_font_size: parse_env("MAX_FONT_SIZE", 120)?,
            scaling_mode: parse_env_with("SCALING_MODE", ScalingMode::Sqrt, |s| {
                ScalingMode::from_str(s).map_err(|e| anyhow!(e))
            })?,
            max_words: parse_env("MAX_WORDS", 100)?,
            random_seed: parse_env("RANDOM_SEED", 42)?,
            max_backoff_attempts: parse_env("MAX_BACKOFF_ATTEMPTS", 64)?,
            prefer_horizontal: parse_env("PREFER_HORIZONTAL", 0.9)?,
            word_margin: parse_env("WORD_MARGIN", 2)?,
            pos_class: env_or("POS_CLASS", crate::tagging::ADJECTIVE),
            color_rule: parse_env_with("COLOR_RULE", ColorRule::Palette, |s| {
                ColorRule::from_str(s).map_err(|e| anyhow!(e))
            })?,
            layout_timeout_ms: parse_env("LAYOUT_TIMEOUT_MS", 10_000)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 16 * 1024 * 1024)?,
        };

        config
            .layout_config()
            .validate()
            .context("Invalid layout settings")?;
        Ok(config)
    }

    /// Layout parameters for one run.
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            min_font_size: self.min_font_size,
            max_font_size: self.max_font_size,
            scaling_mode: self.scaling_mode,
            max_words: self.max_words,
            random_seed: self.random_seed,
            max_backoff_attempts: self.max_backoff_attempts,
            prefer_horizontal: self.prefer_horizontal,
            margin: self.word_margin,
            ..LayoutConfig::default()
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_env_with(key, default, |s| {
        s.trim()
            .parse::<T>()
            .map_err(anyhow::Error::from)
    })
}

fn parse_env_with<T>(key: &str, default: T, parse: impl FnOnce(&str) -> Result<T>) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => parse(&raw).with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("WORDCLOUD_TEST_UNSET_VAR", 17).unwrap();
        assert_eq!(value, 17);
    }

    #[test]
    fn test_parse_env_reports_key_on_bad_value() {
        std::env::set_var("WORDCLOUD_TEST_BAD_PORT", "eighty");
        let err = parse_env::<u16>("WORDCLOUD_TEST_BAD_PORT", 80).unwrap_err();
        assert!(format!("{err:#}").contains("WORDCLOUD_TEST_BAD_PORT"));
        std::env::remove_var("WORDCLOUD_TEST_BAD_PORT");
    }

    #[test]
    fn test_parse_env_with_custom_parser() {
        std::env::set_var("WORDCLOUD_TEST_MODE", "log");
        let mode = parse_env_with("WORDCLOUD_TEST_MODE", ScalingMode::Sqrt, |s| {
            ScalingMode::from_str(s).map_err(|e| anyhow!(e))
        })
        .unwrap();
        assert_eq!(mode, ScalingMode::Log);
        std::env::remove_var("WORDCLOUD_TEST_MODE");
    }

    #[test]
    fn test_font_family_setting_parses() {
        std::env::set_var("WORDCLOUD_TEST_FAMILY", "Inter");
        let family = parse_env_with("WORDCLOUD_TEST_FAMILY", FontFamily::SimHei, |s| {
            FontFamily::from_str(s).map_err(|e| anyhow!(e))
        })
        .unwrap();
        assert_eq!(family, FontFamily::Inter);

        std::env::set_var("WORDCLOUD_TEST_FAMILY", "papyrus");
        let err = parse_env_with("WORDCLOUD_TEST_FAMILY", FontFamily::SimHei, |s| {
            FontFamily::from_str(s).map_err(|e| anyhow!(e))
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("papyrus"));
        std::env::remove_var("WORDCLOUD_TEST_FAMILY");
    }
}
