//! Configuration management for PDF Sign Server

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::stamp::{StampLayout, DEFAULT_BASELINE_OFFSET, DEFAULT_FONT_SIZE, DEFAULT_MIN_LEFT_MARGIN};

/// Default request body limit (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub stamp: StampConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

/// What gets written onto each page, and where
#[derive(Debug, Clone, Deserialize)]
pub struct StampConfig {
    /// Text placed before the signer, e.g. `Initials: ` or `Signed By: `
    pub label_prefix: String,
    /// Fixed signer used instead of the initials derived from the request
    pub fixed_signer: Option<String>,
    pub layout: StampLayout,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4000,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            stamp: StampConfig::default(),
        }
    }
}

impl Default for StampConfig {
    fn default() -> Self {
        StampConfig {
            label_prefix: "Initials: ".to_string(),
            fixed_signer: None,
            layout: StampLayout::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", 4000)?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            },
            stamp: StampConfig {
                label_prefix: env::var("STAMP_LABEL_PREFIX")
                    .unwrap_or_else(|_| "Initials: ".to_string()),
                fixed_signer: env::var("STAMP_FIXED_SIGNER")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
                layout: StampLayout {
                    font_size: parse_points("STAMP_FONT_SIZE", DEFAULT_FONT_SIZE, false)?,
                    min_left_margin: parse_points("STAMP_LEFT_MARGIN", DEFAULT_MIN_LEFT_MARGIN, true)?,
                    baseline_offset: parse_points(
                        "STAMP_BASELINE_OFFSET",
                        DEFAULT_BASELINE_OFFSET,
                        true,
                    )?,
                },
            },
        })
    }
}

/// Read `key`, falling back to `default` when unset
fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}

/// Read a length in points, which must be finite and not negative
fn parse_points(key: &'static str, default: f32, allow_zero: bool) -> Result<f32, ConfigError> {
    let points: f32 = parse_var(key, default)?;
    let in_range = if allow_zero { points >= 0.0 } else { points > 0.0 };

    if points.is_finite() && in_range {
        Ok(points)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: points.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_initials_variant() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.stamp.label_prefix, "Initials: ");
        assert!(config.stamp.fixed_signer.is_none());
        assert_eq!(config.stamp.layout.baseline_offset, 30.0);
        assert_eq!(config.stamp.layout.min_left_margin, 30.0);
        assert_eq!(config.stamp.layout.font_size, 12.0);
    }

    #[test]
    fn test_parse_var() {
        // Unique names so parallel tests never race on them
        env::set_var("PDF_SIGN_TEST_OFFSET", " 15 ");
        assert_eq!(parse_var("PDF_SIGN_TEST_OFFSET", 30.0_f32).unwrap(), 15.0);

        env::set_var("PDF_SIGN_TEST_PORT", "not-a-port");
        assert!(matches!(
            parse_var::<u16>("PDF_SIGN_TEST_PORT", 4000),
            Err(ConfigError::InvalidValue { key: "PDF_SIGN_TEST_PORT", .. })
        ));

        assert_eq!(parse_var("PDF_SIGN_TEST_UNSET", 7_usize).unwrap(), 7);
    }

    #[test]
    fn test_parse_points_rejects_unusable_lengths() {
        for (key, value) in [
            ("PDF_SIGN_TEST_POINTS_NAN", "NaN"),
            ("PDF_SIGN_TEST_POINTS_INF", "inf"),
            ("PDF_SIGN_TEST_POINTS_NEG", "-5"),
        ] {
            env::set_var(key, value);
            assert!(
                matches!(parse_points(key, 30.0, true), Err(ConfigError::InvalidValue { .. })),
                "{} should be rejected",
                value
            );
        }

        env::set_var("PDF_SIGN_TEST_POINTS_ZERO", "0");
        assert_eq!(parse_points("PDF_SIGN_TEST_POINTS_ZERO", 30.0, true).unwrap(), 0.0);
        assert!(parse_points("PDF_SIGN_TEST_POINTS_ZERO", 12.0, false).is_err());

        env::set_var("PDF_SIGN_TEST_POINTS_OK", "15");
        assert_eq!(parse_points("PDF_SIGN_TEST_POINTS_OK", 30.0, true).unwrap(), 15.0);
        assert_eq!(parse_points("PDF_SIGN_TEST_POINTS_UNSET", 12.0, false).unwrap(), 12.0);
    }
}
