pub mod check_config;
pub mod completions;
pub mod fee;
pub mod run;

use garage_schema::{parse_config_file, GarageConfig, Tier};
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "garage.toml";

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn json_line(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Load the explicit config, else `./garage.toml` if it exists, else defaults.
pub fn load_config(path: Option<&Path>) -> Result<GarageConfig, String> {
    let path = match path {
        Some(p) => p,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if !fallback.is_file() {
                tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                return Ok(GarageConfig::default());
            }
            fallback
        }
    };
    tracing::debug!("loading config from {}", path.display());
    parse_config_file(path).map_err(|e| format!("config error: {}: {e}", path.display()))
}

pub fn colorize_tier(tier: Tier) -> String {
    use console::Style;
    let style = match tier {
        Tier::Small => Style::new().green(),
        Tier::Medium => Style::new().yellow(),
        Tier::Large => Style::new().magenta(),
    };
    style.apply_to(tier.as_str()).to_string()
}

pub fn colorize_outcome(ok: bool) -> String {
    use console::Style;
    if ok {
        Style::new().green().apply_to("ok").to_string()
    } else {
        Style::new().red().bold().apply_to("fail").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_string() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn json_line_is_single_line() {
        let val = serde_json::json!({"a": 1, "b": [1, 2]});
        assert!(!json_line(&val).unwrap().contains('\n'));
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.toml");
        std::fs::write(&path, "[capacity]\nsmall = 4\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.capacity.small, 4);
    }

    #[test]
    fn load_config_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.starts_with("config error:"), "{err}");
    }

    #[test]
    fn load_config_rejects_negative_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.toml");
        std::fs::write(&path, "[rates]\ngrace_hours = -1.0\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.contains("grace_hours"), "{err}");
    }

    #[test]
    fn colorized_text_keeps_the_word() {
        assert!(colorize_tier(Tier::Medium).contains("medium"));
        assert!(colorize_outcome(false).contains("fail"));
    }
}
