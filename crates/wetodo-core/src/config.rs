use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::user::UserId;

/// Environment override for the output mode.
pub const FORMAT_ENV: &str = "WETODO_FORMAT";

/// Contents of `<config_dir>/wetodo/config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity recorded on issued commands, e.g. `local:0`.
    #[serde(default)]
    pub user: Option<String>,
    /// Where lists are stored.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

/// Values given on the command line, which win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub json: bool,
    pub format: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
}

/// Configuration after applying defaults, file, environment and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub user: UserId,
    pub data_dir: PathBuf,
    pub resolved_output: String,
}

/// Path of the user config file, if the platform has a config directory.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wetodo/config.toml"))
}

/// Default data directory: `<data_dir>/wetodo`, or `./.wetodo` when the
/// platform has none.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".wetodo"), |dir| dir.join("wetodo"))
}

/// Load the user config file. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_app_config() -> Result<AppConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(AppConfig::default()),
    }
}

/// Load a config file from an explicit path. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<AppConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the user config and fold in environment and command-line overrides.
///
/// # Errors
///
/// Returns an error if the config file is malformed or the configured user
/// id is invalid.
pub fn resolve_config(overrides: &Overrides) -> Result<EffectiveConfig> {
    let file = load_app_config()?;
    let env_format = env::var(FORMAT_ENV).ok();
    merge(file, overrides, env_format, std::io::stdout().is_terminal())
}

fn merge(
    file: AppConfig,
    overrides: &Overrides,
    env_format: Option<String>,
    is_terminal: bool,
) -> Result<EffectiveConfig> {
    let raw_user = overrides.user.clone().or(file.user);
    let user = match raw_user {
        Some(raw) => {
            UserId::parse(&raw).with_context(|| format!("Invalid configured user '{raw}'"))?
        }
        None => UserId::local_default(),
    };

    let data_dir = overrides
        .data_dir
        .clone()
        .or(file.data_dir)
        .unwrap_or_else(default_data_dir);

    let flag_format = if overrides.json {
        Some("json".to_string())
    } else {
        overrides.format.clone()
    };
    let resolved_output = resolve_output(flag_format, file.output, env_format, is_terminal);

    Ok(EffectiveConfig {
        user,
        data_dir,
        resolved_output,
    })
}

fn resolve_output(
    flag_format: Option<String>,
    file_output: Option<String>,
    env_format: Option<String>,
    is_terminal: bool,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    [flag_format, env_format, file_output]
        .iter()
        .flatten()
        .find_map(|raw| normalize_output_mode(raw))
        .unwrap_or(if is_terminal { "pretty" } else { "text" })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config_from(&dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
user = "gh:1234"
data_dir = "/srv/wetodo"
output = "json"
"#,
        )
        .expect("write");

        let cfg = load_config_from(&path).expect("load");
        assert_eq!(cfg.user.as_deref(), Some("gh:1234"));
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/srv/wetodo")));
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }

    #[test]
    fn malformed_file_is_an_error_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "user = [").expect("write");

        let err = load_config_from(&path).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse"));
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = merge(AppConfig::default(), &Overrides::default(), None, false).expect("merge");
        assert_eq!(cfg.user, UserId::local_default());
        assert_eq!(cfg.data_dir, default_data_dir());
        assert_eq!(cfg.resolved_output, "text");

        let tty = merge(AppConfig::default(), &Overrides::default(), None, true).expect("merge");
        assert_eq!(tty.resolved_output, "pretty");
    }

    #[test]
    fn flags_override_file() {
        let file = AppConfig {
            user: Some("local:1".into()),
            data_dir: Some(PathBuf::from("/from/file")),
            output: Some("pretty".into()),
        };
        let overrides = Overrides {
            json: true,
            format: None,
            data_dir: Some(PathBuf::from("/from/flag")),
            user: Some("gh:7".into()),
        };
        let cfg = merge(file, &overrides, Some("text".into()), true).expect("merge");
        assert_eq!(cfg.user.as_str(), "gh:7");
        assert_eq!(cfg.data_dir, PathBuf::from("/from/flag"));
        assert_eq!(cfg.resolved_output, "json");
    }

    #[test]
    fn env_beats_file_and_aliases_normalize() {
        let file = AppConfig {
            output: Some("plain".into()),
            ..AppConfig::default()
        };
        let cfg = merge(file.clone(), &Overrides::default(), Some("human".into()), false)
            .expect("merge");
        assert_eq!(cfg.resolved_output, "pretty");

        let cfg = merge(file, &Overrides::default(), Some("bogus".into()), true).expect("merge");
        assert_eq!(cfg.resolved_output, "text");
    }

    #[test]
    fn invalid_user_is_rejected() {
        let overrides = Overrides {
            user: Some("Nope".into()),
            ..Overrides::default()
        };
        let err = merge(AppConfig::default(), &overrides, None, false).unwrap_err();
        assert!(format!("{err}").contains("Invalid configured user"));
    }
}
