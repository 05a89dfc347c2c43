//! Shell preferences loaded from `dtsh.toml`.
//!
//! The configuration is read once at startup and handed to the session, which
//! passes it on to commands through their environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DtshError, Result};

/// File name of the preferences document inside the config directory.
pub const CONFIG_FILE: &str = "dtsh.toml";

/// File name of the line editor history inside the config directory.
pub const HISTORY_FILE: &str = "history";

/// User preferences.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// Prompt text; `{cwd}` expands to the current working branch.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Refuse redirection paths that contain spaces.
    #[serde(default = "yes")]
    pub fs_no_spaces: bool,
    /// Refuse redirecting onto an existing file (append mode is still allowed).
    #[serde(default)]
    pub fs_no_overwrite: bool,
    /// External pager command line used by `--pager`.
    #[serde(default = "default_pager")]
    pub pager: String,
    /// Line editor history capacity.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Print a banner when an interactive session opens.
    #[serde(default = "yes")]
    pub banner: bool,
}

fn default_prompt() -> String {
    "❯ ".to_string()
}
fn default_pager() -> String {
    "less -R".to_string()
}
fn default_history_size() -> usize {
    1000
}
fn yes() -> bool {
    true
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            fs_no_spaces: true,
            fs_no_overwrite: false,
            pager: default_pager(),
            history_size: default_history_size(),
            banner: true,
        }
    }
}

impl ShellConfig {
    /// Parse a preferences document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| DtshError::Config(format!("{CONFIG_FILE}: {e}")))
    }

    /// Load preferences from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            log::debug!("no preferences at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Prompt for the given current working branch.
    pub fn prompt_for(&self, cwd: &str) -> String {
        self.prompt.replace("{cwd}", cwd)
    }
}

/// The dtsh configuration directory, from the process environment.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_from(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    )
}

/// `$XDG_CONFIG_HOME/dtsh`, falling back to `$HOME/.config/dtsh`.
pub fn config_dir_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = match xdg_config_home.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(home.filter(|dir| !dir.is_empty())?).join(".config"),
    };
    Some(base.join("dtsh"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.prompt, "❯ ");
        assert!(cfg.fs_no_spaces);
        assert!(!cfg.fs_no_overwrite);
        assert_eq!(cfg.pager, "less -R");
        assert_eq!(cfg.history_size, 1000);
        assert!(cfg.banner);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = ShellConfig::from_toml("").unwrap();
        assert!(cfg.fs_no_spaces);
        assert_eq!(cfg.prompt, "❯ ");
    }

    #[test]
    fn partial_document_overrides() {
        let cfg = ShellConfig::from_toml(
            r#"
prompt = "dtsh:{cwd}$ "
fs_no_overwrite = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.prompt_for("/soc"), "dtsh:/soc$ ");
        assert!(cfg.fs_no_overwrite);
        assert!(cfg.fs_no_spaces);
    }

    #[test]
    fn malformed_document_is_config_error() {
        let err = ShellConfig::from_toml("fs_no_spaces = \"maybe\"").unwrap_err();
        assert!(matches!(err, DtshError::Config(_)));
        assert!(format!("{err}").starts_with("config error: dtsh.toml"));
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ShellConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg.history_size, 1000);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "history_size = 42\nbanner = false\n").unwrap();
        let cfg = ShellConfig::load(&path).unwrap();
        assert_eq!(cfg.history_size, 42);
        assert!(!cfg.banner);
    }

    #[test]
    fn config_dir_prefers_xdg() {
        let dir = config_dir_from(Some("/xdg".into()), Some("/home/u".into()));
        assert_eq!(dir, Some(PathBuf::from("/xdg/dtsh")));
    }

    #[test]
    fn config_dir_falls_back_to_home() {
        let dir = config_dir_from(None, Some("/home/u".into()));
        assert_eq!(dir, Some(PathBuf::from("/home/u/.config/dtsh")));
        let dir = config_dir_from(Some("".into()), Some("/home/u".into()));
        assert_eq!(dir, Some(PathBuf::from("/home/u/.config/dtsh")));
    }

    #[test]
    fn config_dir_without_home() {
        assert_eq!(config_dir_from(None, None), None);
    }
}
