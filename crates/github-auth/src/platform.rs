//! Platform path conventions
//!
//! A `PlatformPaths` strategy is chosen once at startup by `detect()` and
//! handed to whatever needs the config directory. Environment variables are
//! read when the strategy is built, never later.

use std::fmt;
use std::path::PathBuf;

use common::env::non_empty_var;

use crate::constants::TOKEN_FILE_NAME;

/// Where a platform keeps per-user configuration.
pub trait PlatformPaths: Send + Sync + fmt::Debug {
    /// Short name for logs and `status` output
    fn name(&self) -> &'static str;

    /// Per-user configuration root (e.g. `~/.config`)
    fn config_root(&self) -> Option<PathBuf>;

    /// Directory owned by the application under the config root
    fn app_dir(&self, app_name: &str) -> Option<PathBuf> {
        self.config_root().map(|root| root.join(app_name))
    }

    /// Path of the plaintext token file
    fn token_path(&self, app_name: &str) -> Option<PathBuf> {
        self.app_dir(app_name).map(|dir| dir.join(TOKEN_FILE_NAME))
    }
}

/// Linux and macOS: `$XDG_CONFIG_HOME`, falling back to `~/.config`.
#[derive(Debug, Clone, Default)]
pub struct XdgPaths {
    pub xdg_config_home: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl XdgPaths {
    pub fn from_env() -> Self {
        Self {
            xdg_config_home: non_empty_var("XDG_CONFIG_HOME").map(PathBuf::from),
            home: dirs::home_dir(),
        }
    }
}

impl PlatformPaths for XdgPaths {
    fn name(&self) -> &'static str {
        "xdg"
    }

    fn config_root(&self) -> Option<PathBuf> {
        self.xdg_config_home
            .clone()
            .or_else(|| self.home.as_ref().map(|home| home.join(".config")))
    }
}

/// Windows: the roaming application data directory (`%APPDATA%`).
#[derive(Debug, Clone, Default)]
pub struct WindowsPaths {
    pub roaming_app_data: Option<PathBuf>,
}

impl WindowsPaths {
    pub fn from_env() -> Self {
        Self {
            roaming_app_data: non_empty_var("APPDATA")
                .map(PathBuf::from)
                .or_else(dirs::config_dir),
        }
    }
}

impl PlatformPaths for WindowsPaths {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn config_root(&self) -> Option<PathBuf> {
        self.roaming_app_data.clone()
    }
}

/// Select the path strategy for the running platform.
pub fn detect() -> Box<dyn PlatformPaths> {
    if cfg!(windows) {
        Box::new(WindowsPaths::from_env())
    } else {
        Box::new(XdgPaths::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_config_home_wins_over_home() {
        let paths = XdgPaths {
            xdg_config_home: Some(PathBuf::from("/xdg")),
            home: Some(PathBuf::from("/home/dev")),
        };
        assert_eq!(
            paths.token_path("ghctl"),
            Some(PathBuf::from("/xdg/ghctl/token"))
        );
    }

    #[test]
    fn xdg_falls_back_to_dot_config() {
        let paths = XdgPaths {
            xdg_config_home: None,
            home: Some(PathBuf::from("/home/dev")),
        };
        assert_eq!(
            paths.token_path("ghctl"),
            Some(PathBuf::from("/home/dev/.config/ghctl/token"))
        );
    }

    #[test]
    fn xdg_without_any_root_yields_none() {
        assert!(XdgPaths::default().token_path("ghctl").is_none());
    }

    #[test]
    fn windows_uses_roaming_app_data() {
        let paths = WindowsPaths {
            roaming_app_data: Some(PathBuf::from("C:/Users/dev/AppData/Roaming")),
        };
        assert_eq!(
            paths.app_dir("ghctl"),
            Some(PathBuf::from("C:/Users/dev/AppData/Roaming/ghctl"))
        );
        assert_eq!(paths.name(), "windows");
    }

    #[test]
    fn detect_matches_target_platform() {
        let expected = if cfg!(windows) { "windows" } else { "xdg" };
        assert_eq!(detect().name(), expected);
    }
}
