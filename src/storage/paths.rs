//! Application paths for settings and carrier credentials.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::util::env::var_nonempty;

/// Environment variable overriding the credentials root directory.
pub const ENV_CONFIG_DIR: &str = "TRACKING_DAY_CONFIG_DIR";

/// Application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Configuration directory (settings file lives here).
    pub config: PathBuf,
    /// Root under which per-project credential directories live.
    pub credentials_root: PathBuf,
}

impl AppPaths {
    /// Create paths for the tracking-day application.
    ///
    /// `TRACKING_DAY_CONFIG_DIR`, when set, replaces the credentials root.
    #[must_use]
    pub fn new() -> Self {
        let config = ProjectDirs::from("com", "daylily", "tracking-day").map_or_else(
            || {
                let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
                home.join(".config/tracking-day")
            },
            |proj_dirs| proj_dirs.config_dir().to_path_buf(),
        );

        let credentials_root =
            var_nonempty(ENV_CONFIG_DIR).map_or_else(|| config.clone(), PathBuf::from);

        Self {
            config,
            credentials_root,
        }
    }

    /// Paths with an explicit credentials root.
    #[must_use]
    pub fn with_credentials_root(root: impl Into<PathBuf>) -> Self {
        Self {
            credentials_root: root.into(),
            ..Self::new()
        }
    }

    /// Path to the settings file.
    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the credential file for a (project, environment) pair.
    #[must_use]
    pub fn credentials_file(&self, project: &str, environment: &str) -> PathBuf {
        credentials_file_in(&self.credentials_root, project, environment)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// `<root>/<project>/<project>_<environment>.toml`
#[must_use]
pub fn credentials_file_in(root: &Path, project: &str, environment: &str) -> PathBuf {
    root.join(project)
        .join(format!("{project}_{environment}.toml"))
}

mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_file_layout() {
        let path = credentials_file_in(Path::new("/cfg"), "fedex", "prod");
        assert_eq!(path, PathBuf::from("/cfg/fedex/fedex_prod.toml"));
    }

    #[test]
    fn explicit_root_wins() {
        let paths = AppPaths::with_credentials_root("/tmp/creds");
        assert_eq!(
            paths.credentials_file("fedex", "test"),
            PathBuf::from("/tmp/creds/fedex/fedex_test.toml")
        );
    }
}
