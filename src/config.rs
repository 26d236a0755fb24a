//! Site configuration. A `litecss.json` at the input root may set the
//! output directory, the app list, and a reproducible-build epoch; CLI
//! flags override whatever the file provides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BuildError, Result};
use crate::manager::Manager;

/// Config filename looked up under the input root.
pub const CONFIG_FILE: &str = "litecss.json";

/// Apps assumed when neither the config file nor the CLI provides a list.
pub const DEFAULT_APPS: &[&str] = &["lab", "repl", "tree", "notebooks", "consoles", "edit"];

/// Directory name of the default output root, under the input root.
pub const DEFAULT_OUTPUT: &str = "_output";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub lite_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub apps: Option<Vec<String>>,
    pub source_date_epoch: Option<u64>,
}

impl SiteConfig {
    /// Parse a config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| BuildError::read(path, e))?;
        serde_json::from_str(&text).map_err(|e| BuildError::config(path, e))
    }

    /// Load `litecss.json` from a directory if present, defaults otherwise.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve into a [`Manager`], applying overrides and defaults.
    /// `lite_dir` is the CLI-provided input root; explicit CLI output and
    /// apps beat the config file, which beats the defaults.
    pub fn into_manager(
        self,
        lite_dir: PathBuf,
        output_dir: Option<PathBuf>,
        apps: Vec<String>,
    ) -> Manager {
        let lite_dir = self.lite_dir.unwrap_or(lite_dir);
        let output_dir = output_dir
            .or(self.output_dir)
            .unwrap_or_else(|| lite_dir.join(DEFAULT_OUTPUT));
        let apps = if !apps.is_empty() {
            apps
        } else {
            self.apps
                .unwrap_or_else(|| DEFAULT_APPS.iter().map(|a| a.to_string()).collect())
        };
        Manager::new(lite_dir, output_dir, apps).with_source_date_epoch(self.source_date_epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_dir_defaults_when_absent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = SiteConfig::load_dir(tmp.path()).expect("load");
        assert!(config.apps.is_none());
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn load_parses_fields() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"apps": ["lab", "repl"], "output_dir": "dist", "source_date_epoch": 315532800}"#,
        )
        .expect("write");

        let config = SiteConfig::load(&path).expect("load");
        assert_eq!(config.apps.as_deref(), Some(&["lab".to_string(), "repl".to_string()][..]));
        assert_eq!(config.output_dir.as_deref(), Some(Path::new("dist")));
        assert_eq!(config.source_date_epoch, Some(315_532_800));
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"app": ["lab"]}"#).expect("write");

        let err = SiteConfig::load(&path).unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
    }

    #[test]
    fn into_manager_applies_precedence() {
        let config = SiteConfig {
            lite_dir: None,
            output_dir: Some(PathBuf::from("from_config")),
            apps: Some(vec!["lab".to_string()]),
            source_date_epoch: None,
        };
        let manager = config.into_manager(
            PathBuf::from("site"),
            Some(PathBuf::from("from_cli")),
            vec![],
        );
        assert_eq!(manager.output_dir, Path::new("from_cli"));
        assert_eq!(manager.apps, vec!["lab".to_string()]);
    }

    #[test]
    fn into_manager_defaults() {
        let manager = SiteConfig::default().into_manager(PathBuf::from("site"), None, vec![]);
        assert_eq!(manager.output_dir, Path::new("site/_output"));
        assert_eq!(manager.apps.len(), DEFAULT_APPS.len());
        assert_eq!(manager.source_date_epoch, None);
    }
}
