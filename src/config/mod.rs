//! Service configuration management for `inklet.toml`.
//!
//! # Sections
//!
//! | Section       | Purpose                                    |
//! |---------------|--------------------------------------------|
//! | `[base]`      | Site metadata (title)                      |
//! | `[pages]`     | Page storage directory                     |
//! | `[templates]` | Template directory                         |
//! | `[serve]`     | HTTP server (interface, port, workers)     |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "my pastebin"
//!
//! [pages]
//! dir = "pages"
//!
//! [serve]
//! port = 8080
//! workers = 4
//! ```

mod base;
pub mod defaults;
mod error;
mod pages;
mod serve;
mod templates;

// Internal imports used in this module
use base::BaseConfig;
pub use error::ConfigError;
use pages::PagesConfig;
use serve::ServeConfig;
use templates::TemplatesConfig;

use crate::cli::{Cli, Commands};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

/// Root configuration structure representing inklet.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Project root directory (set after loading, never serialized)
    #[serde(skip)]
    root: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Page storage settings
    #[serde(default)]
    pub pages: PagesConfig,

    /// Template settings
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn root(&self) -> &Path {
        if self.root.as_os_str().is_empty() {
            Path::new("./")
        } else {
            &self.root
        }
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Directory page files are stored in, relative to the root
    pub fn pages_dir(&self) -> PathBuf {
        self.root().join(&self.pages.dir)
    }

    /// Directory templates are loaded from, relative to the root
    pub fn templates_dir(&self) -> PathBuf {
        self.root().join(&self.templates.dir)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        // Determine the final root path based on command:
        // `init <name>` scaffolds into a subdirectory of the root
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => {
                let base = cli.root.clone().unwrap_or_else(|| self.root().to_owned());
                base.join(name)
            }
            _ => cli.root.clone().unwrap_or_else(|| self.root().to_owned()),
        };
        self.set_root(&root);

        if let Commands::Serve { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Check invariants that TOML parsing alone cannot enforce.
    ///
    /// Run before serving; failures abort startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serve.interface.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "`serve.interface` is not an IP address: `{}`",
                self.serve.interface
            )));
        }
        if self.serve.workers == 0 {
            return Err(ConfigError::Validation(
                "`serve.workers` must be at least 1".to_string(),
            ));
        }
        if self.pages.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "`pages.dir` must not be empty".to_string(),
            ));
        }
        if self.templates.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "`templates.dir` must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SiteConfig::from_str("").unwrap();

        assert_eq!(config.base.title, "inklet");
        assert_eq!(config.pages.dir, PathBuf::from("pages"));
        assert_eq!(config.templates.dir, PathBuf::from("templates"));
        assert_eq!(config.serve.port, 8080);
    }

    #[test]
    fn test_full_config_parses() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "scratch pages"

            [pages]
            dir = "data/pages"

            [templates]
            dir = "data/templates"

            [serve]
            interface = "0.0.0.0"
            port = 3000
            workers = 2
        "#,
        )
        .unwrap();

        assert_eq!(config.base.title, "scratch pages");
        assert_eq!(config.pages.dir, PathBuf::from("data/pages"));
        assert_eq!(config.serve.interface, "0.0.0.0");
        assert_eq!(config.serve.workers, 2);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = SiteConfig::from_str(
            r#"
            [database]
            url = "postgres://nope"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dirs_join_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/srv/site"));

        assert_eq!(config.pages_dir(), PathBuf::from("/srv/site/pages"));
        assert_eq!(config.templates_dir(), PathBuf::from("/srv/site/templates"));
    }

    #[test]
    fn test_validate_rejects_bad_interface() {
        let mut config = SiteConfig::default();
        config.serve.interface = "localhost".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("interface")
        ));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = SiteConfig::default();
        config.serve.workers = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let serialized = toml::to_string_pretty(&SiteConfig::default()).unwrap();
        let parsed = SiteConfig::from_str(&serialized).unwrap();

        assert_eq!(parsed.serve.port, SiteConfig::default().serve.port);
        assert_eq!(parsed.base.title, SiteConfig::default().base.title);
    }
}
