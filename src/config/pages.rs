//! `[pages]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[pages]` section in inklet.toml - page storage settings.
///
/// # Example
/// ```toml
/// [pages]
/// dir = "pages"   # one <slug>.txt file per page
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PagesConfig {
    /// Directory page files live in, relative to the project root.
    #[serde(default = "defaults::pages::dir")]
    #[educe(Default = defaults::pages::dir())]
    pub dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_pages_dir_override() {
        let config: SiteConfig = toml::from_str(
            r#"
            [pages]
            dir = "var/pages"
        "#,
        )
        .unwrap();
        assert_eq!(config.pages.dir, PathBuf::from("var/pages"));
    }

    #[test]
    fn test_pages_unknown_field_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
            [pages]
            extension = "md"
        "#,
        );
        assert!(result.is_err());
    }
}
