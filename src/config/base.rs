//! `[base]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in inklet.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "my pastebin"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title, available to anyone editing the scaffolded templates.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_title_override() {
        let config: SiteConfig = toml::from_str(
            r#"
            [base]
            title = "notes"
        "#,
        )
        .unwrap();
        assert_eq!(config.base.title, "notes");
    }

    #[test]
    fn test_base_title_default() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.base.title, "inklet");
    }
}
