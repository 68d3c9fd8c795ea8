//! `[templates]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[templates]` section in inklet.toml - template directory settings.
///
/// The directory must contain exactly one `layout.*` file; every other
/// file registers under its base name.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Directory templates are read from, relative to the project root.
    #[serde(default = "defaults::templates::dir")]
    #[educe(Default = defaults::templates::dir())]
    pub dir: PathBuf,
}
