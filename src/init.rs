//! Site initialization module.
//!
//! Creates a new site structure: the pages directory, a template
//! directory seeded with the default template set, and a default
//! configuration file.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Default config filename
const CONFIG_FILE: &str = "inklet.toml";

/// Default templates embedded in the binary, written out on init.
///
/// `layout` wraps the `home` and `404` partials; `view` and `edit` are
/// the standalone page shells.
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("embed/templates/layout.html")),
    ("home.html", include_str!("embed/templates/home.html")),
    ("404.html", include_str!("embed/templates/404.html")),
    ("view.html", include_str!("embed/templates/view.html")),
    ("edit.html", include_str!("embed/templates/edit.html")),
];

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.root();

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `inklet init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(config)?;
    init_default_templates(config)?;
    init_default_config(root)?;

    log!("init"; "site scaffolded at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Create the pages and templates directories
fn init_site_structure(config: &SiteConfig) -> Result<()> {
    for path in [config.pages_dir(), config.templates_dir()] {
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write the embedded default templates into the template directory
fn init_default_templates(config: &SiteConfig) -> Result<()> {
    let dir = config.templates_dir();
    for (name, content) in DEFAULT_TEMPLATES {
        let path = dir.join(name);
        if path.exists() {
            bail!("Template `{}` already exists.", path.display());
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        bail!("Config file `{}` already exists.", path.display());
    }
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateSet;
    use tempfile::TempDir;

    fn config_at(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.set_root(root);
        config
    }

    #[test]
    fn test_new_site_scaffolds_structure() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());

        new_site(&config, true).unwrap();

        assert!(dir.path().join("pages").is_dir());
        assert!(dir.path().join("templates/layout.html").is_file());
        assert!(dir.path().join("templates/edit.html").is_file());
        assert!(dir.path().join("inklet.toml").is_file());
    }

    #[test]
    fn test_scaffolded_config_parses() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        new_site(&config, true).unwrap();

        let loaded = SiteConfig::from_path(&dir.path().join("inklet.toml")).unwrap();
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_scaffolded_templates_load() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        new_site(&config, true).unwrap();

        let set = TemplateSet::load_dir(&config.templates_dir()).unwrap();
        assert_eq!(set.partial_names(), ["404", "edit", "home", "view"]);
        assert!(set.render_named("home").unwrap().contains("/create"));
    }

    #[test]
    fn test_init_refuses_nonempty_unnamed_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("existing.txt"), "x").unwrap();
        let config = config_at(dir.path());

        assert!(new_site(&config, false).is_err());
    }

    #[test]
    fn test_init_refuses_existing_config() {
        let dir = TempDir::new().unwrap();
        let config = config_at(dir.path());
        new_site(&config, true).unwrap();

        // Re-running over the same root must not clobber anything
        assert!(new_site(&config, true).is_err());
    }
}
