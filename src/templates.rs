//! Template loading and composition.
//!
//! All templates live in one directory and are registered under the
//! base name before the first `.` of their file name (`home.html` and
//! `home.html.j2` both register as `home`). The file named `layout.*`
//! is the designated wrapper: it renders whichever partial the request
//! selects into its body slot via `{% include which_partial %}`.
//!
//! The set is parsed once at startup and is immutable afterwards, so it
//! can be shared read-only across request workers. Any unreadable or
//! unparseable template file is a startup error; the process never
//! serves traffic with a partial template set.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, context};
use thiserror::Error;

use crate::store::Page;

/// Registered name of the wrapper template.
const LAYOUT: &str = "layout";

/// Template loading and rendering errors.
///
/// Everything except `Render` can only occur in [`TemplateSet::load_dir`]
/// and aborts startup. `Render` happens per-request and is surfaced as a
/// server-error response by the caller.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template directory `{0}`")]
    Dir(PathBuf, #[source] std::io::Error),

    #[error("failed to read template `{0}`")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse template `{0}`")]
    Parse(String, #[source] minijinja::Error),

    #[error("no `layout.*` template in `{0}`")]
    MissingLayout(PathBuf),

    #[error("template rendering failed")]
    Render(#[from] minijinja::Error),
}

/// An immutable set of parsed templates: one layout plus named
/// partials and page shells.
#[derive(Debug)]
pub struct TemplateSet {
    env: Environment<'static>,
    partials: Vec<String>,
}

impl TemplateSet {
    /// Parse every file in `dir` into a template set.
    ///
    /// Hidden files (no base name before the first `.`) are skipped;
    /// subdirectories are not descended into. Fails if any template is
    /// unreadable or unparseable, or if no `layout.*` file exists.
    pub fn load_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        // Names carry no file extension, so escaping cannot be inferred
        // from them; everything rendered here is HTML.
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let mut partials = Vec::new();
        let mut layout_seen = false;

        let entries = fs::read_dir(dir).map_err(|e| TemplateError::Dir(dir.to_owned(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| TemplateError::Dir(dir.to_owned(), e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let base = file_name
                .to_string_lossy()
                .split('.')
                .next()
                .unwrap_or_default()
                .to_owned();
            if base.is_empty() {
                continue;
            }

            let source =
                fs::read_to_string(&path).map_err(|e| TemplateError::Read(path.clone(), e))?;
            env.add_template_owned(base.clone(), source)
                .map_err(|e| TemplateError::Parse(base.clone(), e))?;

            if base == LAYOUT {
                layout_seen = true;
            } else {
                partials.push(base);
            }
        }

        if !layout_seen {
            return Err(TemplateError::MissingLayout(dir.to_owned()));
        }

        partials.sort();
        Ok(Self { env, partials })
    }

    /// Render the layout around the partial registered as `name`.
    ///
    /// The layout gets a single contextual capability: `which_partial`,
    /// bound to `name`, which its include statement resolves. An
    /// unknown partial comes back as a render error for the caller to
    /// surface; it never takes the process down.
    pub fn render_named(&self, name: &str) -> Result<String, TemplateError> {
        let layout = self.env.get_template(LAYOUT)?;
        Ok(layout.render(context! { which_partial => name })?)
    }

    /// Render a page shell (`view` or `edit`) with the page as context.
    ///
    /// Shells are standalone documents, not wrapped in the layout.
    pub fn render_page(&self, shell: &str, page: &Page) -> Result<String, TemplateError> {
        let tmpl = self.env.get_template(shell)?;
        Ok(tmpl.render(context! {
            slug => &page.slug,
            body => page.body_text(),
        })?)
    }

    /// Names of every non-layout template, sorted.
    pub fn partial_names(&self) -> &[String] {
        &self.partials
    }
}
