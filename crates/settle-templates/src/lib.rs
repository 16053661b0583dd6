//! Template registry for settle.
//!
//! Holds the parsed template set as an immutable snapshot that can be swapped
//! atomically on reload. Request handlers render from whatever snapshot is
//! current; a reload builds a complete new set first and only then publishes it.
//!
//! # Thread Safety
//!
//! [`TemplateRegistry`] is designed for concurrent access:
//! - `snapshot()` returns `Arc<TemplateSet>` with minimal locking (just Arc clone)
//! - `reload()` is serialized by an internal mutex, so there is one writer at a time
//! - a failed reload leaves the previous snapshot in place
//!
//! # Example
//!
//! ```ignore
//! use settle_templates::TemplateRegistry;
//!
//! let registry = TemplateRegistry::from_dir("templates", "*.html")?;
//! let html = registry.render("base.html", minijinja::context! { live_reload => true })?;
//! registry.reload()?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use glob::{MatchOptions, Pattern};
use minijinja::Environment;
use serde::Serialize;

/// Templates compiled into the binary, used outside local mode.
const EMBEDDED: &[(&str, &str)] = &[("base.html", include_str!("../templates/base.html"))];

/// Shell-style matching: wildcards do not cross `/`.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Where templates are read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateSource {
    /// Templates compiled into the binary.
    Embedded,
    /// Files under a directory whose relative paths match a glob pattern.
    Directory {
        /// Template directory.
        dir: PathBuf,
        /// Glob matched against paths relative to `dir` (e.g., `*.html`,
        /// `**/*.html`).
        pattern: String,
    },
}

/// Error returned by template loading and rendering.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template directory or file could not be read.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Template file pattern is not a valid glob.
    #[error("Invalid template pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    /// Directory holds no matching templates.
    #[error("No templates matching {pattern:?} in {}", dir.display())]
    Empty {
        /// Template directory.
        dir: PathBuf,
        /// Pattern that matched nothing.
        pattern: String,
    },
    /// Template source failed to parse.
    #[error("Template {name} failed to parse: {source}")]
    Parse {
        /// Template name.
        name: String,
        #[source]
        source: minijinja::Error,
    },
    /// No template with this name in the current snapshot.
    #[error("Template not found: {0}")]
    NotFound(String),
    /// Template failed while rendering.
    #[error("Template {name} failed to render: {source}")]
    Render {
        /// Template name.
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// One parsed, immutable generation of the template set.
pub struct TemplateSet {
    env: Environment<'static>,
    names: Vec<String>,
    generation: u64,
}

impl TemplateSet {
    /// Render template `name` with `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] for an unknown name and
    /// [`TemplateError::Render`] if rendering fails.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, TemplateError> {
        let template = self.env.get_template(name).map_err(|source| {
            if source.kind() == minijinja::ErrorKind::TemplateNotFound {
                TemplateError::NotFound(name.to_owned())
            } else {
                TemplateError::Render {
                    name: name.to_owned(),
                    source,
                }
            }
        })?;

        template.render(ctx).map_err(|source| TemplateError::Render {
            name: name.to_owned(),
            source,
        })
    }

    /// Template names in this set, sorted.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Reload generation that produced this set (0 for the initial load).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn build(sources: Vec<(String, String)>, generation: u64) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        let mut names = Vec::with_capacity(sources.len());

        for (name, source) in sources {
            env.add_template_owned(name.clone(), source)
                .map_err(|source| TemplateError::Parse {
                    name: name.clone(),
                    source,
                })?;
            names.push(name);
        }
        names.sort();

        Ok(Self {
            env,
            names,
            generation,
        })
    }
}

/// Shared registry of parsed templates.
///
/// Uses internal `RwLock<Arc<TemplateSet>>` for the current snapshot and a
/// `Mutex<u64>` (holding the generation counter) to serialize reloads.
pub struct TemplateRegistry {
    source: TemplateSource,
    reload_lock: Mutex<u64>,
    current: RwLock<Arc<TemplateSet>>,
}

impl TemplateRegistry {
    /// Create a registry and load the initial template set.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial set cannot be read or parsed.
    pub fn new(source: TemplateSource) -> Result<Self, TemplateError> {
        let initial = load(&source, 0)?;
        tracing::debug!(templates = ?initial.names(), "Loaded templates");

        Ok(Self {
            source,
            reload_lock: Mutex::new(0),
            current: RwLock::new(Arc::new(initial)),
        })
    }

    /// Registry over the templates compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded template fails to parse.
    pub fn embedded() -> Result<Self, TemplateError> {
        Self::new(TemplateSource::Embedded)
    }

    /// Registry over the files in `dir` matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, holds no matching
    /// templates, or a template fails to parse.
    pub fn from_dir(dir: impl Into<PathBuf>, pattern: &str) -> Result<Self, TemplateError> {
        Self::new(TemplateSource::Directory {
            dir: dir.into(),
            pattern: pattern.to_owned(),
        })
    }

    /// Where this registry reads templates from.
    #[must_use]
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Get the current template set.
    ///
    /// The returned snapshot stays valid and unchanged even if a reload
    /// publishes a newer one while it is in use.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TemplateSet> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Re-read and re-parse every template, then publish the new set.
    ///
    /// On failure the previous snapshot stays current.
    ///
    /// # Errors
    ///
    /// Returns an error if any template cannot be read or parsed.
    pub fn reload(&self) -> Result<Arc<TemplateSet>, TemplateError> {
        let mut generation = self
            .reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let set = Arc::new(load(&self.source, *generation + 1)?);
        *generation += 1;

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&set);
        tracing::info!(
            generation = set.generation(),
            templates = set.names().len(),
            "Templates reloaded"
        );

        Ok(set)
    }

    /// Render `name` from the current snapshot.
    ///
    /// # Errors
    ///
    /// See [`TemplateSet::render`].
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, TemplateError> {
        self.snapshot().render(name, ctx)
    }
}

/// Read and parse a full template set from `source`.
fn load(source: &TemplateSource, generation: u64) -> Result<TemplateSet, TemplateError> {
    let sources = match source {
        TemplateSource::Embedded => EMBEDDED
            .iter()
            .map(|(name, body)| ((*name).to_owned(), (*body).to_owned()))
            .collect(),
        TemplateSource::Directory { dir, pattern } => read_dir_sources(dir, pattern)?,
    };

    TemplateSet::build(sources, generation)
}

/// Read every file under `dir` whose relative path matches `pattern`.
///
/// `*` stays within one directory and `**/` crosses directories, so `*.html`
/// loads only the top level. Nested templates are named by their relative
/// path with `/` separators (e.g., `partials/nav.html`).
fn read_dir_sources(dir: &Path, pattern: &str) -> Result<Vec<(String, String)>, TemplateError> {
    let glob = Pattern::new(pattern)?;

    let mut sources = Vec::new();
    collect_sources(dir, dir, &glob, &mut sources)?;

    if sources.is_empty() {
        return Err(TemplateError::Empty {
            dir: dir.to_path_buf(),
            pattern: pattern.to_owned(),
        });
    }

    Ok(sources)
}

fn collect_sources(
    root: &Path,
    dir: &Path,
    glob: &Pattern,
    sources: &mut Vec<(String, String)>,
) -> Result<(), TemplateError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();

        // Symlinked directories are not followed
        if entry.file_type().map_err(io_error(&path))?.is_dir() {
            collect_sources(root, &path, glob, sources)?;
            continue;
        }
        if !path.is_file() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if !glob.matches_path_with(relative, MATCH_OPTIONS) {
            continue;
        }
        let name = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let body = fs::read_to_string(&path).map_err(io_error(&path))?;
        sources.push((name, body));
    }

    Ok(())
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TemplateError {
    let path = path.to_path_buf();
    move |source| TemplateError::Io { path, source }
}
