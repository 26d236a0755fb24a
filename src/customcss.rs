//! The custom.css addon — discovery, copy/merge, and link-injection
//! planning. Each phase returns a list of work units for the executor;
//! the functions here stay pure path/byte transforms with no scheduling
//! of their own.
//!
//! Policy: a root `custom.css` applies site-wide; a per-app
//! `<app>/custom.css` is merged after the root content so app rules win
//! on cascade while inheriting the common base.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::manager::Manager;
use crate::task::{Action, WorkUnit};

/// Fixed filename for custom stylesheet sources and destinations.
pub const CUSTOM_CSS: &str = "custom.css";

/// Filename of the HTML entry point the link is injected into.
pub const INDEX_HTML: &str = "index.html";

/// Separator written between root and app content in a merged stylesheet.
pub const MERGE_SEPARATOR: &str = "/* App-specific overrides */";

/// Which stylesheet a source, destination, or index document belongs to.
///
/// The root scope is a real variant rather than a null app name so that
/// fallback resolution stays exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CssScope {
    /// The site-wide stylesheet at the output root.
    Root,
    /// A named app's stylesheet (e.g. "lab", "repl").
    App(String),
}

impl CssScope {
    pub fn app(name: impl Into<String>) -> Self {
        Self::App(name.into())
    }
}

impl fmt::Display for CssScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::App(name) => write!(f, "{name}"),
        }
    }
}

/// Source path for a scope's custom.css under the input root.
pub fn source_path(manager: &Manager, scope: &CssScope) -> PathBuf {
    match scope {
        CssScope::Root => manager.lite_dir.join(CUSTOM_CSS),
        CssScope::App(name) => manager.lite_dir.join(name).join(CUSTOM_CSS),
    }
}

/// Destination path for a scope's custom.css under the output root.
pub fn dest_path(manager: &Manager, scope: &CssScope) -> PathBuf {
    let base = match scope {
        CssScope::Root => manager.output_dir.clone(),
        CssScope::App(name) => manager.output_dir.join(name),
    };
    base.join("static").join(CUSTOM_CSS)
}

/// Root scope first, then apps in declaration order.
pub fn all_scopes(manager: &Manager) -> Vec<CssScope> {
    let mut scopes = vec![CssScope::Root];
    scopes.extend(manager.apps.iter().map(CssScope::app));
    scopes
}

/// Which scopes have a custom.css source under the input root.
/// Pure filesystem reads, no side effects.
pub fn discover(manager: &Manager) -> Vec<(CssScope, bool)> {
    all_scopes(manager)
        .into_iter()
        .map(|scope| {
            let present = source_path(manager, &scope).exists();
            (scope, present)
        })
        .collect()
}

/// The scope owning an index document, from its first path component
/// relative to the output root. A root-level document is root scope.
pub fn scope_for_index(output_dir: &Path, index_file: &Path) -> CssScope {
    let Ok(rel) = index_file.strip_prefix(output_dir) else {
        return CssScope::Root;
    };
    let mut components = rel.components();
    let first = components.next();
    match (first, components.next()) {
        // Something under at least one directory: that directory names the app.
        (Some(app), Some(_)) => CssScope::app(app.as_os_str().to_string_lossy()),
        _ => CssScope::Root,
    }
}

/// `status` phase: one diagnostic unit reporting the discovered source count.
pub fn status_units(manager: &Manager) -> Vec<WorkUnit> {
    let found = discover(manager)
        .into_iter()
        .filter(|(_, present)| *present)
        .count();
    vec![WorkUnit {
        name: format!("status:{CUSTOM_CSS}"),
        doc: format!("report {CUSTOM_CSS} sources"),
        file_dep: Vec::new(),
        targets: Vec::new(),
        action: Action::Report {
            line: format!("{CUSTOM_CSS}: {found}"),
        },
    }]
}

/// `build` phase: copy the root stylesheet and copy or merge each app's.
pub fn build_units(manager: &Manager) -> Vec<WorkUnit> {
    let root_src = source_path(manager, &CssScope::Root);
    let has_root = root_src.exists();
    let mut units = Vec::new();

    if has_root {
        let dest = dest_path(manager, &CssScope::Root);
        units.push(WorkUnit {
            name: "copy:root".to_string(),
            doc: format!("copy {CUSTOM_CSS} to output"),
            file_dep: vec![root_src.clone()],
            targets: vec![dest.clone()],
            action: Action::Copy {
                src: root_src.clone(),
                dest,
            },
        });
    }

    for app in &manager.apps {
        let scope = CssScope::app(app.clone());
        let app_src = source_path(manager, &scope);
        if !app_src.exists() {
            continue;
        }
        let dest = dest_path(manager, &scope);

        if has_root {
            units.push(WorkUnit {
                name: format!("merge:{app}"),
                doc: format!("merge root and {app} {CUSTOM_CSS}"),
                file_dep: vec![root_src.clone(), app_src.clone()],
                targets: vec![dest.clone()],
                action: Action::Merge {
                    root: root_src.clone(),
                    app: app_src,
                    dest,
                },
            });
        } else {
            units.push(WorkUnit {
                name: format!("copy:{app}"),
                doc: format!("copy {app} {CUSTOM_CSS} to output"),
                file_dep: vec![app_src.clone()],
                targets: vec![dest.clone()],
                action: Action::Copy {
                    src: app_src,
                    dest,
                },
            });
        }
    }

    units
}

/// `post_build` phase: one injection unit per index document that has an
/// applicable destination (its own scope's, else the root's). Documents
/// with no applicable destination are skipped silently.
pub fn post_build_units(manager: &Manager) -> Result<Vec<WorkUnit>> {
    let scopes_with_css: Vec<CssScope> = all_scopes(manager)
        .into_iter()
        .filter(|scope| dest_path(manager, scope).exists())
        .collect();
    if scopes_with_css.is_empty() {
        return Ok(Vec::new());
    }

    let mut units = Vec::new();
    for index_file in find_index_files(&manager.output_dir)? {
        let own = scope_for_index(&manager.output_dir, &index_file);
        let resolved = if scopes_with_css.contains(&own) {
            own
        } else if scopes_with_css.contains(&CssScope::Root) {
            CssScope::Root
        } else {
            continue;
        };

        let css_dest = dest_path(manager, &resolved);
        let rel = index_file
            .strip_prefix(&manager.output_dir)
            .unwrap_or(&index_file)
            .display()
            .to_string();
        units.push(WorkUnit {
            name: format!("inject:{rel}"),
            doc: format!("inject {CUSTOM_CSS} link into {rel}"),
            file_dep: vec![css_dest.clone(), index_file.clone()],
            targets: Vec::new(),
            action: Action::Inject {
                index: index_file,
                css: css_dest,
            },
        });
    }
    Ok(units)
}

/// Merge root and app stylesheets into one destination file.
/// Root content first, so app rules win on cascade.
pub fn merge_css(manager: &Manager, root_src: &Path, app_src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::create_dir(parent, e))?;
    }

    let root_content =
        fs::read_to_string(root_src).map_err(|e| BuildError::read(root_src, e))?;
    let app_content = fs::read_to_string(app_src).map_err(|e| BuildError::read(app_src, e))?;

    let merged = merged_content(&root_content, &app_content);
    fs::write(dest, merged).map_err(|e| BuildError::write(dest, e))?;
    manager.maybe_timestamp(dest)
}

/// The merged stylesheet text: root, separator comment, app.
pub fn merged_content(root: &str, app: &str) -> String {
    format!("{root}\n{MERGE_SEPARATOR}\n{app}")
}

/// All `index.html` files under the output root, lexicographically sorted
/// for deterministic injection order.
pub fn find_index_files(output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if output_dir.is_dir() {
        walk_indexes(output_dir, &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn walk_indexes(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::walk(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::walk(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            walk_indexes(&path, found)?;
        } else if path.file_name().map(|n| n == INDEX_HTML).unwrap_or(false) {
            found.push(path);
        }
    }
    Ok(())
}
