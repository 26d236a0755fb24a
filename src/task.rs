//! Work-unit descriptors and a small dependency-aware executor. Each unit
//! names its input files and targets so the runner can skip work whose
//! outputs are already newer than every input, mirroring the contract the
//! host build graph expects: given these inputs, produce this output.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::customcss;
use crate::error::Result;
use crate::inject;
use crate::manager::Manager;

/// One schedulable unit of work.
#[derive(Debug)]
pub struct WorkUnit {
    /// Unique name within a phase (e.g. "merge:repl").
    pub name: String,
    /// Human-readable description.
    pub doc: String,
    /// Input files; the unit re-runs when any is newer than a target.
    pub file_dep: Vec<PathBuf>,
    /// Output files. A unit with no targets always runs.
    pub targets: Vec<PathBuf>,
    pub action: Action,
}

/// The transform a work unit performs. A closed set keeps the addon's
/// file logic in its own modules and the executor generic.
#[derive(Debug)]
pub enum Action {
    /// Copy one source file to one destination.
    Copy { src: PathBuf, dest: PathBuf },
    /// Merge root and app stylesheets into one destination.
    Merge {
        root: PathBuf,
        app: PathBuf,
        dest: PathBuf,
    },
    /// Inject the stylesheet link into one index document.
    Inject { index: PathBuf, css: PathBuf },
    /// Print a diagnostic line.
    Report { line: String },
}

/// Run units in order, skipping fresh ones. Returns how many executed.
pub fn run_units(manager: &Manager, units: &[WorkUnit]) -> Result<usize> {
    let mut executed = 0;
    for unit in units {
        if is_fresh(unit) {
            debug!("skip {} (targets up to date)", unit.name);
            continue;
        }
        debug!("run {} — {}", unit.name, unit.doc);
        match &unit.action {
            Action::Copy { src, dest } => manager.copy_one(src, dest)?,
            Action::Merge { root, app, dest } => customcss::merge_css(manager, root, app, dest)?,
            Action::Inject { index, css } => inject::inject_css_link(manager, index, css)?,
            Action::Report { line } => println!("    {line}"),
        }
        executed += 1;
    }
    Ok(executed)
}

/// A unit is fresh when it has targets, every target exists, and no file
/// dep is newer than the oldest target.
fn is_fresh(unit: &WorkUnit) -> bool {
    let mut oldest_target: Option<SystemTime> = None;
    for target in &unit.targets {
        let Some(modified) = mtime(target) else {
            return false;
        };
        oldest_target = Some(match oldest_target {
            Some(oldest) => oldest.min(modified),
            None => modified,
        });
    }
    let Some(oldest_target) = oldest_target else {
        return false;
    };
    unit.file_dep
        .iter()
        .all(|dep| mtime(dep).map(|m| m <= oldest_target).unwrap_or(false))
}

fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
