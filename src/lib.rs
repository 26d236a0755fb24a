//! litecss — custom stylesheet addon for static-site builds.
//!
//! Authors drop a `custom.css` at the site input root (and optionally a
//! `<app>/custom.css` per app) to restyle the generated pages. The addon
//! runs in three phases: `status` reports what was found, `build` copies
//! and merges stylesheets into the output tree, and `post_build` injects
//! a cache-busted `<link>` into every generated `index.html`.

pub mod config;
pub mod customcss;
pub mod error;
pub mod inject;
pub mod manager;
pub mod task;

pub use error::{BuildError, Result};
pub use manager::Manager;

/// `status` phase: print and return the number of discovered sources.
pub fn run_status(manager: &Manager) -> Result<usize> {
    let units = customcss::status_units(manager);
    task::run_units(manager, &units)?;
    let found = customcss::discover(manager)
        .into_iter()
        .filter(|(_, present)| *present)
        .count();
    Ok(found)
}

/// `build` phase: copy/merge stylesheets. Returns executed unit count.
pub fn run_build(manager: &Manager) -> Result<usize> {
    let units = customcss::build_units(manager);
    task::run_units(manager, &units)
}

/// `post_build` phase: inject links into index documents.
/// Returns executed unit count.
pub fn run_post_build(manager: &Manager) -> Result<usize> {
    let units = customcss::post_build_units(manager)?;
    task::run_units(manager, &units)
}

/// A whole build: copy/merge, then injection.
pub fn run_full_build(manager: &Manager) -> Result<usize> {
    let built = run_build(manager)?;
    let injected = run_post_build(manager)?;
    Ok(built + injected)
}
