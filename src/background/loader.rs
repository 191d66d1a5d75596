use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::foundation::error::{BackdropError, BackdropResult};

/// Resolves a background reference to encoded image bytes.
pub trait BackgroundLoader: Send + Sync {
    /// Fetch the bytes behind `reference`.
    fn load_bytes(&self, reference: &str) -> BackdropResult<Vec<u8>>;
}

/// Loads backgrounds from files below a root directory.
#[derive(Clone, Debug)]
pub struct FsBackgroundLoader {
    root: PathBuf,
}

impl FsBackgroundLoader {
    /// Loader resolving references relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory used for relative references.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BackgroundLoader for FsBackgroundLoader {
    fn load_bytes(&self, reference: &str) -> BackdropResult<Vec<u8>> {
        let rel = normalize_background_ref(reference)?;
        let path = self.root.join(Path::new(&rel));
        std::fs::read(&path)
            .with_context(|| format!("read background bytes from '{}'", path.display()))
            .map_err(BackdropError::from)
    }
}

/// Serves backgrounds from an in-memory table, e.g. bundled presets.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackgroundLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryBackgroundLoader {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `reference`, replacing any previous entry.
    pub fn insert(&mut self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(reference.into(), bytes);
    }

    /// Builder form of [`MemoryBackgroundLoader::insert`].
    pub fn with(mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl BackgroundLoader for MemoryBackgroundLoader {
    fn load_bytes(&self, reference: &str) -> BackdropResult<Vec<u8>> {
        self.entries.get(reference).cloned().ok_or_else(|| {
            BackdropError::background_load(format!("unknown background '{reference}'"))
        })
    }
}

/// Turn a background reference into a clean path relative to the loader root.
///
/// Separators are unified to `/` and `.` / empty segments are dropped. URLs
/// (`https://...`, `data:`, `blob:`), absolute and drive-qualified paths, and any `..`
/// segment are rejected, so a reference can never leave the root.
pub fn normalize_background_ref(reference: &str) -> BackdropResult<String> {
    let unified = reference.trim().replace('\\', "/");
    let reject = |why: &str| {
        Err(BackdropError::background_load(format!(
            "background reference '{reference}' {why}"
        )))
    };

    if unified.contains("://") || has_scheme_prefix(&unified) {
        return reject("is a URL; only files below the background root are supported");
    }
    if unified.starts_with('/') {
        return reject("is absolute");
    }

    let segments: Vec<&str> = unified
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();
    if segments.contains(&"..") {
        return reject("escapes the background root");
    }
    match segments.last() {
        Some(_) => Ok(segments.join("/")),
        None => reject("names no file"),
    }
}

// `data:...`, `blob:...` and Windows drive letters (`C:`) all look like a scheme.
fn has_scheme_prefix(s: &str) -> bool {
    let Some((head, _)) = s.split_once(':') else {
        return false;
    };
    !head.is_empty()
        && !head.contains('/')
        && head.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
}

#[cfg(test)]
#[path = "../../tests/unit/background/loader.rs"]
mod tests;
