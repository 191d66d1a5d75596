use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    background::decode::BackgroundImage,
    background::loader::BackgroundLoader,
    foundation::error::{BackdropError, BackdropResult},
};

/// Holds at most one virtual background and swaps it atomically.
///
/// A failed load leaves the current background in place. Readers take an `Arc`
/// snapshot, so a frame in flight keeps the background it started with.
///
/// Every change bumps a generation counter. A load only installs its image if no
/// other change (a later `set`, `install` or `clear`) happened while it was loading,
/// so the most recent call always wins.
pub struct BackgroundStore {
    loader: Arc<dyn BackgroundLoader>,
    current: RwLock<Option<Arc<BackgroundImage>>>,
    // Only written while holding the `current` write lock.
    generation: AtomicU64,
}

impl std::fmt::Debug for BackgroundStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundStore")
            .field(
                "current",
                &self.snapshot().map(|bg| bg.reference().to_string()),
            )
            .finish()
    }
}

impl BackgroundStore {
    /// Store resolving references through `loader`.
    pub fn new(loader: Arc<dyn BackgroundLoader>) -> Self {
        Self {
            loader,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Load `reference` and make it current, or clear the background on `None`.
    ///
    /// Returns only after the new image is decoded and installed. If the store changed
    /// while the image was loading, the newer state is kept and the loaded image is
    /// discarded.
    #[tracing::instrument(skip(self))]
    pub fn set(&self, reference: Option<&str>) -> BackdropResult<()> {
        let Some(reference) = reference else {
            self.clear();
            return Ok(());
        };

        let ticket = self.begin_change();
        let image = self.load(reference).map_err(|e| {
            tracing::warn!(error = %e, "background load failed; keeping previous background");
            e
        })?;

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::Acquire) != ticket {
            tracing::debug!("background load superseded by a newer change");
            return Ok(());
        }
        tracing::debug!(size = %image.size(), "background installed");
        *current = Some(Arc::new(image));
        Ok(())
    }

    /// Install an already-decoded background (or clear on `None`).
    ///
    /// Supersedes any `set` still loading.
    pub fn install(&self, image: Option<BackgroundImage>) {
        let next = image.map(Arc::new);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        *current = next;
    }

    /// Drop the current background; the pipeline falls back to blurring.
    pub fn clear(&self) {
        self.install(None);
    }

    /// The background current at this instant.
    pub fn snapshot(&self) -> Option<Arc<BackgroundImage>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `true` when a background is installed.
    pub fn is_set(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn begin_change(&self) -> u64 {
        let _current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn load(&self, reference: &str) -> BackdropResult<BackgroundImage> {
        let bytes = self.loader.load_bytes(reference).map_err(|e| {
            BackdropError::background_load(format!("fetch '{reference}': {e}"))
        })?;
        BackgroundImage::decode(reference, &bytes).map_err(|e| {
            BackdropError::background_load(format!("decode '{reference}': {e:#}"))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/background/store.rs"]
mod tests;
