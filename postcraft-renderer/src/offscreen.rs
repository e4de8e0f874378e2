//! Off-screen render root.
//!
//! Holds at most one rendered post at a time while it is captured. Mounting
//! returns a [`MountedRoot`] guard; dropping the guard unmounts, so cleanup
//! runs on success, error and early return alike.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use postcraft_core::PostId;
use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::static_render::StaticDocument;

#[derive(Debug, Default)]
struct RootState {
    mounted: Option<PostId>,
    mounts: usize,
    unmounts: usize,
}

/// Detached container for rendering posts before capture.
#[derive(Debug, Clone, Default)]
pub struct OffscreenRoot {
    state: Arc<Mutex<RootState>>,
}

impl OffscreenRoot {
    /// Create an empty root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RootState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mount a rendered post.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AlreadyMounted`] if another post is mounted.
    pub fn mount(&self, post_id: &PostId, document: StaticDocument) -> RenderResult<MountedRoot> {
        let mut state = self.lock();
        if state.mounted.is_some() {
            return Err(RenderError::AlreadyMounted);
        }
        state.mounted = Some(post_id.clone());
        state.mounts += 1;
        debug!(post = %post_id, "mounted off-screen root");
        Ok(MountedRoot {
            root: self.clone(),
            document,
        })
    }

    fn unmount(&self) {
        let mut state = self.lock();
        if let Some(post_id) = state.mounted.take() {
            state.unmounts += 1;
            debug!(post = %post_id, "unmounted off-screen root");
        }
    }

    /// Whether a post is currently mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lock().mounted.is_some()
    }

    /// Id of the mounted post.
    #[must_use]
    pub fn mounted_post(&self) -> Option<PostId> {
        self.lock().mounted.clone()
    }

    /// Total mounts since creation.
    #[must_use]
    pub fn mount_count(&self) -> usize {
        self.lock().mounts
    }

    /// Total unmounts since creation.
    #[must_use]
    pub fn unmount_count(&self) -> usize {
        self.lock().unmounts
    }
}

/// A mounted post. Unmounts on drop.
#[derive(Debug)]
pub struct MountedRoot {
    root: OffscreenRoot,
    document: StaticDocument,
}

impl MountedRoot {
    /// The mounted document.
    #[must_use]
    pub fn document(&self) -> &StaticDocument {
        &self.document
    }
}

impl Drop for MountedRoot {
    fn drop(&mut self) {
        self.root.unmount();
    }
}
