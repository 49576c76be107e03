//! Hand-off of scene frames built off the interactive thread.
//!
//! Each document edit takes an [`EditTicket`] from the [`FrameSlot`] before
//! its rebuild starts. The rebuild renders into its own
//! [`Canvas`](crate::canvas::Canvas) (usually sharing a
//! [`SharedFragmentCache`](crate::fragment::SharedFragmentCache)) and
//! publishes the resulting [`SceneFrame`] with that ticket. The foreground
//! only ever reads the frame of the newest committed edit; a slower rebuild
//! that finishes after a newer one is dropped.
//!
//! Tickets order edits across canvases. A canvas's own generation only
//! orders pushes within that canvas.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::backend::SceneFrame;

/// Position of a document edit in the order edits were started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditTicket(u64);

impl EditTicket {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Committed {
    edit: EditTicket,
    frame: Arc<SceneFrame>,
}

#[derive(Debug, Default)]
pub struct FrameSlot {
    next_edit: AtomicU64,
    latest: Mutex<Option<Committed>>,
}

impl FrameSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for an edit about to be rebuilt. Later calls get later tickets.
    pub fn begin_edit(&self) -> EditTicket {
        EditTicket(self.next_edit.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Store the frame built for `edit` unless a frame of the same or a
    /// later edit is already there. Returns whether it was stored.
    pub fn publish(&self, edit: EditTicket, frame: SceneFrame) -> bool {
        let mut latest = self.latest.lock();
        if let Some(current) = latest.as_ref() {
            if current.edit >= edit {
                warn!(stale = edit.0, current = current.edit.0, "dropping superseded frame");
                return false;
            }
        }
        debug!(edit = edit.0, generation = frame.generation, triangles = frame.triangle_count(), "frame published");
        *latest = Some(Committed { edit, frame: Arc::new(frame) });
        true
    }

    /// Frame of the newest committed edit.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<SceneFrame>> {
        self.latest.lock().as_ref().map(|c| Arc::clone(&c.frame))
    }

    /// Newest committed edit, `None` before the first publication.
    #[must_use]
    pub fn committed_edit(&self) -> Option<EditTicket> {
        self.latest.lock().as_ref().map(|c| c.edit)
    }
}
