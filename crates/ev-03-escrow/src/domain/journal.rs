//! # Transaction Journal
//!
//! Effects outside the ledger (escrow state, published events) that must
//! share the fate of the ledger transaction they ran in.
//!
//! One journal per ledger. Frames nest exactly like ledger snapshots:
//! - `begin` opens a frame
//! - `commit` folds the closing frame into its parent, or runs its publish
//!   effects when no parent is left
//! - `rollback` drops the frame's publish effects and runs its undo effects
//!   newest first
//!
//! Top-level transactions are serialized through [`TransactionJournal::serialize`].
//! The lock is re-entrant so a call chain that re-enters the ledger on the
//! same thread keeps working.

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

/// A deferred side effect.
pub type Effect = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Frame {
    undo: Vec<Effect>,
    publish: Vec<Effect>,
}

/// Frame stack shared by every participant of one ledger.
pub struct TransactionJournal {
    serial: ReentrantMutex<()>,
    frames: Mutex<Vec<Frame>>,
}

impl std::fmt::Debug for TransactionJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionJournal")
            .field("depth", &self.depth())
            .finish()
    }
}

impl Default for TransactionJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionJournal {
    pub fn new() -> Self {
        Self {
            serial: ReentrantMutex::new(()),
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Blocks other threads until the returned guard drops.
    pub fn serialize(&self) -> ReentrantMutexGuard<'_, ()> {
        self.serial.lock()
    }

    pub fn begin(&self) {
        self.frames.lock().push(Frame::default());
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    /// Closes the innermost frame successfully. `undo` and `publish` belong
    /// to the transaction being closed.
    pub fn commit(&self, undo: Option<Effect>, publish: Option<Effect>) {
        let ready = {
            let mut frames = self.frames.lock();
            let Some(mut frame) = frames.pop() else {
                return;
            };
            frame.undo.extend(undo);
            frame.publish.extend(publish);
            match frames.last_mut() {
                Some(parent) => {
                    parent.undo.append(&mut frame.undo);
                    parent.publish.append(&mut frame.publish);
                    Vec::new()
                }
                None => frame.publish,
            }
        };

        for effect in ready {
            effect();
        }
    }

    /// Closes the innermost frame, undoing everything committed inside it.
    pub fn rollback(&self) {
        let undo = self
            .frames
            .lock()
            .pop()
            .map(|frame| frame.undo)
            .unwrap_or_default();

        for effect in undo.into_iter().rev() {
            effect();
        }
    }
}
