//! Sticky first-error status shared between a producer and its workers.

use std::sync::Mutex;

use crate::error::{Error, Result};

/// Internal status of a codec run.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// No failure observed.
    Ok,
    /// A low-level operation failed but no specific code was assigned yet.
    Transient,
    /// A specific failure was recorded; later failures are dropped.
    Failed(Error),
}

/// Sticky first-error cell.
///
/// Workers race to report failures; the first specific error wins and
/// every later transition is a no-op. Permitted transitions:
///
/// - `Ok -> Transient` (a read or write fell short)
/// - `Ok -> Failed`, `Transient -> Failed` (a specific code upgrades
///   the transient marker)
/// - `Transient -> Ok` (clean end-of-stream resolves a failed magic
///   read, see [`resolve_transient`](StatusCell::resolve_transient))
#[derive(Debug)]
pub struct StatusCell {
    state: Mutex<State>,
}

impl StatusCell {
    /// Create a cell in the `Ok` state.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Ok),
        }
    }

    /// Record a specific error. Returns the winning error: the one just
    /// recorded, or the one that was already stored.
    pub fn record(&self, err: Error) -> Error {
        let mut state = self.state.lock().unwrap();
        match &*state {
            State::Ok | State::Transient => {
                *state = State::Failed(err.clone());
                err
            }
            State::Failed(stored) => stored.clone(),
        }
    }

    /// Mark a low-level failure without assigning a specific code yet.
    pub fn mark_transient(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == State::Ok {
            *state = State::Transient;
        }
    }

    /// Resolve a transient marker back to `Ok`.
    ///
    /// Used when a failed read turns out to be a clean end of stream.
    /// A recorded specific error is left untouched.
    pub fn resolve_transient(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == State::Transient {
            *state = State::Ok;
        }
    }

    /// Whether any failure (transient or specific) has been observed.
    pub fn is_err(&self) -> bool {
        *self.state.lock().unwrap() != State::Ok
    }

    /// Snapshot the cell as a `Result`.
    ///
    /// A transient marker that was never upgraded surfaces as
    /// [`Error::Failed`].
    pub fn snapshot(&self) -> Result<()> {
        match &*self.state.lock().unwrap() {
            State::Ok => Ok(()),
            State::Transient => Err(Error::Failed),
            State::Failed(err) => Err(err.clone()),
        }
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
