//! Snapshot and restore of the dwelling state around hypothetical trials.
//!
//! Because every sub-record of [`DwellingState`] is reference counted, a
//! snapshot costs one `Arc` clone per sub-record and restoring it is a move.
//! [`Trial`] wraps the begin/mutate/abort sequence in a guard so the live
//! state is put back even when the trial body returns early with an error.

use super::state::DwellingState;

/// An isolated copy of the dwelling taken before a trial.
#[derive(Debug, Clone)]
pub struct Snapshot(DwellingState);

/// Captures the current value of `state`.
pub fn snapshot(state: &DwellingState) -> Snapshot {
    Snapshot(state.clone())
}

impl Snapshot {
    /// Replaces `live` with the captured value, discarding the live state.
    pub fn restore(self, live: &mut DwellingState) {
        *live = self.0;
    }

    /// The captured value.
    pub fn state(&self) -> &DwellingState {
        &self.0
    }
}

/// Scoped trial on the live dwelling.
///
/// Mutations made through [`Trial::state_mut`] are always undone: either by
/// [`Trial::rollback`], which also hands back the mutated value so a caller
/// can later commit it by assignment, or by `Drop` on any early exit.
pub struct Trial<'a> {
    live: &'a mut DwellingState,
    saved: Option<Snapshot>,
}

impl<'a> Trial<'a> {
    /// Snapshots `live` and opens a trial on it.
    pub fn begin(live: &'a mut DwellingState) -> Self {
        let saved = Some(snapshot(live));
        Self { live, saved }
    }

    pub fn state(&self) -> &DwellingState {
        &*self.live
    }

    pub fn state_mut(&mut self) -> &mut DwellingState {
        &mut *self.live
    }

    /// Restores the pre-trial state and returns the trial's post-state.
    pub fn rollback(mut self) -> DwellingState {
        let post = self.live.clone();
        if let Some(saved) = self.saved.take() {
            saved.restore(&mut *self.live);
        }
        post
    }
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            saved.restore(&mut *self.live);
        }
    }
}
