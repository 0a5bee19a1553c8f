//! Request fencing for overlapping loads.
//!
//! Every load takes a ticket with a monotonically increasing number. When a
//! load resolves, only the holder of the newest ticket may commit its result;
//! older responses are discarded no matter when they arrive.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// What happened to the result of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result was committed to the view model.
    Applied,
    /// No identity was available, so no request was made.
    Deferred,
    /// A newer load was started before this one resolved; its result was discarded.
    Superseded,
    /// The view was deactivated; the result was discarded.
    Inactive,
}

/// A claim on committing the result of one load.
///
/// The load counts as in flight until the ticket is dropped, so a load whose
/// future is cancelled (e.g. by a timeout) stops counting as loading.
#[derive(Debug)]
pub(crate) struct LoadTicket {
    number: u64,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Tracks in-flight loads and whether the owning view is still active.
#[derive(Debug)]
pub(crate) struct LoadFence {
    latest: u64,
    in_flight: Arc<AtomicUsize>,
    active: bool,
}

impl Default for LoadFence {
    fn default() -> Self {
        Self {
            latest: 0,
            in_flight: Arc::new(AtomicUsize::new(0)),
            active: true,
        }
    }
}

impl LoadFence {
    /// Start a load, superseding any load in flight.
    ///
    /// Returns `None` once the view has been deactivated.
    pub(crate) fn begin(&mut self) -> Option<LoadTicket> {
        if !self.active {
            return None;
        }

        self.latest += 1;
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        Some(LoadTicket {
            number: self.latest,
            in_flight: self.in_flight.clone(),
        })
    }

    /// Finish the load holding `ticket`.
    ///
    /// Returns [LoadOutcome::Applied] if the caller may commit its result.
    pub(crate) fn finish(&self, ticket: LoadTicket) -> LoadOutcome {
        if !self.active {
            LoadOutcome::Inactive
        } else if ticket.number != self.latest {
            LoadOutcome::Superseded
        } else {
            LoadOutcome::Applied
        }
    }

    /// Whether at least one load is in flight.
    pub(crate) fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Whether results may still be committed.
    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    /// Stop accepting results, e.g. because the view was closed.
    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadFence, LoadOutcome};

    #[test]
    fn single_load_is_applied() {
        let mut fence = LoadFence::default();

        let ticket = fence.begin().unwrap();
        assert!(fence.is_loading());

        assert_eq!(fence.finish(ticket), LoadOutcome::Applied);
        assert!(!fence.is_loading());
    }

    #[test]
    fn older_ticket_is_superseded_regardless_of_resolution_order() {
        let mut fence = LoadFence::default();
        let first = fence.begin().unwrap();
        let second = fence.begin().unwrap();

        assert_eq!(fence.finish(second), LoadOutcome::Applied);
        assert!(fence.is_loading());
        assert_eq!(fence.finish(first), LoadOutcome::Superseded);
        assert!(!fence.is_loading());
    }

    #[test]
    fn deactivated_fence_rejects_new_and_pending_loads() {
        let mut fence = LoadFence::default();
        let ticket = fence.begin().unwrap();

        fence.deactivate();

        assert_eq!(fence.finish(ticket), LoadOutcome::Inactive);
        assert!(fence.begin().is_none());
        assert!(!fence.is_active());
    }

    #[test]
    fn dropped_ticket_is_no_longer_loading() {
        let mut fence = LoadFence::default();
        let first = fence.begin().unwrap();
        let second = fence.begin().unwrap();

        drop(first);
        assert!(fence.is_loading());

        drop(second);
        assert!(!fence.is_loading());
    }
}
