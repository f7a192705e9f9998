// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame coalescing for batched per-frame work.

/// A single pending "next frame" request.
///
/// Hosts typically map a successful [`FrameSlot::request`] to one
/// `requestAnimationFrame` (or equivalent) call and run [`FrameSlot::take`]
/// from the frame callback. Requests made while one is already pending are
/// dropped, so several events in the same frame produce a single read.
///
/// ```rust
/// use understory_timing::FrameSlot;
///
/// let mut slot = FrameSlot::default();
/// assert!(slot.request((10.0, 20.0)));
/// // A second event in the same frame is coalesced away.
/// assert!(!slot.request((11.0, 21.0)));
///
/// assert_eq!(slot.take(), Some((10.0, 20.0)));
/// assert!(!slot.is_pending());
/// ```
#[derive(Clone, Debug)]
pub struct FrameSlot<T> {
    pending: Option<T>,
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> FrameSlot<T> {
    /// Requests a frame carrying `payload`.
    ///
    /// Returns `true` if the host should schedule a frame, or `false` if a
    /// request is already pending, in which case `payload` is dropped.
    pub fn request(&mut self, payload: T) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(payload);
        true
    }

    /// Consumes the pending request when its frame runs.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Cancels the pending request.
    ///
    /// Returns `true` if a request was pending and the host should cancel the
    /// frame it scheduled for it.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Returns `true` while a request is waiting for its frame.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_wins_until_taken() {
        let mut slot = FrameSlot::default();
        assert!(slot.request(1));
        assert!(!slot.request(2));
        assert!(!slot.request(3));

        assert_eq!(slot.take(), Some(1));
        assert!(slot.request(4), "slot reopens after the frame ran");
        assert_eq!(slot.take(), Some(4));
    }

    #[test]
    fn cancel_reports_pending_state() {
        let mut slot = FrameSlot::default();
        assert!(!slot.cancel());

        slot.request(());
        assert!(slot.cancel());
        assert!(!slot.is_pending());
        assert_eq!(slot.take(), None);
    }
}
