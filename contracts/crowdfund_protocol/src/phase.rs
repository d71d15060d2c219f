//! Phase guards.
//!
//! A close time of `0` means the phase never started. A non-zero close time
//! in the future means the phase is open; at or after it, closed. Approval
//! states additionally require backing to be closed.

use crate::types::{Phase, ProjectState};
use crate::Error;

pub fn is_open(close_time: u64, now: u64) -> bool {
    close_time != 0 && now < close_time
}

pub fn is_closed(close_time: u64, now: u64) -> bool {
    close_time != 0 && now >= close_time
}

/// Absolute close time for a window of `duration` seconds starting `now`.
pub fn close_time(now: u64, duration: u64) -> Result<u64, Error> {
    if duration == 0 {
        return Err(Error::InvalidDuration);
    }
    now.checked_add(duration).ok_or(Error::Overflow)
}

impl ProjectState {
    pub fn backing_open(&self, now: u64) -> bool {
        is_open(self.backing_close_time, now)
    }

    pub fn backing_closed(&self, now: u64) -> bool {
        is_closed(self.backing_close_time, now)
    }

    pub fn approval_open(&self, now: u64) -> bool {
        self.backing_closed(now) && is_open(self.approval_close_time, now)
    }

    pub fn approval_closed(&self, now: u64) -> bool {
        self.backing_closed(now) && is_closed(self.approval_close_time, now)
    }

    pub fn phase(&self, now: u64) -> Phase {
        if self.processed {
            Phase::Processed
        } else if self.approval_closed(now) {
            Phase::ApprovalClosed
        } else if self.approval_open(now) {
            Phase::Approval
        } else if self.backing_closed(now) {
            Phase::BackingClosed
        } else if self.backing_open(now) {
            Phase::Backing
        } else {
            Phase::Created
        }
    }
}
