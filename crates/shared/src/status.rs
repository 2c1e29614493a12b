//! Status canonicalization.
//!
//! Backends report overlapping and sometimes contradictory status fields
//! (`printing`, `paused`, a text label and a numeric state code). The panel
//! shows one stable label per poll. A cancel in progress is latched: once
//! code `4` is seen the latch holds until a fresh print start (`0` then `1`)
//! is observed, so the stale `1` a backend may emit while winding down a
//! cancelled job never reads as a new print.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const STATE_IDLE: i32 = 0;
pub const STATE_PRINTING: i32 = 1;
pub const STATE_PAUSED: i32 = 2;
pub const STATE_FINISHED: i32 = 3;
pub const STATE_CANCELING: i32 = 4;
pub const STATE_SHUTDOWN: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatus {
    pub printing: bool,
    pub paused: bool,
    pub state: String,
    pub state_code: i32,
}

impl RawStatus {
    pub fn new(printing: bool, paused: bool, state: impl Into<String>, state_code: i32) -> Self {
        Self {
            printing,
            paused,
            state: state.into(),
            state_code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStatus {
    Idle,
    Printing,
    Paused,
    Canceling,
}

impl DisplayStatus {
    pub fn label(self) -> &'static str {
        match self {
            DisplayStatus::Idle => "Idle",
            DisplayStatus::Printing => "Printing",
            DisplayStatus::Paused => "Paused",
            DisplayStatus::Canceling => "Canceling",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalStatus {
    pub status: DisplayStatus,
    pub cancel_latched: bool,
}

/// Reduces raw polls to [`CanonicalStatus`].
///
/// Takes `&mut self`, so one instance has exactly one mutator at a time.
/// Hosts polling from several tasks keep one instance per poll loop or
/// serialize access themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCanonicalizer {
    previous_state_code: Option<i32>,
    cancel_latched: bool,
}

impl StatusCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_latched(&self) -> bool {
        self.cancel_latched
    }

    pub fn previous_state_code(&self) -> Option<i32> {
        self.previous_state_code
    }

    pub fn canonicalize(&mut self, raw: &RawStatus) -> CanonicalStatus {
        if raw.state_code == STATE_CANCELING {
            self.cancel_latched = true;
        } else if self.previous_state_code == Some(STATE_IDLE)
            && raw.state_code == STATE_PRINTING
        {
            self.cancel_latched = false;
        }

        let status = display_status(raw, self.cancel_latched);
        self.previous_state_code = Some(raw.state_code);

        CanonicalStatus {
            status,
            cancel_latched: self.cancel_latched,
        }
    }

    /// Back to the initial, unlatched state. Call on start-up and after the
    /// backend connection is re-established.
    pub fn reset(&mut self) {
        self.previous_state_code = None;
        self.cancel_latched = false;
    }
}

// A latched poll keeps reading "Canceling" until the backend settles at idle;
// the latch itself stays set through idle polls.
fn display_status(raw: &RawStatus, cancel_latched: bool) -> DisplayStatus {
    let settled_idle = raw.state_code == STATE_IDLE && !raw.printing && !raw.paused;
    if cancel_latched && !settled_idle {
        DisplayStatus::Canceling
    } else if raw.paused {
        DisplayStatus::Paused
    } else if raw.printing {
        DisplayStatus::Printing
    } else {
        DisplayStatus::Idle
    }
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
