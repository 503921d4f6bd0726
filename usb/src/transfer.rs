//! The retry loop shared by every bulk and control transfer.
//!
//! A single attempt is handed in as a closure, so the same policy applies no matter which
//! transport call sits underneath it. Transient failures (the device simply didn't answer
//! in time) are retried until the attempt budget runs out; anything else is returned
//! straight away.

use crate::error::TransferError;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_MULTI_ATTEMPTS: u32 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Attempts {
    Limited(u32),
    Unlimited,
}

impl Default for Attempts {
    fn default() -> Self {
        Attempts::Limited(DEFAULT_ATTEMPTS)
    }
}

impl Attempts {
    /// The budget used for each packet of a multi-packet read.
    pub fn multi() -> Self {
        Attempts::Limited(DEFAULT_MULTI_ATTEMPTS)
    }

    fn allows(&self, performed: u32) -> bool {
        match self {
            Attempts::Limited(limit) => performed < *limit,
            Attempts::Unlimited => true,
        }
    }
}

pub fn is_transient(error: rusb::Error) -> bool {
    matches!(error, rusb::Error::Timeout | rusb::Error::Interrupted)
}

/// Runs `attempt` until it succeeds, fails fatally, or `attempts` is used up.
///
/// A zero budget never touches the transport and reports a timeout, same as a budget
/// that only ever saw timeouts.
pub fn retry_transfer<F>(
    attempts: Attempts,
    timeout: Duration,
    mut attempt: F,
) -> Result<usize, TransferError>
where
    F: FnMut(Duration) -> Result<usize, rusb::Error>,
{
    let mut last = rusb::Error::Timeout;
    let mut performed = 0;

    while attempts.allows(performed) {
        performed += 1;
        match attempt(timeout) {
            Ok(transferred) => return Ok(transferred),
            Err(error) if is_transient(error) => {
                debug!(
                    "Transient USB error: {} (Attempt {} of {:?})",
                    error, performed, attempts
                );
                last = error;
            }
            Err(error) => return Err(TransferError::Fatal(error)),
        }
    }

    Err(TransferError::Exhausted {
        attempts: performed,
        last,
    })
}
