use crate::transfer::Attempts;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_INTERFACE: u8 = 0;
pub const EP_BULK_OUT: u8 = 0x02;
pub const EP_BULK_IN: u8 = 0x86;

pub const DEFAULT_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_MULTI_TIMEOUT_MS: u64 = 10;

/// Where on the device we talk, and how patient we are when doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceSettings {
    pub interface: u8,
    pub endpoint_out: u8,
    pub endpoint_in: u8,

    /// Per attempt timeout for single transfers.
    pub timeout_ms: u64,

    /// Per attempt timeout for each packet of a multi-packet read.
    pub multi_timeout_ms: u64,

    pub attempts: Attempts,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE,
            endpoint_out: EP_BULK_OUT,
            endpoint_in: EP_BULK_IN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            multi_timeout_ms: DEFAULT_MULTI_TIMEOUT_MS,
            attempts: Attempts::default(),
        }
    }
}

impl DeviceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn multi_timeout(&self) -> Duration {
        Duration::from_millis(self.multi_timeout_ms)
    }
}
