#[cfg(feature = "clap")]
use clap::ValueEnum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use strum::{Display, EnumCount, EnumIter};

/// The oscilloscope models the USB layer knows how to talk to.
#[derive(Copy, Clone, Debug, Default, Display, EnumIter, EnumCount, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(ValueEnum))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Model {
    #[default]
    Unknown,
    Dso2090,
    Dso2150,
    Dso2250,
    Dso5200,
    Dso5200A,
    Bm102,
}

impl Model {
    pub fn is_known(&self) -> bool {
        *self != Model::Unknown
    }
}

/// Where a device sits on the bus, and what it reported about itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UsbDeviceInfo {
    pub bus_number: u8,
    pub address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub device_version: (u8, u8, u8),
}

impl std::fmt::Display for UsbDeviceInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} (bus {} address {})",
            self.vendor_id, self.product_id, self.bus_number, self.address
        )
    }
}

impl std::fmt::Debug for UsbDeviceInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}:{:04x}@{}.{} v{}.{}.{}",
            self.vendor_id,
            self.product_id,
            self.bus_number,
            self.address,
            self.device_version.0,
            self.device_version.1,
            self.device_version.2
        )
    }
}
