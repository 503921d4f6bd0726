pub mod base;
mod libusb;

pub use crate::device::libusb::transport::{LibUsbHandle, LibUsbTransport};
