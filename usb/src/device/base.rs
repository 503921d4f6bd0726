use buudai_types::UsbDeviceInfo;
use std::time::Duration;

// These are the only things the rest of the crate needs from a USB library. Everything
// above this line is library agnostic, everything below it lives in a single backend.
pub trait Transport {
    type Handle: TransportHandle;

    fn devices(&self) -> Result<Vec<UsbDeviceInfo>, rusb::Error>;
    fn open(&self, device: &UsbDeviceInfo) -> Result<Self::Handle, rusb::Error>;
}

/// An open device. Dropping the handle closes it.
pub trait TransportHandle {
    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;
    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;

    /// The max packet size of `endpoint` on `interface`, or None if it doesn't exist.
    fn max_packet_size(&self, interface: u8, endpoint: u8) -> Result<Option<u16>, rusb::Error>;

    fn read_bulk(
        &mut self,
        endpoint: u8,
        data: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;

    fn write_bulk(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;

    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;

    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;
}

pub(crate) fn is_in_endpoint(address: u8) -> bool {
    address & 0x80 != 0
}
