use buudai_types::UsbDeviceInfo;

/// Returned by a transfer made without an open session. Chosen outside of libusb's own
/// range so it can't be mistaken for a transport failure.
pub const ERROR_NOT_CONNECTED: i32 = -100;

#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("No Buudai oscilloscope found")]
    DeviceNotFound,

    #[error("Couldn't get device list: {0}")]
    Enumeration(rusb::Error),

    #[error("Couldn't open device {device}: {error}")]
    Open {
        device: UsbDeviceInfo,
        error: rusb::Error,
    },

    #[error("Couldn't claim interface {interface} of device {device}: {error}")]
    Claim {
        device: UsbDeviceInfo,
        interface: u8,
        error: rusb::Error,
    },

    #[error("Couldn't read the configuration of device {device}: {error}")]
    Descriptor {
        device: UsbDeviceInfo,
        error: rusb::Error,
    },

    #[error("Couldn't get endpoint {endpoint:#04x} of device {device}")]
    EndpointMissing { device: UsbDeviceInfo, endpoint: u8 },
}

#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Device is not connected")]
    NotConnected,

    #[error("Transfer gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: rusb::Error },

    #[error("USB error: {0}")]
    Fatal(rusb::Error),
}

impl TransferError {
    /// The libusb style (negative) return code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            TransferError::NotConnected => ERROR_NOT_CONNECTED,
            TransferError::Exhausted { last, .. } => libusb_code(*last),
            TransferError::Fatal(error) => libusb_code(*error),
        }
    }

    /// The underlying transport error, if the transport was ever reached.
    pub fn usb_error(&self) -> Option<rusb::Error> {
        match self {
            TransferError::NotConnected => None,
            TransferError::Exhausted { last, .. } => Some(*last),
            TransferError::Fatal(error) => Some(*error),
        }
    }
}

pub(crate) fn libusb_code(error: rusb::Error) -> i32 {
    match error {
        rusb::Error::Io => -1,
        rusb::Error::InvalidParam => -2,
        rusb::Error::Access => -3,
        rusb::Error::NoDevice => -4,
        rusb::Error::NotFound => -5,
        rusb::Error::Busy => -6,
        rusb::Error::Timeout => -7,
        rusb::Error::Overflow => -8,
        rusb::Error::Pipe => -9,
        rusb::Error::Interrupted => -10,
        rusb::Error::NoMem => -11,
        rusb::Error::NotSupported => -12,
        _ => -99,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative_and_distinct_per_class() {
        let not_connected = TransferError::NotConnected.code();
        let exhausted = TransferError::Exhausted {
            attempts: 3,
            last: rusb::Error::Timeout,
        }
        .code();
        let fatal = TransferError::Fatal(rusb::Error::NoDevice).code();

        assert!(not_connected < 0 && exhausted < 0 && fatal < 0);
        assert_ne!(not_connected, exhausted);
        assert_ne!(not_connected, fatal);
        assert_ne!(exhausted, fatal);
    }

    #[test]
    fn exhausted_reports_last_error() {
        let error = TransferError::Exhausted {
            attempts: 2,
            last: rusb::Error::Interrupted,
        };
        assert_eq!(error.code(), -10);
        assert_eq!(error.usb_error(), Some(rusb::Error::Interrupted));
        assert_eq!(TransferError::NotConnected.usb_error(), None);
    }
}
