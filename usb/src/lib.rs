pub use rusb;
pub mod buudai;
pub mod device;
pub mod error;
pub mod models;
pub mod settings;
pub mod transfer;

pub use buudai::{ConnectionState, Device, DeviceEvent};
pub use buudai_types::{Model, UsbDeviceInfo};
pub use error::{ConnectError, TransferError};
pub use models::{KnownModel, KNOWN_MODELS};
pub use settings::DeviceSettings;
pub use transfer::Attempts;
