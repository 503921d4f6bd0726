use crate::device::base::{is_in_endpoint, Transport, TransportHandle};
use crate::error::{ConnectError, TransferError};
use crate::models::{find_model, KnownModel, KNOWN_MODELS};
use crate::settings::DeviceSettings;
use crate::transfer::{retry_transfer, Attempts};
use buudai_types::{Model, UsbDeviceInfo};
use log::{debug, info, warn};
use rusb::{Direction, Recipient, RequestType};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Connected,
    Disconnected,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

// Everything we only know while a session is open.
struct Connection<H: TransportHandle> {
    handle: H,
    interface: u8,
    descriptor: UsbDeviceInfo,
    in_packet_length: u16,
    out_packet_length: u16,
    model: &'static KnownModel,
}

/// A session with a single oscilloscope.
///
/// Transfers block for up to `attempts * timeout`, and take `&mut self`, so a Device can
/// only ever have one transfer in flight. Callers who need to stay responsive should keep
/// the Device on its own thread.
pub struct Device<T: Transport> {
    transport: T,
    models: &'static [KnownModel],
    settings: DeviceSettings,
    connection: Option<Connection<T::Handle>>,
    event_sender: Option<UnboundedSender<DeviceEvent>>,
}

impl<T: Transport> Device<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            models: KNOWN_MODELS,
            settings: DeviceSettings::default(),
            connection: None,
            event_sender: None,
        }
    }

    pub fn with_settings(mut self, settings: DeviceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_models(mut self, models: &'static [KnownModel]) -> Self {
        self.models = models;
        self
    }

    /// Connected / Disconnected events will be sent here, once per transition.
    pub fn with_event_sender(mut self, sender: UnboundedSender<DeviceEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Looks through the attached USB devices for a supported oscilloscope, and opens the
    /// first one that can be claimed. Returns the name of the model found.
    pub fn search(&mut self) -> Result<&'static str, ConnectError> {
        self.disconnect();

        let devices = self
            .transport
            .devices()
            .map_err(ConnectError::Enumeration)?;

        let mut last_error = None;
        for device in devices {
            let Some(known) = find_model(self.models, device.vendor_id, device.product_id) else {
                continue;
            };

            debug!("Found possible {} at {}", known.name, device);
            match self.open_candidate(device, known) {
                Ok(connection) => {
                    info!(
                        "Connected to {} at {}, packet lengths IN: {} OUT: {}",
                        known.name,
                        device,
                        connection.in_packet_length,
                        connection.out_packet_length
                    );
                    self.connection = Some(connection);
                    self.notify(DeviceEvent::Connected);
                    return Ok(known.name);
                }
                Err(error) => {
                    warn!("Unable to use {}: {}", known.name, error);
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(ConnectError::DeviceNotFound))
    }

    fn open_candidate(
        &self,
        device: UsbDeviceInfo,
        model: &'static KnownModel,
    ) -> Result<Connection<T::Handle>, ConnectError> {
        let interface = self.settings.interface;

        let mut handle = self
            .transport
            .open(&device)
            .map_err(|error| ConnectError::Open { device, error })?;

        handle
            .claim_interface(interface)
            .map_err(|error| ConnectError::Claim {
                device,
                interface,
                error,
            })?;

        let packet_lengths = self
            .packet_length(&handle, device, self.settings.endpoint_in)
            .and_then(|input| {
                let output = self.packet_length(&handle, device, self.settings.endpoint_out)?;
                Ok((input, output))
            });

        match packet_lengths {
            Ok((in_packet_length, out_packet_length)) => Ok(Connection {
                handle,
                interface,
                descriptor: device,
                in_packet_length,
                out_packet_length,
                model,
            }),
            Err(error) => {
                // The handle closes when dropped, but the claim has to go back first.
                if let Err(release) = handle.release_interface(interface) {
                    debug!("Unable to release interface {}: {}", interface, release);
                }
                Err(error)
            }
        }
    }

    fn packet_length(
        &self,
        handle: &T::Handle,
        device: UsbDeviceInfo,
        endpoint: u8,
    ) -> Result<u16, ConnectError> {
        match handle.max_packet_size(self.settings.interface, endpoint) {
            Ok(Some(size)) if size > 0 => Ok(size),
            Ok(_) => Err(ConnectError::EndpointMissing { device, endpoint }),
            Err(error) => Err(ConnectError::Descriptor { device, error }),
        }
    }

    /// Releases the interface and closes the device. Does nothing if not connected.
    pub fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        if let Err(error) = connection.handle.release_interface(connection.interface) {
            debug!(
                "Unable to release interface {}: {}",
                connection.interface, error
            );
        }

        info!(
            "Disconnected from {} at {}",
            connection.model.name, connection.descriptor
        );
        drop(connection);
        self.notify(DeviceEvent::Disconnected);
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn model(&self) -> Model {
        self.connection
            .as_ref()
            .map_or(Model::Unknown, |connection| connection.model.model)
    }

    pub fn model_name(&self) -> Option<&'static str> {
        self.connection.as_ref().map(|connection| connection.model.name)
    }

    pub fn descriptor(&self) -> Option<UsbDeviceInfo> {
        self.connection.as_ref().map(|connection| connection.descriptor)
    }

    pub fn interface(&self) -> Option<u8> {
        self.connection.as_ref().map(|connection| connection.interface)
    }

    pub fn in_packet_length(&self) -> Option<u16> {
        self.connection
            .as_ref()
            .map(|connection| connection.in_packet_length)
    }

    pub fn out_packet_length(&self) -> Option<u16> {
        self.connection
            .as_ref()
            .map(|connection| connection.out_packet_length)
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    /// A bulk transfer on any endpoint, the direction is taken from the endpoint address.
    pub fn bulk_transfer(
        &mut self,
        endpoint: u8,
        data: &mut [u8],
        attempts: Attempts,
    ) -> Result<usize, TransferError> {
        let timeout = self.settings.timeout();
        if is_in_endpoint(endpoint) {
            self.transfer(attempts, timeout, |handle, timeout| {
                handle.read_bulk(endpoint, data, timeout)
            })
        } else {
            self.transfer(attempts, timeout, |handle, timeout| {
                handle.write_bulk(endpoint, data, timeout)
            })
        }
    }

    pub fn bulk_write(&mut self, data: &[u8], attempts: Attempts) -> Result<usize, TransferError> {
        let endpoint = self.settings.endpoint_out;
        let timeout = self.settings.timeout();
        self.transfer(attempts, timeout, |handle, timeout| {
            handle.write_bulk(endpoint, data, timeout)
        })
    }

    pub fn bulk_read(
        &mut self,
        data: &mut [u8],
        attempts: Attempts,
    ) -> Result<usize, TransferError> {
        let endpoint = self.settings.endpoint_in;
        let timeout = self.settings.timeout();
        self.transfer(attempts, timeout, |handle, timeout| {
            handle.read_bulk(endpoint, data, timeout)
        })
    }

    /// Fills `data` one IN packet at a time.
    ///
    /// Stops at the first empty or short packet, or the first packet that fails. Whatever
    /// was read before that point is returned, an error is only returned if nothing was.
    pub fn bulk_read_multi(
        &mut self,
        data: &mut [u8],
        attempts: Attempts,
    ) -> Result<usize, TransferError> {
        let packet_length = self
            .in_packet_length()
            .ok_or(TransferError::NotConnected)? as usize;
        let endpoint = self.settings.endpoint_in;
        let timeout = self.settings.multi_timeout();

        let mut received = 0;
        for (packet, chunk) in data.chunks_mut(packet_length).enumerate() {
            let requested = chunk.len();
            let result = self.transfer(attempts, timeout, |handle, timeout| {
                handle.read_bulk(endpoint, chunk, timeout)
            });

            match result {
                Ok(read) => {
                    received += read;
                    if read < requested {
                        debug!("Packet {} was short ({} of {}), done", packet, read, requested);
                        break;
                    }
                }
                Err(error) if received == 0 => return Err(error),
                Err(error) => {
                    debug!("Packet {} failed after {} bytes: {}", packet, received, error);
                    break;
                }
            }
        }

        Ok(received)
    }

    /// A control transfer, the direction is taken from bit 7 of `request_type`.
    pub fn control_transfer(
        &mut self,
        request_type: u8,
        request: u8,
        data: &mut [u8],
        value: u16,
        index: u16,
        attempts: Attempts,
    ) -> Result<usize, TransferError> {
        let timeout = self.settings.timeout();
        if is_in_endpoint(request_type) {
            self.transfer(attempts, timeout, |handle, timeout| {
                handle.read_control(request_type, request, value, index, data, timeout)
            })
        } else {
            self.transfer(attempts, timeout, |handle, timeout| {
                handle.write_control(request_type, request, value, index, data, timeout)
            })
        }
    }

    pub fn control_write(
        &mut self,
        request: u8,
        data: &[u8],
        value: u16,
        index: u16,
        attempts: Attempts,
    ) -> Result<usize, TransferError> {
        let request_type =
            rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        let timeout = self.settings.timeout();
        self.transfer(attempts, timeout, |handle, timeout| {
            handle.write_control(request_type, request, value, index, data, timeout)
        })
    }

    pub fn control_read(
        &mut self,
        request: u8,
        data: &mut [u8],
        value: u16,
        index: u16,
        attempts: Attempts,
    ) -> Result<usize, TransferError> {
        let request_type =
            rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device);
        let timeout = self.settings.timeout();
        self.transfer(attempts, timeout, |handle, timeout| {
            handle.read_control(request_type, request, value, index, data, timeout)
        })
    }

    fn transfer<F>(
        &mut self,
        attempts: Attempts,
        timeout: Duration,
        mut attempt: F,
    ) -> Result<usize, TransferError>
    where
        F: FnMut(&mut T::Handle, Duration) -> Result<usize, rusb::Error>,
    {
        let connection = self
            .connection
            .as_mut()
            .ok_or(TransferError::NotConnected)?;

        let result = retry_transfer(attempts, timeout, |timeout| {
            attempt(&mut connection.handle, timeout)
        });

        if result == Err(TransferError::Fatal(rusb::Error::NoDevice)) {
            warn!("Device has been removed, disconnecting..");
            self.disconnect();
        }
        result
    }

    fn notify(&self, event: DeviceEvent) {
        if let Some(sender) = &self.event_sender {
            if sender.send(event).is_err() {
                debug!("Nobody is listening for {:?}", event);
            }
        }
    }
}

impl<T: Transport> Drop for Device<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
