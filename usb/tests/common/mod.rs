//! A scripted USB transport, so Device can be driven without hardware.

#![allow(dead_code)]

use buudai_usb::device::base::{Transport, TransportHandle};
use buudai_usb::settings::{EP_BULK_IN, EP_BULK_OUT};
use buudai_usb::UsbDeviceInfo;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

pub const IN_PACKET: u16 = 512;
pub const OUT_PACKET: u16 = 64;

#[derive(Clone)]
pub struct StubDevice {
    pub info: UsbDeviceInfo,
    pub open_error: Option<rusb::Error>,
    pub claim_error: Option<rusb::Error>,
    pub packet_sizes: Vec<(u8, u16)>,
}

impl StubDevice {
    pub fn new(vendor_id: u16, product_id: u16, address: u8) -> Self {
        Self {
            info: UsbDeviceInfo {
                bus_number: 1,
                address,
                vendor_id,
                product_id,
                device_version: (1, 0, 0),
            },
            open_error: None,
            claim_error: None,
            packet_sizes: vec![(EP_BULK_IN, IN_PACKET), (EP_BULK_OUT, OUT_PACKET)],
        }
    }
}

#[derive(Default)]
pub struct StubState {
    pub devices: Vec<StubDevice>,
    pub enumeration_error: Option<rusb::Error>,

    // Popped before anything else on every bulk / control call.
    pub bulk_failures: VecDeque<rusb::Error>,
    pub control_failures: VecDeque<rusb::Error>,

    // What each bulk read hands back, an empty script reads zero bytes.
    pub bulk_reads: VecDeque<Result<Vec<u8>, rusb::Error>>,
    pub bulk_written: Vec<u8>,
    pub loopback: Vec<u8>,

    pub opened: Vec<u8>,
    pub claimed: Vec<u8>,
    pub released: Vec<u8>,
    pub closed: usize,

    pub bulk_calls: usize,
    pub control_calls: usize,
    pub control_requests: Vec<(u8, u8, u16, u16)>,
    pub timeouts: Vec<Duration>,
}

impl StubState {
    pub fn transport_calls(&self) -> usize {
        self.bulk_calls + self.control_calls
    }
}

#[derive(Clone, Default)]
pub struct StubTransport {
    pub state: Rc<RefCell<StubState>>,
}

impl StubTransport {
    pub fn with_devices(devices: Vec<StubDevice>) -> Self {
        let transport = Self::default();
        transport.state.borrow_mut().devices = devices;
        transport
    }
}

impl Transport for StubTransport {
    type Handle = StubHandle;

    fn devices(&self) -> Result<Vec<UsbDeviceInfo>, rusb::Error> {
        let state = self.state.borrow();
        if let Some(error) = state.enumeration_error {
            return Err(error);
        }
        Ok(state.devices.iter().map(|device| device.info).collect())
    }

    fn open(&self, device: &UsbDeviceInfo) -> Result<StubHandle, rusb::Error> {
        let mut state = self.state.borrow_mut();
        let stub = state
            .devices
            .iter()
            .find(|stub| stub.info == *device)
            .cloned()
            .ok_or(rusb::Error::NoDevice)?;

        if let Some(error) = stub.open_error {
            return Err(error);
        }
        state.opened.push(device.address);

        Ok(StubHandle {
            state: self.state.clone(),
            device: stub,
        })
    }
}

pub struct StubHandle {
    state: Rc<RefCell<StubState>>,
    device: StubDevice,
}

impl Drop for StubHandle {
    fn drop(&mut self) {
        self.state.borrow_mut().closed += 1;
    }
}

impl TransportHandle for StubHandle {
    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        if let Some(error) = self.device.claim_error {
            return Err(error);
        }
        self.state.borrow_mut().claimed.push(interface);
        Ok(())
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        self.state.borrow_mut().released.push(interface);
        Ok(())
    }

    fn max_packet_size(&self, _interface: u8, endpoint: u8) -> Result<Option<u16>, rusb::Error> {
        Ok(self
            .device
            .packet_sizes
            .iter()
            .find(|(address, _)| *address == endpoint)
            .map(|(_, size)| *size))
    }

    fn read_bulk(
        &mut self,
        _endpoint: u8,
        data: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut state = self.state.borrow_mut();
        state.bulk_calls += 1;
        state.timeouts.push(timeout);

        if let Some(error) = state.bulk_failures.pop_front() {
            return Err(error);
        }

        match state.bulk_reads.pop_front() {
            Some(Ok(bytes)) => {
                let length = bytes.len().min(data.len());
                data[..length].copy_from_slice(&bytes[..length]);
                Ok(length)
            }
            Some(Err(error)) => Err(error),
            None => Ok(0),
        }
    }

    fn write_bulk(
        &mut self,
        _endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut state = self.state.borrow_mut();
        state.bulk_calls += 1;
        state.timeouts.push(timeout);

        if let Some(error) = state.bulk_failures.pop_front() {
            return Err(error);
        }
        state.bulk_written.extend_from_slice(data);
        Ok(data.len())
    }

    fn read_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut state = self.state.borrow_mut();
        state.control_calls += 1;
        state.timeouts.push(timeout);
        state.control_requests.push((request_type, request, value, index));

        if let Some(error) = state.control_failures.pop_front() {
            return Err(error);
        }

        let length = state.loopback.len().min(data.len());
        data[..length].copy_from_slice(&state.loopback[..length]);
        Ok(length)
    }

    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        let mut state = self.state.borrow_mut();
        state.control_calls += 1;
        state.timeouts.push(timeout);
        state.control_requests.push((request_type, request, value, index));

        if let Some(error) = state.control_failures.pop_front() {
            return Err(error);
        }

        state.loopback = data.to_vec();
        Ok(data.len())
    }
}
