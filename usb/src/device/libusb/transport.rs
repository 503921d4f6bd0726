use crate::device::base::{Transport, TransportHandle};
use buudai_types::UsbDeviceInfo;
use log::{debug, info};
use rusb::{Device, DeviceHandle, GlobalContext, UsbContext};
use std::time::Duration;

/// libusb, by way of rusb. Works under Linux, MacOS and Windows (with WinUSB bound).
pub struct LibUsbTransport<T: UsbContext = GlobalContext> {
    context: T,
}

impl LibUsbTransport<GlobalContext> {
    pub fn global() -> Self {
        Self {
            context: GlobalContext::default(),
        }
    }
}

impl LibUsbTransport<rusb::Context> {
    pub fn new() -> Result<Self, rusb::Error> {
        Ok(Self {
            context: rusb::Context::new()?,
        })
    }
}

impl<T: UsbContext> LibUsbTransport<T> {
    fn find_device(&self, device: &UsbDeviceInfo) -> Result<Device<T>, rusb::Error> {
        for usb_device in self.context.devices()?.iter() {
            if usb_device.bus_number() == device.bus_number
                && usb_device.address() == device.address
            {
                return Ok(usb_device);
            }
        }
        Err(rusb::Error::NoDevice)
    }
}

impl<T: UsbContext> Transport for LibUsbTransport<T> {
    type Handle = LibUsbHandle<T>;

    fn devices(&self) -> Result<Vec<UsbDeviceInfo>, rusb::Error> {
        let mut found_devices = Vec::new();

        for device in self.context.devices()?.iter() {
            // Devices we can't even read a descriptor from are of no use to us.
            if let Ok(descriptor) = device.device_descriptor() {
                let version = descriptor.device_version();
                found_devices.push(UsbDeviceInfo {
                    bus_number: device.bus_number(),
                    address: device.address(),
                    vendor_id: descriptor.vendor_id(),
                    product_id: descriptor.product_id(),
                    device_version: (version.major(), version.minor(), version.sub_minor()),
                });
            }
        }

        Ok(found_devices)
    }

    fn open(&self, device: &UsbDeviceInfo) -> Result<Self::Handle, rusb::Error> {
        let handle = self.find_device(device)?.open()?;
        info!("Opened USB device at {:?}", handle.device());
        Ok(LibUsbHandle { handle })
    }
}

pub struct LibUsbHandle<T: UsbContext> {
    handle: DeviceHandle<T>,
}

impl<T: UsbContext> TransportHandle for LibUsbHandle<T> {
    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        // Not every platform can detach kernel drivers, that's fine, the claim will tell us.
        if let Err(error) = self.handle.set_auto_detach_kernel_driver(true) {
            debug!("Unable to enable kernel driver auto-detach: {}", error);
        }
        self.handle.claim_interface(interface)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        self.handle.release_interface(interface)
    }

    fn max_packet_size(&self, interface: u8, endpoint: u8) -> Result<Option<u16>, rusb::Error> {
        let config = self.handle.device().active_config_descriptor()?;

        let packet_size = config
            .interfaces()
            .filter(|iface| iface.number() == interface)
            .flat_map(|iface| iface.descriptors())
            .flat_map(|descriptor| {
                descriptor
                    .endpoint_descriptors()
                    .map(|ep| (ep.address(), ep.max_packet_size()))
                    .collect::<Vec<_>>()
            })
            .find(|(address, _)| *address == endpoint)
            .map(|(_, size)| size);

        Ok(packet_size)
    }

    fn read_bulk(
        &mut self,
        endpoint: u8,
        data: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        self.handle.read_bulk(endpoint, data, timeout)
    }

    fn write_bulk(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        self.handle.write_bulk(endpoint, data, timeout)
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
        self.handle
            .read_control(request_type, request, value, index, data, timeout)
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
        self.handle
            .write_control(request_type, request, value, index, data, timeout)
    }
}
