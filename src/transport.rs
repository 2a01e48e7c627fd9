use std::time::{Duration, Instant};

use rusb::{Context, DeviceHandle, Direction, Recipient, RequestType, UsbContext};
use thiserror::Error;

use crate::camlink;

#[derive(Debug, Clone, serde::Serialize)]
pub struct DeviceSummary {
    pub vid: u16,
    pub pid: u16,
    pub bus: u8,
    pub address: u8,
}

/// Vendor control transfers against the device's default endpoint.
///
/// The firmware assumes a single outstanding request at a time, so a
/// transport is never shared between threads.
pub trait ControlTransport {
    fn vendor_read(&self, request: u8, value: u16, index: u16, buf: &mut [u8])
        -> rusb::Result<usize>;

    fn vendor_write(&self, request: u8, value: u16, index: u16, data: &[u8])
        -> rusb::Result<usize>;
}

#[derive(Error, Debug)]
pub enum OpenError {
    #[error("usb: {0}")]
    Usb(#[from] rusb::Error),

    #[error("no Cam Link device found")]
    NoDevice,
}

pub struct UsbTransport {
    handle: DeviceHandle<Context>,
    pub bus: u8,
    pub address: u8,
}

pub fn list_devices() -> Result<Vec<DeviceSummary>, OpenError> {
    let ctx = Context::new()?;
    let mut out: Vec<DeviceSummary> = Vec::new();
    for dev in ctx.devices()?.iter() {
        let desc = match dev.device_descriptor() {
            Ok(d) => d,
            Err(_) => continue,
        };
        if desc.vendor_id() == camlink::VID && desc.product_id() == camlink::PID {
            out.push(DeviceSummary {
                vid: desc.vendor_id(),
                pid: desc.product_id(),
                bus: dev.bus_number(),
                address: dev.address(),
            });
        }
    }
    Ok(out)
}

pub fn open_device(wait: bool, wait_timeout: Option<Duration>) -> Result<UsbTransport, OpenError> {
    let start = Instant::now();

    loop {
        let ctx = Context::new()?;
        let found = ctx.devices()?.iter().find(|d| {
            d.device_descriptor()
                .map(|desc| desc.vendor_id() == camlink::VID && desc.product_id() == camlink::PID)
                .unwrap_or(false)
        });

        if let Some(dev) = found {
            let bus = dev.bus_number();
            let address = dev.address();
            let mut handle = dev.open()?;
            let _ = handle.set_auto_detach_kernel_driver(true);
            handle.claim_interface(0)?;
            tracing::debug!(bus, address, "Cam Link open");
            return Ok(UsbTransport {
                handle,
                bus,
                address,
            });
        }

        if !wait {
            return Err(OpenError::NoDevice);
        }
        if let Some(t) = wait_timeout {
            if start.elapsed() >= t {
                return Err(OpenError::NoDevice);
            }
        }

        std::thread::sleep(Duration::from_millis(250));
    }
}

impl ControlTransport for UsbTransport {
    fn vendor_read(
        &self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> rusb::Result<usize> {
        let rt = rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device);
        self.handle
            .read_control(rt, request, value, index, buf, camlink::REQUEST_TIMEOUT)
    }

    fn vendor_write(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> rusb::Result<usize> {
        let rt = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        self.handle
            .write_control(rt, request, value, index, data, camlink::REQUEST_TIMEOUT)
    }
}
