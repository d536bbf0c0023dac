//! Seam between the capture session and the packet-capture facility.
//!
//! The session only knows [`DeviceOpener`] and [`FrameSource`]; the libpcap
//! backed implementation lives in [`PcapOpener`] / [`PcapSource`].

use chrono::{DateTime, Utc};
use log::{debug, info};
use pcap::{Active, Capture, Device};

use super::types::{Delivery, Frame};
use crate::configuration::types::CaptureConfig;
use crate::error_handling::types::DeviceError;

/// An open capture handle delivering frames one at a time.
///
/// `next_frame` may block, but must return [`Delivery::Idle`] within the
/// configured read timeout when nothing arrives, so that callers can check for
/// a stop request between deliveries.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Delivery, DeviceError>;
}

/// Opens capture handles for the configured interface.
pub trait DeviceOpener: Send + Sync {
    fn open(&self, config: &CaptureConfig) -> Result<Box<dyn FrameSource>, DeviceError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PcapOpener;

impl DeviceOpener for PcapOpener {
    fn open(&self, config: &CaptureConfig) -> Result<Box<dyn FrameSource>, DeviceError> {
        let open_failed = |e: pcap::Error| DeviceError::OpenFailed {
            interface: config.interface.clone(),
            reason: e.to_string(),
        };

        let capture = Capture::from_device(config.interface.as_str())
            .map_err(open_failed)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.read_timeout_ms)
            .open()
            .map_err(open_failed)?;

        info!(
            "Opened {} (snaplen={}, promisc={}, timeout={}ms)",
            config.interface, config.snaplen, config.promiscuous, config.read_timeout_ms
        );
        Ok(Box::new(PcapSource {
            interface: config.interface.clone(),
            capture,
        }))
    }
}

pub struct PcapSource {
    interface: String,
    capture: Capture<Active>,
}

impl FrameSource for PcapSource {
    fn next_frame(&mut self) -> Result<Delivery, DeviceError> {
        match self.capture.next_packet() {
            Ok(packet) => {
                let ts = &packet.header.ts;
                let timestamp =
                    header_timestamp(ts.tv_sec as i64, ts.tv_usec as i64).unwrap_or_else(Utc::now);
                Ok(Delivery::Frame(Frame {
                    data: packet.data.to_vec(),
                    captured_len: packet.header.caplen as usize,
                    timestamp,
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(Delivery::Idle),
            Err(pcap::Error::NoMorePackets) => Ok(Delivery::Ended),
            Err(e) => Err(DeviceError::ReadFailed(format!("{}: {}", self.interface, e))),
        }
    }
}

impl Drop for PcapSource {
    fn drop(&mut self) {
        debug!("Releasing capture handle on {}", self.interface);
    }
}

fn header_timestamp(secs: i64, micros: i64) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(micros).ok()?.checked_mul(1_000)?;
    DateTime::from_timestamp(secs, nanos)
}

/// Fails with [`DeviceError::NotFound`] when no capture device has this name.
pub fn verify_interface(name: &str) -> Result<(), DeviceError> {
    let devices = Device::list().map_err(|e| DeviceError::ReadFailed(e.to_string()))?;
    if devices.iter().any(|d| d.name == name) {
        debug!("Interface {} is available for capture", name);
        Ok(())
    } else {
        Err(DeviceError::NotFound(name.to_string()))
    }
}
