//! Ethernet -> IPv4 -> TCP frame classification.
//!
//! Every header is located through the length fields of the header before it,
//! and every offset is checked against the captured length before a field is
//! read. Frames that are not IPv4/TCP are passed over; frames too short for the
//! headers they claim are reported as [`MalformedFrameError`] and never reach
//! the metrics.

use log::trace;
use pnet_packet::ethernet::{EtherTypes, EthernetPacket};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::tcp::TcpPacket;

use super::types::ClassifiedSegment;
use crate::error_handling::types::MalformedFrameError;

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const MIN_IPV4_HEADER_LEN: usize = 20;
pub const MIN_TCP_HEADER_LEN: usize = 20;
/// Shortest frame that can possibly carry a TCP segment.
pub const MIN_TCP_FRAME_LEN: usize = ETHERNET_HEADER_LEN + MIN_IPV4_HEADER_LEN + MIN_TCP_HEADER_LEN;

/// Returns the TCP fields of `frame` if it is an IPv4 TCP segment over
/// Ethernet. Anything else, including malformed frames, yields `None`.
pub fn classify(frame: &[u8], captured_len: usize) -> Option<ClassifiedSegment> {
    match decode(frame, captured_len) {
        Ok(segment) => segment,
        Err(e) => {
            trace!("discarding frame: {}", e);
            None
        }
    }
}

/// Like [`classify`] but tells malformed frames apart from frames that are
/// simply not TCP (`Ok(None)`).
pub fn decode(
    frame: &[u8],
    captured_len: usize,
) -> Result<Option<ClassifiedSegment>, MalformedFrameError> {
    let available = captured_len.min(frame.len());
    let frame = &frame[..available];

    let ethernet = EthernetPacket::new(frame).ok_or(MalformedFrameError::Truncated {
        needed: ETHERNET_HEADER_LEN,
        available,
    })?;
    if ethernet.get_ethertype() != EtherTypes::Ipv4 {
        return Ok(None);
    }

    let ip_bytes = &frame[ETHERNET_HEADER_LEN..];
    let ip = Ipv4Packet::new(ip_bytes).ok_or(MalformedFrameError::Truncated {
        needed: ETHERNET_HEADER_LEN + MIN_IPV4_HEADER_LEN,
        available,
    })?;
    if ip.get_version() != 4 {
        return Err(MalformedFrameError::BadIpVersion(ip.get_version()));
    }
    if ip.get_next_level_protocol() != IpNextHeaderProtocols::Tcp {
        return Ok(None);
    }
    // only the first fragment carries the TCP header
    if ip.get_fragment_offset() != 0 {
        return Ok(None);
    }

    let ihl = ip.get_header_length();
    let ip_header_len = usize::from(ihl) * 4;
    if ip_header_len < MIN_IPV4_HEADER_LEN {
        return Err(MalformedFrameError::BadIpHeaderLength(ihl));
    }

    // The TCP header starts where the IP header says it ends, not at a fixed offset.
    let tcp_offset = ETHERNET_HEADER_LEN + ip_header_len;
    let needed = tcp_offset + MIN_TCP_HEADER_LEN;
    if available < needed {
        return Err(MalformedFrameError::Truncated { needed, available });
    }
    let tcp = TcpPacket::new(&frame[tcp_offset..])
        .ok_or(MalformedFrameError::Truncated { needed, available })?;

    let data_offset = tcp.get_data_offset();
    if usize::from(data_offset) * 4 < MIN_TCP_HEADER_LEN {
        return Err(MalformedFrameError::BadTcpDataOffset(data_offset));
    }

    Ok(Some(ClassifiedSegment {
        sequence_number: tcp.get_sequence(),
        frame_length: captured_len,
    }))
}
