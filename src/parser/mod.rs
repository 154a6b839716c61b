//! Protocol-aware header extraction with strict bounds checking.
//!
//! The parser is the only component that touches raw frame bytes. It is pure:
//! either every byte range it needs is fully inside the frame and a
//! `ParsedHeaders` comes back, or it returns `None` and the caller treats the
//! frame as neutral (fail-open). Malformed or truncated input is never an
//! error and never an attack signal.

// Ethernet constants
pub const ETHERNET_HEADER_SIZE: usize = 14;
const ETHERTYPE_OFFSET: usize = 12;
pub const ETHERTYPE_IPV4: u16 = 0x0800;

// IPv4 constants
const IP_HEADER_MIN_SIZE: usize = 20;
const IP_IHL_MASK: u8 = 0x0F;
const IP_PROTOCOL_OFFSET: usize = 9;
const IP_SRC_ADDR_OFFSET: usize = 12;
const IP_DST_ADDR_OFFSET: usize = 16;

// Protocol numbers
pub const PROTOCOL_TCP: u8 = 6;
pub const PROTOCOL_UDP: u8 = 17;

// Transport header minimums
const TCP_HEADER_MIN_SIZE: usize = 20;
const UDP_HEADER_SIZE: usize = 8;
const DST_PORT_OFFSET: usize = 2;

/// Fields extracted from one frame. Addresses are host-order `u32`
/// (`std::net::Ipv4Addr::from` recovers dotted form). Ports are present only
/// for TCP and UDP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeaders {
    pub ether_type: u16,
    pub src_addr: u32,
    pub dst_addr: u32,
    pub protocol: u8,
    pub ip_header_len: usize,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
}

impl ParsedHeaders {
    pub fn is_tcp(&self) -> bool {
        self.protocol == PROTOCOL_TCP
    }

    pub fn is_udp(&self) -> bool {
        self.protocol == PROTOCOL_UDP
    }
}

fn read_u16(frame: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([frame[offset], frame[offset + 1]])
}

fn read_u32(frame: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        frame[offset],
        frame[offset + 1],
        frame[offset + 2],
        frame[offset + 3],
    ])
}

/// Validate and extract Ethernet/IPv4/TCP/UDP headers from a raw frame.
///
/// Returns `None` when the frame is not IPv4 or any required byte range falls
/// outside the frame: an Ethernet header that does not fit, an IPv4 header
/// shorter than its declared IHL, a declared IHL below the 20-byte minimum,
/// or a TCP/UDP header truncated at `ETHERNET_HEADER_SIZE + ihl`. Protocols
/// other than TCP and UDP parse successfully with no ports.
pub fn parse_frame(frame: &[u8]) -> Option<ParsedHeaders> {
    if frame.len() < ETHERNET_HEADER_SIZE {
        return None;
    }

    let ether_type = read_u16(frame, ETHERTYPE_OFFSET);
    if ether_type != ETHERTYPE_IPV4 {
        return None;
    }

    let ip_offset = ETHERNET_HEADER_SIZE;
    if frame.len() < ip_offset + IP_HEADER_MIN_SIZE {
        return None;
    }

    let ip_header_len = ((frame[ip_offset] & IP_IHL_MASK) as usize) * 4;
    if ip_header_len < IP_HEADER_MIN_SIZE || frame.len() < ip_offset + ip_header_len {
        return None;
    }

    let protocol = frame[ip_offset + IP_PROTOCOL_OFFSET];
    let src_addr = read_u32(frame, ip_offset + IP_SRC_ADDR_OFFSET);
    let dst_addr = read_u32(frame, ip_offset + IP_DST_ADDR_OFFSET);

    let l4_offset = ip_offset + ip_header_len;
    let transport_len = match protocol {
        PROTOCOL_TCP => Some(TCP_HEADER_MIN_SIZE),
        PROTOCOL_UDP => Some(UDP_HEADER_SIZE),
        _ => None,
    };

    let (src_port, dst_port) = match transport_len {
        Some(min_len) => {
            if frame.len() < l4_offset + min_len {
                return None;
            }
            (
                Some(read_u16(frame, l4_offset)),
                Some(read_u16(frame, l4_offset + DST_PORT_OFFSET)),
            )
        }
        None => (None, None),
    };

    Some(ParsedHeaders {
        ether_type,
        src_addr,
        dst_addr,
        protocol,
        ip_header_len,
        src_port,
        dst_port,
    })
}
