//! Synthetic Ethernet frame construction for demos, benchmarks, and tests.
//!
//! Builders emit well-formed Ethernet/IPv4 frames with the minimum TCP or
//! UDP header; checksums are filled in so the frames also survive stricter
//! consumers, though the engine itself never validates them.

const SRC_MAC: [u8; 6] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
const DST_MAC: [u8; 6] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

const ETHERTYPE_IPV4: u16 = 0x0800;
const PROTOCOL_TCP: u8 = 6;
const PROTOCOL_UDP: u8 = 17;

fn push_ethernet(frame: &mut Vec<u8>) {
    frame.extend_from_slice(&DST_MAC);
    frame.extend_from_slice(&SRC_MAC);
    frame.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
}

fn push_ipv4(frame: &mut Vec<u8>, protocol: u8, src_ip: [u8; 4], dst_ip: [u8; 4]) {
    frame.push(0x45); // Version 4, IHL 5
    frame.push(0x00); // TOS
    frame.extend_from_slice(&0u16.to_be_bytes()); // Total length, patched below
    frame.extend_from_slice(&0u16.to_be_bytes()); // ID
    frame.extend_from_slice(&0x4000u16.to_be_bytes()); // Flags (DF) + fragment offset
    frame.push(64); // TTL
    frame.push(protocol);
    frame.extend_from_slice(&0u16.to_be_bytes()); // Checksum, patched below
    frame.extend_from_slice(&src_ip);
    frame.extend_from_slice(&dst_ip);
}

fn finalize_ipv4(frame: &mut Vec<u8>) {
    let total_len = (frame.len() - 14) as u16;
    frame[16..18].copy_from_slice(&total_len.to_be_bytes());
    let checksum = ip_checksum(&frame[14..34]);
    frame[24..26].copy_from_slice(&checksum.to_be_bytes());
}

/// An IPv4/TCP frame with a minimal 20-byte TCP header.
pub fn tcp_frame(
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(54 + payload.len());
    push_ethernet(&mut frame);
    push_ipv4(&mut frame, PROTOCOL_TCP, src_ip, dst_ip);

    frame.extend_from_slice(&src_port.to_be_bytes());
    frame.extend_from_slice(&dst_port.to_be_bytes());
    frame.extend_from_slice(&0u32.to_be_bytes()); // Seq
    frame.extend_from_slice(&0u32.to_be_bytes()); // Ack
    frame.push(0x50); // Data offset 5
    frame.push(0x00); // Flags
    frame.extend_from_slice(&0x4000u16.to_be_bytes()); // Window
    frame.extend_from_slice(&0u16.to_be_bytes()); // Checksum (unused)
    frame.extend_from_slice(&0u16.to_be_bytes()); // Urgent pointer

    frame.extend_from_slice(payload);
    finalize_ipv4(&mut frame);
    frame
}

/// An IPv4/UDP frame with the fixed 8-byte UDP header.
pub fn udp_frame(
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::with_capacity(42 + payload.len());
    push_ethernet(&mut frame);
    push_ipv4(&mut frame, PROTOCOL_UDP, src_ip, dst_ip);

    frame.extend_from_slice(&src_port.to_be_bytes());
    frame.extend_from_slice(&dst_port.to_be_bytes());
    let udp_len = 8 + payload.len() as u16;
    frame.extend_from_slice(&udp_len.to_be_bytes());
    frame.extend_from_slice(&0u16.to_be_bytes()); // Checksum (unused)

    frame.extend_from_slice(payload);
    finalize_ipv4(&mut frame);
    frame
}

/// An IPv4 frame carrying an arbitrary protocol number and raw payload,
/// with no transport header.
pub fn ipv4_frame(protocol: u8, src_ip: [u8; 4], dst_ip: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(34 + payload.len());
    push_ethernet(&mut frame);
    push_ipv4(&mut frame, protocol, src_ip, dst_ip);
    frame.extend_from_slice(payload);
    finalize_ipv4(&mut frame);
    frame
}

fn ip_checksum(header: &[u8]) -> u16 {
    let mut sum = 0u32;
    for chunk in header.chunks(2) {
        if chunk.len() == 2 {
            sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        }
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !sum as u16
}
