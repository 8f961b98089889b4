//! CTB framing round trips (spec §4.6 / §8 universal invariants).

use std::io::Cursor;

use pgplib::packet::{read_body, read_header, write_header, PacketType};

fn round_trip(ptype: PacketType, body_len: u64, indefinite: bool) -> (Vec<u8>, Option<u64>) {
    let mut buf = Vec::new();
    write_header(&mut buf, ptype, body_len, indefinite).unwrap();
    let header_len = buf.len();
    let mut cursor = Cursor::new(&buf[..]);
    let header = read_header(&mut cursor).unwrap();
    assert_eq!(header.ptype, ptype);
    assert_eq!(cursor.position() as usize, header_len);
    (buf, header.len)
}

#[test]
fn one_byte_length_round_trips() {
    let (_, len) = round_trip(PacketType::Pke, 42, false);
    assert_eq!(len, Some(42));
}

#[test]
fn two_byte_length_round_trips() {
    let (_, len) = round_trip(PacketType::Cke, 300, false);
    assert_eq!(len, Some(300));
}

#[test]
fn four_byte_length_round_trips() {
    let (_, len) = round_trip(PacketType::Compressed, 70_000, false);
    assert_eq!(len, Some(70_000));
}

#[test]
fn indefinite_length_reads_to_eof() {
    let mut buf = Vec::new();
    write_header(&mut buf, PacketType::Literal, 5, true).unwrap();
    buf.extend_from_slice(b"hello");
    let mut cursor = Cursor::new(&buf[..]);
    let header = read_header(&mut cursor).unwrap();
    assert_eq!(header.len, None);
    let body = read_body(&mut cursor, header.len).unwrap();
    assert_eq!(body, b"hello");
}

#[test]
fn ctb_high_bit_is_set_and_length_selector_matches_table() {
    let mut buf = Vec::new();
    write_header(&mut buf, PacketType::Literal, 70_000, false).unwrap();
    // type = 12, length_selector = 2 (four-byte): 0x80 | (12 << 2) | 2
    assert_eq!(buf[0], 0xB2);
}

#[test]
fn every_packet_type_round_trips_its_own_tag() {
    for ptype in [
        PacketType::Pke,
        PacketType::Ske,
        PacketType::Md,
        PacketType::Conkey,
        PacketType::CertSeckey,
        PacketType::CertPubkey,
        PacketType::Compressed,
        PacketType::Cke,
        PacketType::Literal,
    ] {
        round_trip(ptype, 1, false);
    }
}

#[test]
fn malformed_ctb_without_high_bit_is_rejected() {
    let buf = [0x12u8];
    let mut cursor = Cursor::new(&buf[..]);
    assert!(read_header(&mut cursor).is_err());
}
