// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bit-exact CDR wire format tests.

use cdrcodec::{CdrBuffer, CdrCodec, CdrFlavor, Endianness, PlFlag};

// ============================================================================
// Primitive layout
// ============================================================================

#[test]
fn test_plain_little_endian_i32() {
    let mut buffer = CdrBuffer::with_capacity(8);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_i32(0x0A0B_0C0D).expect("serialize i32");

    assert_eq!(codec.data(), &[0x0D, 0x0C, 0x0B, 0x0A]);
    assert_eq!(codec.position(), 4);
    assert_eq!(codec.last_data_size(), 4);
}

#[test]
fn test_plain_big_endian_padding_before_i32() {
    let mut buffer = CdrBuffer::with_capacity(8);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Big, CdrFlavor::Plain);
    codec.serialize_i8(0x11).expect("serialize i8");
    codec.serialize_i32(0x2233_4455).expect("serialize i32");

    assert_eq!(
        codec.data(),
        &[0x11, 0x00, 0x00, 0x00, 0x22, 0x33, 0x44, 0x55]
    );
}

#[test]
fn test_u64_alignment_at_offset_four() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_u32(1).expect("serialize u32");
    codec.serialize_u64(2).expect("serialize u64");

    // 4 bytes of padding between the u32 and the 8-aligned u64.
    assert_eq!(codec.position(), 16);
    assert_eq!(&codec.data()[4..8], &[0x00, 0x00, 0x00, 0x00]);
    assert_eq!(&codec.data()[8..10], &[0x02, 0x00]);
}

#[test]
fn test_boolean_wire_bytes() {
    let mut buffer = CdrBuffer::with_capacity(4);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_bool(true).expect("serialize bool");
    codec.serialize_bool(false).expect("serialize bool");

    assert_eq!(codec.data(), &[0x01, 0x00]);
}

// ============================================================================
// Encapsulation headers
// ============================================================================

#[test]
fn test_dds_little_endian_with_pl_header() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Dds);
    codec.set_pl_flag(PlFlag::WithPl);
    codec.set_options(0xBEEF);
    codec.serialize_encapsulation().expect("serialize header");
    codec.serialize_i16(0x1234).expect("serialize i16");

    // Dummy, kind (PL | little), options LE, then the i16 at anchor
    // offset 0 with no padding.
    assert_eq!(codec.data(), &[0x00, 0x03, 0xEF, 0xBE, 0x34, 0x12]);
}

#[test]
fn test_dds_big_endian_header() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Big, CdrFlavor::Dds);
    codec.set_options(0xBEEF);
    codec.serialize_encapsulation().expect("serialize header");

    assert_eq!(codec.data(), &[0x00, 0x00, 0xBE, 0xEF]);
}

#[test]
fn test_plain_header_is_kind_byte_only() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_encapsulation().expect("serialize header");

    assert_eq!(codec.data(), &[0x01]);
}

#[test]
fn test_header_resets_alignment_anchor() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Dds);
    codec.serialize_encapsulation().expect("serialize header");
    codec.serialize_u8(0xAA).expect("serialize u8");
    codec.serialize_u32(0x0102_0304).expect("serialize u32");

    // Anchor is 4, so the u32 at offset 5 pads to offset 8.
    assert_eq!(
        codec.data(),
        &[0x00, 0x01, 0x00, 0x00, 0xAA, 0x00, 0x00, 0x00, 0x04, 0x03, 0x02, 0x01]
    );
}

// ============================================================================
// Strings, arrays, sequences
// ============================================================================

#[test]
fn test_string_length_includes_terminator() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_string("hi").expect("serialize string");

    assert_eq!(codec.data(), &[0x03, 0x00, 0x00, 0x00, 0x68, 0x69, 0x00]);
}

#[test]
fn test_string_bytes_variant_matches_str_form() {
    let mut buffer_a = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer_a, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_string("hi").expect("serialize string");
    let expected = codec.data().to_vec();

    let mut buffer_b = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer_b, Endianness::Little, CdrFlavor::Plain);
    codec
        .serialize_string_bytes(b"hi")
        .expect("serialize string bytes");
    assert_eq!(codec.data(), &expected[..]);
}

#[test]
fn test_string_big_endian_length_prefix() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Big, CdrFlavor::Plain);
    codec.serialize_string("hi").expect("serialize string");

    assert_eq!(codec.data(), &[0x00, 0x00, 0x00, 0x03, 0x68, 0x69, 0x00]);
}

#[test]
fn test_read_string_reports_logical_length() {
    let mut buffer = CdrBuffer::from_vec(vec![0x03, 0x00, 0x00, 0x00, 0x68, 0x69, 0x00]);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    let (bytes, logical) = codec.read_string().expect("read string");

    assert_eq!(bytes, &[0x68, 0x69, 0x00]);
    assert_eq!(logical, 2);
}

#[test]
fn test_read_string_without_terminator() {
    // The last payload byte is not NUL: the logical length is the full
    // region.
    let mut buffer = CdrBuffer::from_vec(vec![0x02, 0x00, 0x00, 0x00, 0x68, 0x69]);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    let (bytes, logical) = codec.read_string().expect("read string");

    assert_eq!(bytes, &[0x68, 0x69]);
    assert_eq!(logical, 2);
}

#[test]
fn test_array_elements_are_packed() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_u8(0xAA).expect("serialize u8");
    codec
        .serialize_u16_array(&[0x0102, 0x0304])
        .expect("serialize array");

    // One byte of padding before the first element, none between.
    assert_eq!(codec.data(), &[0xAA, 0x00, 0x02, 0x01, 0x04, 0x03]);
}

#[test]
fn test_bool_sequence_layout() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec
        .serialize_bool_sequence(&[true, false, true])
        .expect("serialize sequence");

    assert_eq!(codec.data(), &[0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01]);
}

#[test]
fn test_f128_array_strides() {
    let mut buffer = CdrBuffer::with_capacity(64);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_u8(0).expect("serialize u8");
    codec.serialize_f128_array(&[1, 2]).expect("serialize array");

    // 1 byte, 7 bytes padding to alignment 8, then two 16-byte strides.
    assert_eq!(codec.position(), 40);
    assert_eq!(codec.data()[8], 0x01);
    assert_eq!(codec.data()[24], 0x02);
}

#[test]
fn test_wchar_encodes_as_u32() {
    let mut buffer = CdrBuffer::with_capacity(16);
    let mut codec = CdrCodec::new(&mut buffer, Endianness::Little, CdrFlavor::Plain);
    codec.serialize_wchar('A').expect("serialize wchar");

    assert_eq!(codec.data(), &[0x41, 0x00, 0x00, 0x00]);
    assert_eq!(codec.last_data_size(), 4);
}
