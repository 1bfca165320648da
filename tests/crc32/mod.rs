use idat_unbuilder::crc32::*;

#[test]
fn test_crc32_is_deterministic() {
  for len in [0, 1, 7, 64, 1000] {
    let v = super::rand_bytes(len);
    assert_eq!(crc32_reflected(&v), crc32_reflected(&v));
    assert_eq!(Crc32Config::STANDARD.checksum(&v), Crc32Config::STANDARD.checksum(&v));
  }
}

#[test]
fn test_crc32_reflected_matches_png_chunk_crcs() {
  let chunk = super::make_chunk(b"IDAT", b"some payload bytes");
  let (body, crc) = chunk.split_at(chunk.len() - 4);
  assert_eq!(crc32_reflected(&body[4..]), u32::from_be_bytes(crc.try_into().unwrap()));
}

#[test]
fn test_crc32_detects_single_bit_flips() {
  let v = super::rand_bytes(256);
  let base = crc32_reflected(&v);
  let base_std = Crc32Config::STANDARD.checksum(&v);
  for bit in [0, 7, 100, 2047] {
    let mut flipped = v.clone();
    flipped[bit / 8] ^= 1 << (bit % 8);
    assert_ne!(crc32_reflected(&flipped), base, "bit {bit}");
    assert_ne!(Crc32Config::STANDARD.checksum(&flipped), base_std, "bit {bit}");
  }
}

#[test]
fn test_custom_polynomial_from_text() {
  let poly = parse_polynomial("0x82F63B78").unwrap();
  assert_eq!(Crc32Config::custom(poly).checksum(b"123456789"), 0xE306_9283);
  assert_eq!(crc32(b"123456789", poly, u32::MAX, BitOrder::Reflected), 0xE306_9283);
}
