#![forbid(unsafe_code)]

//! A general purpose CRC32 calculator.
//!
//! Nothing in here knows about PNG. The [`Crc32Config::REVERSED`] preset
//! happens to be the checksum that PNG (and zlib, and ZIP) use, so the PNG
//! code can verify chunk checksums with it, but any polynomial works.
//!
//! The calculation is done bit by bit, without a lookup table, so that an
//! arbitrary runtime polynomial costs nothing extra to set up.

use core::num::ParseIntError;

/// Which end of the register the input bytes are shifted in from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BitOrder {
  /// Each byte goes into the top 8 bits and the register shifts left.
  Forward,
  /// Each byte goes into the low 8 bits and the register shifts right.
  Reflected,
}

/// A polynomial, starting value, and bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Crc32Config {
  /// The generator polynomial, in the bit order given by `bit_order`.
  pub polynomial: u32,
  /// Starting register value. The final register is also xor-ed with this.
  pub initial_value: u32,
  /// Direction the register shifts.
  pub bit_order: BitOrder,
}
impl Crc32Config {
  /// Forward bit order with polynomial `0x04C11DB7`.
  pub const STANDARD: Self =
    Self { polynomial: 0x04C1_1DB7, initial_value: u32::MAX, bit_order: BitOrder::Forward };

  /// Reflected bit order with polynomial `0xEDB88320`.
  ///
  /// This is the zlib / PNG / ZIP checksum.
  pub const REVERSED: Self =
    Self { polynomial: 0xEDB8_8320, initial_value: u32::MAX, bit_order: BitOrder::Reflected };

  /// Reflected bit order with a polynomial of your choosing.
  ///
  /// The polynomial must already be in reflected form (eg: CRC-32C is
  /// `0x82F63B78`).
  #[inline]
  #[must_use]
  pub const fn custom(polynomial: u32) -> Self {
    Self { polynomial, initial_value: u32::MAX, bit_order: BitOrder::Reflected }
  }

  /// Checksums a byte slice.
  #[inline]
  #[must_use]
  pub fn checksum(&self, data: &[u8]) -> u32 {
    self.checksum_iter(data.iter().copied())
  }

  /// Checksums any sequence of bytes.
  ///
  /// Handy when the bytes aren't contiguous, such as a PNG chunk's type tag
  /// followed by its payload.
  pub fn checksum_iter(&self, bytes: impl IntoIterator<Item = u8>) -> u32 {
    let mut crc = self.initial_value;
    match self.bit_order {
      BitOrder::Forward => {
        for byte in bytes {
          crc ^= u32::from(byte) << 24;
          for _ in 0..8 {
            crc = if (crc & 0x8000_0000) != 0 { (crc << 1) ^ self.polynomial } else { crc << 1 };
          }
        }
      }
      BitOrder::Reflected => {
        for byte in bytes {
          crc ^= u32::from(byte);
          for _ in 0..8 {
            crc = if (crc & 1) != 0 { (crc >> 1) ^ self.polynomial } else { crc >> 1 };
          }
        }
      }
    }
    crc ^ self.initial_value
  }
}

/// Computes a CRC32 with every parameter given explicitly.
#[inline]
#[must_use]
pub fn crc32(data: &[u8], polynomial: u32, initial_value: u32, bit_order: BitOrder) -> u32 {
  Crc32Config { polynomial, initial_value, bit_order }.checksum(data)
}

/// The zlib / PNG checksum of some bytes.
#[inline]
#[must_use]
pub fn crc32_reflected(data: &[u8]) -> u32 {
  Crc32Config::REVERSED.checksum(data)
}

/// Parses a polynomial written in hex, with or without a `0x` prefix.
pub fn parse_polynomial(text: &str) -> Result<u32, ParseIntError> {
  let text = text.trim();
  let digits = text
    .strip_prefix("0x")
    .or_else(|| text.strip_prefix("0X"))
    .unwrap_or(text);
  u32::from_str_radix(digits, 16)
}

#[test]
fn test_crc32_check_values() {
  assert_eq!(crc32_reflected(b"123456789"), 0xCBF4_3926);
  assert_eq!(Crc32Config::STANDARD.checksum(b"123456789"), 0xFC89_1918);
  assert_eq!(Crc32Config::custom(0x82F6_3B78).checksum(b"123456789"), 0xE306_9283);
}

#[test]
fn test_crc32_empty_input() {
  assert_eq!(crc32_reflected(b""), 0);
  assert_eq!(Crc32Config::STANDARD.checksum(b""), 0);
}

#[test]
fn test_crc32_explicit_matches_presets() {
  let data = b"IEND";
  assert_eq!(crc32(data, 0xEDB8_8320, u32::MAX, BitOrder::Reflected), 0xAE42_6082);
  assert_eq!(
    crc32(data, 0x04C1_1DB7, u32::MAX, BitOrder::Forward),
    Crc32Config::STANDARD.checksum(data)
  );
  assert_eq!(Crc32Config::custom(0xEDB8_8320), Crc32Config::REVERSED);
}

#[test]
fn test_crc32_iter_matches_slice() {
  let ty = *b"IDAT";
  let payload = [0x78, 0x9C, 0x63, 0x00, 0x00];
  let joined = *b"IDAT\x78\x9C\x63\x00\x00";
  assert_eq!(
    Crc32Config::REVERSED.checksum_iter(ty.iter().copied().chain(payload.iter().copied())),
    crc32_reflected(&joined)
  );
}

#[test]
fn test_parse_polynomial() {
  assert_eq!(parse_polynomial("0x82F63B78"), Ok(0x82F6_3B78));
  assert_eq!(parse_polynomial("1edc6f41"), Ok(0x1EDC_6F41));
  assert_eq!(parse_polynomial(" 0XEDB88320 "), Ok(0xEDB8_8320));
  assert!(parse_polynomial("0xZZ").is_err());
  assert!(parse_polynomial("").is_err());
  assert!(parse_polynomial("0x1_0000_0000").is_err());
}
