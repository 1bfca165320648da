use core::fmt::{Debug, Write};

use crate::crc32::Crc32Config;

use super::*;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the PNG's initial 8 bytes are correct.
///
/// * If this is the case, the rest of the bytes are very likely PNG data.
/// * If this is *not* the case, the rest of the bytes are very likely *not* PNG
///   data.
#[inline]
#[must_use]
pub const fn is_png_header_correct(bytes: &[u8]) -> bool {
  matches!(bytes, [137, 80, 78, 71, 13, 10, 26, 10, ..])
}

/// Splits the signature off the front of the bytes, or errors.
#[inline]
pub(crate) fn strip_signature(bytes: &[u8]) -> PngResult<&[u8]> {
  if is_png_header_correct(bytes) {
    Ok(&bytes[PNG_SIGNATURE.len()..])
  } else {
    Err(PngError::InvalidSignature)
  }
}

/// A chunk's four byte type tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngChunkTy(pub [u8; 4]);
impl PngChunkTy {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");

  #[inline]
  #[must_use]
  pub const fn as_bytes(&self) -> &[u8; 4] {
    &self.0
  }
}
impl Debug for PngChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    for byte in self.0 {
      f.write_char(if byte.is_ascii_graphic() { byte as char } else { '?' })?;
    }
    Ok(())
  }
}

/// One chunk, borrowed from the PNG bytes.
///
/// The payload is never interpreted here, so this works for any chunk type,
/// including ones this crate knows nothing about.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PngChunk<'b> {
  pub(crate) ty: PngChunkTy,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl Debug for PngChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl<'b> PngChunk<'b> {
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> PngChunkTy {
    self.ty
  }

  /// The chunk payload, not including the length, type, or CRC.
  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }

  /// The length field as it was in the file.
  ///
  /// This always equals `data().len()`, since a chunk is only produced once
  /// that many bytes were actually present.
  #[inline]
  #[must_use]
  pub const fn declared_len(&self) -> u32 {
    self.data.len() as u32
  }

  /// The CRC stored after the payload.
  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }

  /// The stored CRC as the four bytes that followed the payload.
  #[inline]
  #[must_use]
  pub const fn declared_crc_bytes(&self) -> [u8; 4] {
    self.declared_crc.to_be_bytes()
  }

  /// Computes the CRC over the type tag and payload.
  #[inline]
  #[must_use]
  pub fn compute_actual_crc(&self) -> u32 {
    Crc32Config::REVERSED.checksum_iter(self.ty.0.iter().chain(self.data.iter()).copied())
  }

  /// Errors with [`PngError::CrcMismatch`] if the stored CRC is wrong.
  pub fn verify_crc(&self) -> PngResult<()> {
    let actual = self.compute_actual_crc();
    if actual == self.declared_crc {
      Ok(())
    } else {
      Err(PngError::CrcMismatch { ty: self.ty, declared: self.declared_crc, actual })
    }
  }
}

#[test]
fn test_chunk_crc() {
  let chunk = PngChunk { ty: PngChunkTy::IEND, data: &[], declared_crc: 0xAE42_6082 };
  assert_eq!(chunk.compute_actual_crc(), 0xAE42_6082);
  assert_eq!(chunk.verify_crc(), Ok(()));
  assert_eq!(chunk.declared_crc_bytes(), [0xAE, 0x42, 0x60, 0x82]);

  let bad = PngChunk { declared_crc: 1, ..chunk };
  assert_eq!(
    bad.verify_crc(),
    Err(PngError::CrcMismatch { ty: PngChunkTy::IEND, declared: 1, actual: 0xAE42_6082 })
  );
}

#[test]
fn test_png_signature_check() {
  assert!(is_png_header_correct(&PNG_SIGNATURE));
  assert!(is_png_header_correct(b"\x89PNG\r\n\x1a\nmore"));
  assert!(!is_png_header_correct(b"\x89PNG\r\n\x1a"));
  assert!(!is_png_header_correct(b"GIF89a.."));
  assert_eq!(strip_signature(b"\x89PNG\r\n\x1a\nabc"), Ok(&b"abc"[..]));
  assert_eq!(strip_signature(b"nope"), Err(PngError::InvalidSignature));
}
