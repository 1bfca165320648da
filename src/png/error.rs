use core::fmt;

use super::PngChunkTy;

/// An error while pulling image data out of PNG bytes.
///
/// Structural errors from a chunk scan ([`TruncatedChunk`](Self::TruncatedChunk)
/// and [`MissingLengthPrefix`](Self::MissingLengthPrefix)) stop the scan, but
/// the scan still hands back whatever chunks were complete before that point.
/// Everything else is fatal to the call that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PngError {
  /// The first 8 bytes aren't the PNG signature.
  InvalidSignature,

  /// A chunk claims more bytes than the buffer has left.
  ///
  /// `offset` is where the chunk's length field starts.
  TruncatedChunk { offset: usize },

  /// A chunk type tag was found too close to the start of the buffer to have
  /// a length field in front of it.
  MissingLengthPrefix { offset: usize },

  /// No `IHDR` chunk before the end of the data.
  MissingIHDR,

  /// The `IHDR` chunk is too short to hold the image dimensions.
  MalformedIHDR,

  /// The `IHDR` names a color type PNG doesn't define.
  UnsupportedColorType(u8),

  /// The bit depth packs more than one pixel per byte, which scanline
  /// geometry here can't express.
  UnsupportedBitDepth(u8),

  /// The declared width and/or height of this image is 0.
  ImageDimensionsZero,

  /// The image data is Adam7 interlaced.
  InterlaceNotSupported,

  /// The decompressed data ran out partway through scanline `row`.
  TruncatedScanline { row: u32 },

  /// Scanline `row` starts with a filter byte that isn't 0 through 4.
  UnknownFilterType { row: u32, filter: u8 },

  /// The output buffer can't hold `width * height * bytes_per_pixel` bytes.
  OutputBufferTooSmall,

  /// A checked math operation failed.
  CheckedMath,

  /// The allocator couldn't give us enough space.
  Alloc,

  /// A chunk's trailing checksum doesn't match its contents.
  CrcMismatch { ty: PngChunkTy, declared: u32, actual: u32 },

  /// The inflate step rejected the compressed stream.
  Decompression,
}

impl fmt::Display for PngError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidSignature => f.write_str("not a PNG: bad signature"),
      Self::TruncatedChunk { offset } => write!(f, "chunk at offset {offset} is truncated"),
      Self::MissingLengthPrefix { offset } => {
        write!(f, "chunk tag at offset {offset} has no length field before it")
      }
      Self::MissingIHDR => f.write_str("no IHDR chunk found"),
      Self::MalformedIHDR => f.write_str("IHDR chunk is too short"),
      Self::UnsupportedColorType(c) => write!(f, "unsupported color type: {c}"),
      Self::UnsupportedBitDepth(b) => write!(f, "unsupported bit depth: {b}"),
      Self::ImageDimensionsZero => f.write_str("image width or height is 0"),
      Self::InterlaceNotSupported => f.write_str("interlaced images are not supported"),
      Self::TruncatedScanline { row } => write!(f, "scanline {row} is truncated"),
      Self::UnknownFilterType { row, filter } => {
        write!(f, "scanline {row} has unknown filter type {filter}")
      }
      Self::OutputBufferTooSmall => f.write_str("output buffer is too small for the image"),
      Self::CheckedMath => f.write_str("image dimensions overflow"),
      Self::Alloc => f.write_str("allocation failed"),
      Self::CrcMismatch { ty, declared, actual } => {
        write!(f, "{ty:?} chunk CRC mismatch: declared {declared:08x}, actual {actual:08x}")
      }
      Self::Decompression => f.write_str("failed to decompress IDAT data"),
    }
  }
}

/// Shorthand for results with a [`PngError`].
pub type PngResult<T> = Result<T, PngError>;

#[cfg(feature = "alloc")]
impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}
