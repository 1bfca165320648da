use bytemuck::{Pod, Zeroable};

use super::*;

/// The types of color that PNG supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PngColorType {
  /// Greyscale
  Y = 0,
  /// Red, Green, Blue
  RGB = 2,
  /// Index into a palette.
  Index = 3,
  /// Greyscale + Alpha
  YA = 4,
  /// Red, Green, Blue, Alpha
  RGBA = 6,
}
impl PngColorType {
  /// The number of channels in this type of color.
  #[inline]
  #[must_use]
  pub const fn channel_count(self) -> u8 {
    match self {
      Self::Y => 1,
      Self::RGB => 3,
      Self::Index => 1,
      Self::YA => 2,
      Self::RGBA => 4,
    }
  }

  /// Whole bytes per pixel at the given bit depth.
  ///
  /// Indexed color is always 1. For the others this is `0` when the bit depth
  /// is less than 8.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self, bit_depth: u8) -> u8 {
    match self {
      Self::Index => 1,
      _ => self.channel_count().saturating_mul(bit_depth / 8),
    }
  }
}
impl TryFrom<u8> for PngColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => PngColorType::Y,
      2 => PngColorType::RGB,
      3 => PngColorType::Index,
      4 => PngColorType::YA,
      6 => PngColorType::RGBA,
      other => return Err(PngError::UnsupportedColorType(other)),
    })
  }
}

/// The part of the image header that unfiltering depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageGeometry {
  /// width in pixels, never 0
  pub width: u32,
  /// height in pixels, never 0
  pub height: u32,
  /// never 0
  pub bytes_per_pixel: u8,
}
impl ImageGeometry {
  /// Builds a geometry, rejecting zero values.
  pub const fn new(width: u32, height: u32, bytes_per_pixel: u8) -> PngResult<Self> {
    if width == 0 || height == 0 {
      return Err(PngError::ImageDimensionsZero);
    }
    if bytes_per_pixel == 0 {
      return Err(PngError::UnsupportedBitDepth(0));
    }
    Ok(Self { width, height, bytes_per_pixel })
  }

  /// Bytes of pixel data per scanline, not counting the filter byte.
  #[inline]
  pub fn stride(&self) -> PngResult<usize> {
    (self.width as usize)
      .checked_mul(usize::from(self.bytes_per_pixel))
      .ok_or(PngError::CheckedMath)
  }

  /// Bytes of decompressed data the image needs: a filter byte plus one
  /// stride of pixel data, for every scanline.
  #[inline]
  pub fn filtered_len(&self) -> PngResult<usize> {
    self
      .stride()?
      .checked_add(1)
      .and_then(|line| line.checked_mul(self.height as usize))
      .ok_or(PngError::CheckedMath)
  }

  /// Bytes of output once the filter bytes are gone.
  #[inline]
  pub fn unfiltered_len(&self) -> PngResult<usize> {
    self.stride()?.checked_mul(self.height as usize).ok_or(PngError::CheckedMath)
  }
}

/// The leading fields of an `IHDR` payload, as stored.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct IhdrPrefix {
  width: [u8; 4],
  height: [u8; 4],
  bit_depth: u8,
  color_type: u8,
}

/// Image Header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageHeader {
  pub geometry: ImageGeometry,
  /// bits per channel
  pub bit_depth: u8,
  /// pixel color type
  pub color_type: PngColorType,
  /// if the image data is stored interlaced.
  pub is_interlaced: bool,
}
impl TryFrom<&[u8]> for ImageHeader {
  type Error = PngError;
  /// Parses an `IHDR` payload.
  ///
  /// Only the first 10 bytes are required. The compression and filter method
  /// bytes are ignored, and a missing interlace byte means "not interlaced".
  fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
    let prefix_bytes =
      data.get(..core::mem::size_of::<IhdrPrefix>()).ok_or(PngError::MalformedIHDR)?;
    let prefix: IhdrPrefix = bytemuck::pod_read_unaligned(prefix_bytes);
    let color_type = PngColorType::try_from(prefix.color_type)?;
    let bytes_per_pixel = color_type.bytes_per_pixel(prefix.bit_depth);
    if bytes_per_pixel == 0 {
      return Err(PngError::UnsupportedBitDepth(prefix.bit_depth));
    }
    let geometry = ImageGeometry::new(
      u32::from_be_bytes(prefix.width),
      u32::from_be_bytes(prefix.height),
      bytes_per_pixel,
    )?;
    Ok(Self {
      geometry,
      bit_depth: prefix.bit_depth,
      color_type,
      is_interlaced: data.get(12) == Some(&1),
    })
  }
}

/// Finds the `IHDR` (with strict framing) and parses it.
///
/// Chunks before the `IHDR` are stepped over without looking at their
/// payloads. If framing breaks before an `IHDR` turns up, that structural
/// error is what you get back.
pub fn extract_header(bytes: &[u8]) -> PngResult<ImageHeader> {
  for chunk in SequentialChunks::from_png_bytes(bytes)? {
    let chunk = chunk?;
    if chunk.ty() == PngChunkTy::IHDR {
      let header = ImageHeader::try_from(chunk.data())?;
      log::debug!("found IHDR: {header:?}");
      return Ok(header);
    }
  }
  Err(PngError::MissingIHDR)
}

/// Finds the `IHDR` and gives back the image geometry.
#[inline]
pub fn extract_geometry(bytes: &[u8]) -> PngResult<ImageGeometry> {
  extract_header(bytes).map(|header| header.geometry)
}

#[test]
fn test_bytes_per_pixel_by_color_type() {
  use PngColorType::*;
  assert_eq!(Y.bytes_per_pixel(8), 1);
  assert_eq!(Y.bytes_per_pixel(16), 2);
  assert_eq!(Y.bytes_per_pixel(4), 0);
  assert_eq!(RGB.bytes_per_pixel(8), 3);
  assert_eq!(RGB.bytes_per_pixel(16), 6);
  assert_eq!(Index.bytes_per_pixel(8), 1);
  assert_eq!(Index.bytes_per_pixel(2), 1);
  assert_eq!(YA.bytes_per_pixel(8), 2);
  assert_eq!(YA.bytes_per_pixel(16), 4);
  assert_eq!(RGBA.bytes_per_pixel(8), 4);
  assert_eq!(RGBA.bytes_per_pixel(16), 8);
}

#[test]
fn test_ihdr_payload_parse() {
  let payload: [u8; 13] = [0, 0, 1, 0, 0, 0, 0, 3, 8, 6, 0, 0, 0];
  let header = ImageHeader::try_from(&payload[..]).unwrap();
  assert_eq!(header.geometry, ImageGeometry { width: 256, height: 3, bytes_per_pixel: 4 });
  assert_eq!(header.color_type, PngColorType::RGBA);
  assert!(!header.is_interlaced);

  // only the first 10 bytes are needed
  let header = ImageHeader::try_from(&payload[..10]).unwrap();
  assert_eq!(header.geometry.width, 256);

  assert_eq!(ImageHeader::try_from(&payload[..9]), Err(PngError::MalformedIHDR));
  let bad_color: [u8; 10] = [0, 0, 0, 1, 0, 0, 0, 1, 8, 5];
  assert_eq!(ImageHeader::try_from(&bad_color[..]), Err(PngError::UnsupportedColorType(5)));
  let low_depth: [u8; 10] = [0, 0, 0, 1, 0, 0, 0, 1, 4, 0];
  assert_eq!(ImageHeader::try_from(&low_depth[..]), Err(PngError::UnsupportedBitDepth(4)));
  let zero_wide: [u8; 10] = [0, 0, 0, 0, 0, 0, 0, 1, 8, 0];
  assert_eq!(ImageHeader::try_from(&zero_wide[..]), Err(PngError::ImageDimensionsZero));
  let interlaced: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 1];
  assert!(ImageHeader::try_from(&interlaced[..]).unwrap().is_interlaced);
}

#[test]
fn test_geometry_lengths() {
  let g = ImageGeometry::new(3, 2, 4).unwrap();
  assert_eq!(g.stride(), Ok(12));
  assert_eq!(g.filtered_len(), Ok(26));
  assert_eq!(g.unfiltered_len(), Ok(24));
  assert_eq!(ImageGeometry::new(0, 2, 4), Err(PngError::ImageDimensionsZero));
  assert_eq!(ImageGeometry::new(1, 1, 0), Err(PngError::UnsupportedBitDepth(0)));
}
