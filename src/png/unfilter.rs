//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Every filter except None and Up reads bytes of the *current* line that
//! were only just reconstructed, so each line is rebuilt left to right one
//! byte at a time.

use super::*;

/// The per-scanline filter methods of PNG filter method 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FilterType {
  /// The bytes are stored as-is.
  None = 0,
  /// Each byte is stored as the difference from the byte one pixel to the
  /// left.
  Sub = 1,
  /// Each byte is stored as the difference from the byte above.
  Up = 2,
  /// Each byte is stored as the difference from the average of left and up.
  Average = 3,
  /// Each byte is stored as the difference from the Paeth predictor.
  Paeth = 4,
}
impl TryFrom<u8> for FilterType {
  /// The unrecognized filter byte.
  type Error = u8;
  #[inline]
  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Ok(match value {
      0 => FilterType::None,
      1 => FilterType::Sub,
      2 => FilterType::Up,
      3 => FilterType::Average,
      4 => FilterType::Paeth,
      other => return Err(other),
    })
  }
}

/// Picks whichever of `a` (left), `b` (up), or `c` (upper left) is closest to
/// `a + b - c`.
#[inline]
#[must_use]
pub const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // Note: the order of these tests decides ties, and the PNG spec fixes that
  // order. Don't rearrange them.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reconstructs a single scanline.
///
/// * `data` is the filtered bytes of this line (without the filter byte).
/// * `prev` is the previous line's *reconstructed* bytes, or `None` for the
///   first line of the image, in which case "up" is always 0.
/// * `bpp` is the bytes per pixel, which is how far back "left" is.
///
/// Reconstruction covers `out.len().min(data.len())` bytes. Any `prev` byte
/// that's out of range reads as 0.
pub fn unfilter_scanline(
  filter: FilterType, data: &[u8], prev: Option<&[u8]>, bpp: usize, out: &mut [u8],
) {
  let len = out.len().min(data.len());
  let up = |i: usize| -> u8 { prev.and_then(|p| p.get(i)).copied().unwrap_or(0) };
  match filter {
    FilterType::None => out[..len].copy_from_slice(&data[..len]),
    FilterType::Sub => {
      for i in 0..len {
        let left = if i >= bpp { out[i - bpp] } else { 0 };
        out[i] = data[i].wrapping_add(left);
      }
    }
    FilterType::Up => {
      for i in 0..len {
        out[i] = data[i].wrapping_add(up(i));
      }
    }
    FilterType::Average => {
      for i in 0..len {
        let left = if i >= bpp { out[i - bpp] } else { 0 };
        // the sum needs 9 bits
        let avg = ((u16::from(left) + u16::from(up(i))) / 2) as u8;
        out[i] = data[i].wrapping_add(avg);
      }
    }
    FilterType::Paeth => {
      for i in 0..len {
        let (left, upper_left) = if i >= bpp { (out[i - bpp], up(i - bpp)) } else { (0, 0) };
        out[i] = data[i].wrapping_add(paeth_predict(left, up(i), upper_left));
      }
    }
  }
}

#[inline]
fn check_geometry(geometry: ImageGeometry) -> PngResult<()> {
  ImageGeometry::new(geometry.width, geometry.height, geometry.bytes_per_pixel).map(|_| ())
}

/// Gives the number of decompressed bytes the image uses, or
/// [`PngError::TruncatedScanline`] if there aren't that many.
fn check_filtered_len(decompressed: &[u8], geometry: ImageGeometry) -> PngResult<usize> {
  check_geometry(geometry)?;
  let stride = geometry.stride()?;
  let filtered_len = geometry.filtered_len()?;
  if decompressed.len() < filtered_len {
    let row = (decompressed.len() / (stride + 1)) as u32;
    return Err(PngError::TruncatedScanline { row });
  }
  Ok(filtered_len)
}

/// Unfilters `decompressed` into the front of `out`, which must have room for
/// `height * stride` bytes.
///
/// Exactly `height * (1 + stride)` bytes of `decompressed` are used, and that
/// count is returned. Extra trailing bytes are ignored.
///
/// ## Failure
/// * Not enough decompressed data for every scanline is
///   [`PngError::TruncatedScanline`], and that's checked before any output is
///   written.
/// * A filter byte other than 0 through 4 is [`PngError::UnknownFilterType`].
///   The contents of `out` are unspecified after this error.
pub fn unfilter_to_slice(
  decompressed: &[u8], geometry: ImageGeometry, out: &mut [u8],
) -> PngResult<usize> {
  let filtered_len = check_filtered_len(decompressed, geometry)?;
  let stride = geometry.stride()?;
  let bpp = usize::from(geometry.bytes_per_pixel);
  let out = out.get_mut(..geometry.unfiltered_len()?).ok_or(PngError::OutputBufferTooSmall)?;

  if decompressed.len() > filtered_len {
    log::debug!(
      "ignoring {} bytes of decompressed data past the last scanline",
      decompressed.len() - filtered_len
    );
  }

  let mut prev: Option<&[u8]> = None;
  for (row, (filterline, line)) in
    decompressed.chunks_exact(stride + 1).zip(out.chunks_exact_mut(stride)).enumerate()
  {
    let (filter_byte, data) = filterline.split_at(1);
    let filter = FilterType::try_from(filter_byte[0])
      .map_err(|filter| PngError::UnknownFilterType { row: row as u32, filter })?;
    log::trace!("scanline {row}: filter {filter:?}");
    unfilter_scanline(filter, data, prev, bpp, line);
    let line: &[u8] = line;
    prev = Some(line);
  }
  Ok(filtered_len)
}

/// Unfilters `decompressed` into a new buffer of `height * stride` bytes.
///
/// Errors are the same as [`unfilter_to_slice`], and no partial image is ever
/// returned. The data length is checked before allocating, so the output is
/// never bigger than the decompressed data can fill.
#[cfg(feature = "alloc")]
pub fn unfilter(decompressed: &[u8], geometry: ImageGeometry) -> PngResult<Vec<u8>> {
  check_filtered_len(decompressed, geometry)?;
  let len = geometry.unfiltered_len()?;
  let mut out: Vec<u8> = Vec::new();
  out.try_reserve_exact(len)?;
  out.resize(len, 0);
  unfilter_to_slice(decompressed, geometry, &mut out)?;
  Ok(out)
}

#[test]
fn test_paeth_tie_breaks() {
  // p = 10, all three equally far away: left wins
  assert_eq!(paeth_predict(10, 10, 10), 10);
  // p = 20 + 20 - 10 = 30, |p-a| = 10 = |p-b|, left beats up
  assert_eq!(paeth_predict(20, 20, 10), 20);
  // p = 0 + 10 - 10 = 0, |p-a| = 0
  assert_eq!(paeth_predict(0, 10, 10), 0);
  // p = 5 + 0 - 0 = 5, a is exact
  assert_eq!(paeth_predict(5, 0, 0), 5);
  // p = 0 + 7 - 0 = 7, b is exact
  assert_eq!(paeth_predict(0, 7, 0), 7);
  // p = 100 + 50 - 200 = -50, |p-a|=150 |p-b|=100 |p-c|=250, so b
  assert_eq!(paeth_predict(100, 50, 200), 50);
  // p = 50 + 60 - 40 = 70, |p-a|=20 |p-b|=10 |p-c|=30, so b
  assert_eq!(paeth_predict(50, 60, 40), 60);
  // p = 10 + 10 - 12 = 8, |p-a|=2 |p-b|=2 |p-c|=4, tie goes to a
  assert_eq!(paeth_predict(10, 10, 12), 10);
  // p = 30 + 5 - 20 = 15, |p-a|=15 |p-b|=10 |p-c|=5, so c
  assert_eq!(paeth_predict(30, 5, 20), 20);
}

#[test]
fn test_filter_type_from_byte() {
  assert_eq!(FilterType::try_from(0_u8), Ok(FilterType::None));
  assert_eq!(FilterType::try_from(4_u8), Ok(FilterType::Paeth));
  assert_eq!(FilterType::try_from(5_u8), Err(5));
  assert_eq!(FilterType::try_from(255_u8), Err(255));
}

#[test]
fn test_unfilter_scanline_first_row_reads_zero_above() {
  let data = [10, 20, 30, 40];
  let mut out = [0_u8; 4];
  unfilter_scanline(FilterType::Up, &data, None, 1, &mut out);
  assert_eq!(out, data);
  unfilter_scanline(FilterType::Average, &data, None, 1, &mut out);
  // left only, halved: 10, 20+5, 30+12, 40+21
  assert_eq!(out, [10, 25, 42, 61]);
  unfilter_scanline(FilterType::Paeth, &data, None, 1, &mut out);
  // with up and upper-left at zero Paeth always picks left, same as Sub
  assert_eq!(out, [10, 30, 60, 100]);
}

#[test]
fn test_unfilter_scanline_wraps() {
  let data = [200, 100];
  let mut out = [0_u8; 2];
  unfilter_scanline(FilterType::Sub, &data, None, 1, &mut out);
  assert_eq!(out, [200, 44]);
  let prev = [255, 255];
  unfilter_scanline(FilterType::Average, &[1, 1], Some(&prev), 1, &mut out);
  // (0 + 255) / 2 = 127, then (128 + 255) / 2 = 191
  assert_eq!(out, [128, 192]);
}

#[test]
fn test_unfilter_to_slice_two_by_two() {
  let geometry = ImageGeometry::new(2, 2, 1).unwrap();
  let decompressed = [0, 10, 20, 2, 5, 5];
  let mut out = [0_u8; 4];
  assert_eq!(unfilter_to_slice(&decompressed, geometry, &mut out), Ok(6));
  assert_eq!(out, [10, 20, 15, 25]);
}

#[test]
fn test_unfilter_to_slice_errors() {
  let geometry = ImageGeometry::new(2, 2, 1).unwrap();
  let mut out = [0_u8; 4];
  assert_eq!(
    unfilter_to_slice(&[0, 1, 2, 0, 3], geometry, &mut out),
    Err(PngError::TruncatedScanline { row: 1 })
  );
  assert_eq!(
    unfilter_to_slice(&[0, 1, 2, 9, 3, 4], geometry, &mut out),
    Err(PngError::UnknownFilterType { row: 1, filter: 9 })
  );
  assert_eq!(
    unfilter_to_slice(&[0, 1, 2, 0, 3, 4], geometry, &mut out[..3]),
    Err(PngError::OutputBufferTooSmall)
  );
  let zero = ImageGeometry { width: 0, height: 2, bytes_per_pixel: 1 };
  assert_eq!(unfilter_to_slice(&[], zero, &mut out), Err(PngError::ImageDimensionsZero));
}

#[test]
#[cfg(feature = "alloc")]
fn test_unfilter_short_data_fails_before_allocating() {
  // 2 GiB of output if it were allocated up front
  let geometry = ImageGeometry::new(32768, 16384, 4).unwrap();
  assert_eq!(unfilter(&[0, 0, 0, 0], geometry), Err(PngError::TruncatedScanline { row: 0 }));
  let huge = ImageGeometry::new(u32::MAX, u32::MAX, 8).unwrap();
  assert!(unfilter(&[0; 64], huge).is_err());
}
