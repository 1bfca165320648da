//! The whole trip from PNG bytes to unfiltered pixel bytes.

use super::*;

/// Turns a zlib stream into the bytes it holds.
///
/// Any failure should be reported as [`PngError::Decompression`].
pub trait Inflate {
  fn inflate(&self, compressed: &[u8]) -> PngResult<Vec<u8>>;
}
impl<F> Inflate for F
where
  F: Fn(&[u8]) -> PngResult<Vec<u8>>,
{
  #[inline]
  fn inflate(&self, compressed: &[u8]) -> PngResult<Vec<u8>> {
    self(compressed)
  }
}

/// Zlib decompression using `miniz_oxide`.
#[cfg(feature = "miniz_oxide")]
#[cfg_attr(docs_rs, doc(cfg(feature = "miniz_oxide")))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ZlibInflate;
#[cfg(feature = "miniz_oxide")]
impl Inflate for ZlibInflate {
  fn inflate(&self, compressed: &[u8]) -> PngResult<Vec<u8>> {
    miniz_oxide::inflate::decompress_to_vec_zlib(compressed).map_err(|e| {
      log::error!("zlib decompression failed: {:?}", e.status);
      PngError::Decompression
    })
  }
}

/// Runtime choices for [`decode_idat`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
  /// How the `IDAT` chunks are found.
  pub discipline: ScanDiscipline,
  /// Recompute each `IDAT` chunk's CRC and fail on a mismatch.
  pub verify_crc: bool,
}

/// Everything produced along the way, in case you want more than the pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedIdat<'b> {
  /// The `IDAT` chunks, in the order found.
  pub idat_chunks: Vec<PngChunk<'b>>,
  /// The structural error that cut the chunk scan short, if any.
  pub scan_error: Option<PngError>,
  /// The chunk payloads joined together.
  pub compressed: Vec<u8>,
  /// The compressed stream after inflating: filter bytes and filtered lines.
  pub decompressed: Vec<u8>,
  pub header: ImageHeader,
  /// `height * stride` bytes of unfiltered pixel data.
  pub pixels: Vec<u8>,
}

/// Finds the `IDAT` chunks.
///
/// A structural error partway through stops the scan (the scanner logs it),
/// and the chunks found before it are kept. A bad signature, or a CRC mismatch
/// when `verify_crc` is on, is an `Err`.
pub fn collect_idat<'b>(bytes: &'b [u8], options: &DecodeOptions) -> PngResult<ChunkScan<'b>> {
  let scan = find_chunks(bytes, PngChunkTy::IDAT, options.discipline)?;
  if scan.error.is_some() {
    log::debug!("keeping the {} IDAT chunks found before the scan stopped", scan.chunks.len());
  }
  if options.verify_crc {
    for chunk in &scan.chunks {
      chunk.verify_crc()?;
    }
  }
  log::debug!("found {} IDAT chunks", scan.chunks.len());
  Ok(scan)
}

/// Joins the `IDAT` payloads and inflates them.
pub fn decompress_idat(chunks: &[PngChunk<'_>], inflater: &impl Inflate) -> PngResult<Vec<u8>> {
  inflate_joined(&aggregate(chunks)?, inflater)
}

fn inflate_joined(compressed: &[u8], inflater: &impl Inflate) -> PngResult<Vec<u8>> {
  log::info!("total length of combined IDAT: {} bytes", compressed.len());
  let decompressed = inflater.inflate(compressed)?;
  log::debug!("decompressed to {} bytes", decompressed.len());
  Ok(decompressed)
}

/// PNG bytes in, unfiltered pixel bytes out.
///
/// 1) Find the `IDAT` chunks (see [`collect_idat`]).
/// 2) Join and inflate them.
/// 3) Read the geometry out of the `IHDR`.
/// 4) Unfilter.
///
/// Interlaced images are rejected with [`PngError::InterlaceNotSupported`].
pub fn decode_idat<'b>(
  bytes: &'b [u8], options: &DecodeOptions, inflater: &impl Inflate,
) -> PngResult<DecodedIdat<'b>> {
  let ChunkScan { chunks: idat_chunks, error: scan_error } = collect_idat(bytes, options)?;
  let compressed = aggregate(&idat_chunks)?;
  let decompressed = inflate_joined(&compressed, inflater)?;
  let header = extract_header(bytes)?;
  if header.is_interlaced {
    return Err(PngError::InterlaceNotSupported);
  }
  let pixels = unfilter(&decompressed, header.geometry)?;
  Ok(DecodedIdat { idat_chunks, scan_error, compressed, decompressed, header, pixels })
}

/// [`decode_idat`] with default options and `miniz_oxide`, giving just the
/// geometry and the pixels.
#[cfg(feature = "miniz_oxide")]
#[cfg_attr(docs_rs, doc(cfg(feature = "miniz_oxide")))]
pub fn png_unfiltered_pixels(bytes: &[u8]) -> PngResult<(ImageGeometry, Vec<u8>)> {
  let decoded = decode_idat(bytes, &DecodeOptions::default(), &ZlibInflate)?;
  Ok((decoded.header.geometry, decoded.pixels))
}
