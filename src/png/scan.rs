//! The two ways of finding chunks in PNG bytes.
//!
//! * [`SequentialChunks`] reads length, type, payload, and CRC one after
//!   another, exactly as the PNG format lays them out. One bad length field
//!   and there's no way to find the chunk after it.
//! * [`MarkerSearch`] looks for a chunk type's four tag bytes anywhere in the
//!   remaining data and takes the four bytes before the tag as the length.
//!   This can step over junk between chunks, which strict framing can't.
//!
//! On a well formed PNG both produce the same chunks. Both stop at the first
//! structural error: the iterator yields that error once and then ends, and
//! the collected [`ChunkScan`] keeps every chunk that came before it.

use super::*;

#[inline]
fn read_u32_be(bytes: &[u8], at: usize) -> Option<u32> {
  let end = at.checked_add(4)?;
  let field: [u8; 4] = bytes.get(at..end)?.try_into().ok()?;
  Some(u32::from_be_bytes(field))
}

/// Strict sequential framing over the chunks after the PNG signature.
///
/// The iterator yields `Err` at most once, then returns `None` forever.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequentialChunks<'b> {
  bytes: &'b [u8],
  cursor: usize,
  done: bool,
}
impl<'b> SequentialChunks<'b> {
  /// Checks the signature and starts at the first chunk.
  #[inline]
  pub fn from_png_bytes(bytes: &'b [u8]) -> PngResult<Self> {
    strip_signature(bytes)?;
    Ok(Self { bytes, cursor: PNG_SIGNATURE.len(), done: false })
  }

  /// Byte offset (into the full PNG bytes) of the next chunk to read.
  #[inline]
  #[must_use]
  pub const fn cursor(&self) -> usize {
    self.cursor
  }

  #[inline]
  fn fail(&mut self, err: PngError) -> Option<PngResult<PngChunk<'b>>> {
    log::warn!("stopped reading chunks: {err}");
    self.done = true;
    Some(Err(err))
  }
}
impl<'b> Iterator for SequentialChunks<'b> {
  type Item = PngResult<PngChunk<'b>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done || self.cursor >= self.bytes.len() {
      self.done = true;
      return None;
    }
    let offset = self.cursor;
    let (Some(chunk_len), Some(ty_bytes)) =
      (read_u32_be(self.bytes, offset), self.bytes.get(offset + 4..offset + 8))
    else {
      return self.fail(PngError::TruncatedChunk { offset });
    };
    let ty = PngChunkTy(match ty_bytes.try_into() {
      Ok(ty) => ty,
      Err(_) => return self.fail(PngError::TruncatedChunk { offset }),
    });
    // length is untrusted, so everything past here is checked math.
    let data_start = offset + 8;
    let Some(data_end) = data_start.checked_add(chunk_len as usize) else {
      return self.fail(PngError::TruncatedChunk { offset });
    };
    let (Some(data), Some(declared_crc)) =
      (self.bytes.get(data_start..data_end), read_u32_be(self.bytes, data_end))
    else {
      return self.fail(PngError::TruncatedChunk { offset });
    };
    self.cursor = data_end + 4;
    Some(Ok(PngChunk { ty, data, declared_crc }))
  }
}

/// Resilient search for every chunk of one type.
///
/// Each step finds the next occurrence of the tag bytes at or after the
/// cursor, reads the length from just before the tag, and then skips the
/// cursor past that chunk's CRC. Anything between chunks is ignored.
///
/// The iterator yields `Err` at most once, then returns `None` forever.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerSearch<'b> {
  bytes: &'b [u8],
  ty: PngChunkTy,
  cursor: usize,
  done: bool,
}
impl<'b> MarkerSearch<'b> {
  /// Checks the signature and searches everything after it.
  #[inline]
  pub fn from_png_bytes(bytes: &'b [u8], ty: PngChunkTy) -> PngResult<Self> {
    strip_signature(bytes)?;
    Ok(Self { bytes, ty, cursor: PNG_SIGNATURE.len(), done: false })
  }

  /// Searches bytes that don't start with a PNG signature, such as a chunk
  /// dump, starting at offset 0.
  #[inline]
  #[must_use]
  pub const fn from_raw_bytes(bytes: &'b [u8], ty: PngChunkTy) -> Self {
    Self { bytes, ty, cursor: 0, done: false }
  }

  #[inline]
  fn fail(&mut self, err: PngError) -> Option<PngResult<PngChunk<'b>>> {
    log::warn!("stopped searching for {:?} chunks: {err}", self.ty);
    self.done = true;
    Some(Err(err))
  }
}
impl<'b> Iterator for MarkerSearch<'b> {
  type Item = PngResult<PngChunk<'b>>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }
    let tag = self.ty.as_bytes();
    let found = self.bytes.get(self.cursor..).and_then(|rest| {
      rest.windows(tag.len()).position(|w| w == tag).map(|pos| self.cursor + pos)
    });
    let Some(tag_at) = found else {
      self.done = true;
      return None;
    };
    let Some(offset) = tag_at.checked_sub(4) else {
      return self.fail(PngError::MissingLengthPrefix { offset: tag_at });
    };
    let Some(chunk_len) = read_u32_be(self.bytes, offset) else {
      return self.fail(PngError::MissingLengthPrefix { offset: tag_at });
    };
    let data_start = tag_at + 4;
    let Some(data_end) = data_start.checked_add(chunk_len as usize) else {
      return self.fail(PngError::TruncatedChunk { offset });
    };
    let (Some(data), Some(declared_crc)) =
      (self.bytes.get(data_start..data_end), read_u32_be(self.bytes, data_end))
    else {
      return self.fail(PngError::TruncatedChunk { offset });
    };
    self.cursor = data_end + 4;
    Some(Ok(PngChunk { ty: self.ty, data, declared_crc }))
  }
}

/// Which framing discipline to find chunks with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScanDiscipline {
  /// [`SequentialChunks`]
  Sequential,
  /// [`MarkerSearch`]
  #[default]
  MarkerSearch,
}

/// Every chunk a scan found, plus the error that stopped it early (if any).
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkScan<'b> {
  pub chunks: Vec<PngChunk<'b>>,
  pub error: Option<PngError>,
}
#[cfg(feature = "alloc")]
impl<'b> ChunkScan<'b> {
  /// Drains a chunk iterator, keeping the chunks found before any error.
  pub fn collect_from(it: impl Iterator<Item = PngResult<PngChunk<'b>>>) -> Self {
    let mut scan = Self::default();
    for result in it {
      match result {
        Ok(chunk) => scan.chunks.push(chunk),
        Err(e) => {
          scan.error = Some(e);
          break;
        }
      }
    }
    scan
  }

  /// `true` if the scan reached the end of the data.
  #[inline]
  #[must_use]
  pub const fn is_complete(&self) -> bool {
    self.error.is_none()
  }
}

/// All chunks, via strict sequential framing.
///
/// Only a bad signature is an `Err`; structural problems later on end up in
/// [`ChunkScan::error`].
#[cfg(feature = "alloc")]
pub fn scan_chunks(bytes: &[u8]) -> PngResult<ChunkScan<'_>> {
  Ok(ChunkScan::collect_from(SequentialChunks::from_png_bytes(bytes)?))
}

/// All chunks of the given type, via the resilient marker search.
#[cfg(feature = "alloc")]
pub fn find_chunks_by_marker(bytes: &[u8], ty: PngChunkTy) -> PngResult<ChunkScan<'_>> {
  Ok(ChunkScan::collect_from(MarkerSearch::from_png_bytes(bytes, ty)?))
}

/// All chunks of the given type, using whichever discipline you pick.
#[cfg(feature = "alloc")]
pub fn find_chunks(
  bytes: &[u8], ty: PngChunkTy, discipline: ScanDiscipline,
) -> PngResult<ChunkScan<'_>> {
  match discipline {
    ScanDiscipline::Sequential => {
      let mut scan = scan_chunks(bytes)?;
      scan.chunks.retain(|chunk| chunk.ty() == ty);
      Ok(scan)
    }
    ScanDiscipline::MarkerSearch => find_chunks_by_marker(bytes, ty),
  }
}

#[test]
fn test_sequential_rejects_bad_signature() {
  assert_eq!(
    SequentialChunks::from_png_bytes(b"\x89PNG\r\n\x1a").err(),
    Some(PngError::InvalidSignature)
  );
  assert_eq!(
    MarkerSearch::from_png_bytes(b"not a png at all", PngChunkTy::IDAT).err(),
    Some(PngError::InvalidSignature)
  );
}

#[test]
fn test_sequential_stops_after_truncation() {
  // signature, then a chunk claiming 10 bytes with only 2 present.
  let bytes = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0aIDATab";
  let mut it = SequentialChunks::from_png_bytes(bytes).unwrap();
  assert_eq!(it.next(), Some(Err(PngError::TruncatedChunk { offset: 8 })));
  assert_eq!(it.next(), None);
  assert_eq!(it.next(), None);
}

#[test]
fn test_sequential_short_header_is_truncation() {
  let bytes = b"\x89PNG\r\n\x1a\n\x00\x00";
  let mut it = SequentialChunks::from_png_bytes(bytes).unwrap();
  assert_eq!(it.next(), Some(Err(PngError::TruncatedChunk { offset: 8 })));
  assert_eq!(it.next(), None);
}

#[test]
fn test_marker_search_missing_length_prefix() {
  let mut it = MarkerSearch::from_raw_bytes(b"xIDAT", PngChunkTy::IDAT);
  assert_eq!(it.next(), Some(Err(PngError::MissingLengthPrefix { offset: 1 })));
  assert_eq!(it.next(), None);
}

#[test]
fn test_marker_search_raw_bytes() {
  let raw = b"\x00\x00\x00\x02IDATxy\x01\x02\x03\x04";
  let mut it = MarkerSearch::from_raw_bytes(raw, PngChunkTy::IDAT);
  let chunk = it.next().unwrap().unwrap();
  assert_eq!(chunk.data(), b"xy");
  assert_eq!(chunk.declared_crc(), 0x0102_0304);
  assert_eq!(it.next(), None);
}

#[test]
fn test_marker_search_length_overflow() {
  let raw = b"\xff\xff\xff\xffIDAT";
  let mut it = MarkerSearch::from_raw_bytes(raw, PngChunkTy::IDAT);
  assert_eq!(it.next(), Some(Err(PngError::TruncatedChunk { offset: 0 })));
  assert_eq!(it.next(), None);
}
