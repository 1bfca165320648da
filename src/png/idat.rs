use super::*;

/// Just the `IDAT` chunks, in the order given.
#[inline]
pub fn idat_chunks<'r, 'b: 'r>(
  records: &'r [PngChunk<'b>],
) -> impl Iterator<Item = &'r PngChunk<'b>> + 'r {
  records.iter().filter(|chunk| chunk.ty() == PngChunkTy::IDAT)
}

/// Joins the payloads of all the `IDAT` chunks into one zlib stream.
///
/// * Images can have more than one IDAT chunk. They should all be stored in a
///   row, and the stream is their payloads concatenated in that order. Nothing
///   is reordered here.
/// * Other chunk types are skipped.
/// * No `IDAT` chunks at all gives an empty stream, not an error. Inflating
///   that will fail, and the caller gets that failure.
#[cfg(feature = "alloc")]
pub fn aggregate(records: &[PngChunk<'_>]) -> PngResult<Vec<u8>> {
  let total = idat_chunks(records)
    .try_fold(0_usize, |total, chunk| total.checked_add(chunk.data().len()))
    .ok_or(PngError::CheckedMath)?;
  let mut out: Vec<u8> = Vec::new();
  out.try_reserve_exact(total)?;
  for chunk in idat_chunks(records) {
    out.extend_from_slice(chunk.data());
  }
  Ok(out)
}

#[test]
#[cfg(feature = "alloc")]
fn test_aggregate_keeps_order_and_skips_others() {
  let chunks = [
    PngChunk { ty: PngChunkTy::IHDR, data: b"header", declared_crc: 0 },
    PngChunk { ty: PngChunkTy::IDAT, data: b"ab", declared_crc: 0 },
    PngChunk { ty: PngChunkTy(*b"tEXt"), data: b"zz", declared_crc: 0 },
    PngChunk { ty: PngChunkTy::IDAT, data: b"", declared_crc: 0 },
    PngChunk { ty: PngChunkTy::IDAT, data: b"cde", declared_crc: 0 },
    PngChunk { ty: PngChunkTy::IEND, data: b"", declared_crc: 0 },
  ];
  assert_eq!(aggregate(&chunks).unwrap(), b"abcde");
  assert_eq!(idat_chunks(&chunks).count(), 3);
  assert_eq!(aggregate(&chunks[..1]).unwrap(), b"");
  assert_eq!(aggregate(&[]).unwrap(), b"");
}
