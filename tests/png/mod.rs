use idat_unbuilder::png::*;
use walkdir::WalkDir;

use super::{ihdr_payload, make_chunk, make_png};

#[test]
fn test_chunk_scanners_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    let _ = scan_chunks(&v);
    let _ = find_chunks_by_marker(&v, PngChunkTy::IDAT);
    let _ = extract_geometry(&v);
  }
  // even totally random data should never panic the scanners!
  for _ in 0..10 {
    let mut v = super::rand_bytes(1024);
    let _ = scan_chunks(&v);
    // and random data behind a real signature gets further in
    v[..8].copy_from_slice(&PNG_SIGNATURE);
    let _ = scan_chunks(&v);
    let _ = find_chunks_by_marker(&v, PngChunkTy::IDAT);
    for _ in MarkerSearch::from_raw_bytes(&v, PngChunkTy::IHDR) {
      //
    }
    let _ = extract_geometry(&v);
  }
}

#[test]
fn test_random_bytes_never_panic_unfilter() {
  for _ in 0..10 {
    let v = super::rand_bytes(600);
    let geometry = ImageGeometry::new(7, 9, 3).unwrap();
    match unfilter(&v, geometry) {
      Ok(pixels) => assert_eq!(pixels.len(), 7 * 9 * 3),
      Err(e) => assert!(matches!(e, PngError::UnknownFilterType { .. }), "{e:?}"),
    }
  }
}

#[test]
fn test_not_a_png_has_no_chunks() {
  for bytes in [&b""[..], b"\x89PNG", b"GIF89a\x01\x00\x01\x00\x00\x00\x00"] {
    assert_eq!(scan_chunks(bytes), Err(PngError::InvalidSignature));
    assert_eq!(find_chunks_by_marker(bytes, PngChunkTy::IDAT), Err(PngError::InvalidSignature));
    assert_eq!(extract_geometry(bytes), Err(PngError::InvalidSignature));
  }
}

#[test]
fn test_disciplines_agree_on_well_formed_png() {
  let filtered = [0, 10, 20, 2, 5, 5];
  let png = make_png(&ihdr_payload(2, 2, 8, 0), &filtered, 3);

  let all = scan_chunks(&png).unwrap();
  assert!(all.is_complete());
  let types: Vec<PngChunkTy> = all.chunks.iter().map(|c| c.ty()).collect();
  assert_eq!(types.first(), Some(&PngChunkTy::IHDR));
  assert_eq!(types.last(), Some(&PngChunkTy::IEND));

  let strict = find_chunks(&png, PngChunkTy::IDAT, ScanDiscipline::Sequential).unwrap();
  let marker = find_chunks(&png, PngChunkTy::IDAT, ScanDiscipline::MarkerSearch).unwrap();
  assert_eq!(strict, marker);
  assert!(!marker.chunks.is_empty());
  for chunk in &marker.chunks {
    assert_eq!(chunk.verify_crc(), Ok(()));
    assert_eq!(chunk.declared_len() as usize, chunk.data().len());
  }
}

#[test]
fn test_decode_two_by_two_grayscale() {
  let filtered = [0, 10, 20, 2, 5, 5];
  for idat_count in [1, 2, 4] {
    let png = make_png(&ihdr_payload(2, 2, 8, 0), &filtered, idat_count);
    let decoded = decode_idat(&png, &DecodeOptions::default(), &ZlibInflate).unwrap();
    assert_eq!(decoded.scan_error, None);
    assert_eq!(decoded.decompressed, filtered);
    assert_eq!(decoded.header.geometry, ImageGeometry { width: 2, height: 2, bytes_per_pixel: 1 });
    assert_eq!(decoded.pixels, [10, 20, 15, 25]);
    assert_eq!(
      decoded.compressed,
      decoded.idat_chunks.iter().flat_map(|c| c.data().iter().copied()).collect::<Vec<u8>>()
    );
  }
}

#[test]
fn test_decode_random_rgba_unfiltered_rows() {
  let (width, height) = (5_u32, 4_u32);
  let stride = width as usize * 4;
  let raw = super::rand_bytes(stride * height as usize);
  let mut filtered = Vec::new();
  for line in raw.chunks_exact(stride) {
    filtered.push(0);
    filtered.extend_from_slice(line);
  }
  let png = make_png(&ihdr_payload(width, height, 8, 6), &filtered, 2);
  let (geometry, pixels) = png_unfiltered_pixels(&png).unwrap();
  assert_eq!(geometry, ImageGeometry { width, height, bytes_per_pixel: 4 });
  assert_eq!(pixels, raw);
}

#[test]
fn test_truncated_idat_keeps_earlier_chunks() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(make_chunk(b"IHDR", &ihdr_payload(2, 2, 8, 0)));
  png.extend(make_chunk(b"IDAT", b"first"));
  png.extend(make_chunk(b"IDAT", b"second"));
  let third_at = png.len();
  let third = make_chunk(b"IDAT", b"third one");
  png.extend_from_slice(&third[..third.len() - 5]);

  let marker = find_chunks_by_marker(&png, PngChunkTy::IDAT).unwrap();
  assert_eq!(marker.error, Some(PngError::TruncatedChunk { offset: third_at }));
  let payloads: Vec<&[u8]> = marker.chunks.iter().map(|c| c.data()).collect();
  assert_eq!(payloads, [&b"first"[..], b"second"]);

  let strict = scan_chunks(&png).unwrap();
  assert_eq!(strict.error, Some(PngError::TruncatedChunk { offset: third_at }));
  assert_eq!(strict.chunks.len(), 3);

  // the partial stream is handed to inflate, and that failure comes through
  let result = decode_idat(&png, &DecodeOptions::default(), &ZlibInflate);
  assert_eq!(result, Err(PngError::Decompression));
}

#[test]
fn test_marker_search_steps_over_junk() {
  let filtered = [0, 1, 2, 3, 0, 4, 5, 6];
  let clean = make_png(&ihdr_payload(3, 2, 8, 0), &filtered, 2);
  let first_idat = clean.windows(4).position(|w| w == b"IDAT").unwrap() - 4;
  let mut png = clean[..first_idat].to_vec();
  png.extend_from_slice(b"\xff\xff\xff\xffjunk");
  png.extend_from_slice(&clean[first_idat..]);

  let strict = DecodeOptions { discipline: ScanDiscipline::Sequential, verify_crc: false };
  let scan = collect_idat(&png, &strict).unwrap();
  assert!(scan.chunks.is_empty());
  assert_eq!(scan.error, Some(PngError::TruncatedChunk { offset: first_idat }));

  let decoded = decode_idat(&png, &DecodeOptions::default(), &ZlibInflate).unwrap();
  assert_eq!(decoded.idat_chunks.len(), 2);
  assert_eq!(decoded.pixels, [1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_no_idat_means_decompression_error() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(make_chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0)));
  png.extend(make_chunk(b"IEND", &[]));
  let scan = find_chunks_by_marker(&png, PngChunkTy::IDAT).unwrap();
  assert!(scan.chunks.is_empty() && scan.is_complete());
  assert_eq!(aggregate(&scan.chunks), Ok(Vec::new()));
  assert_eq!(
    decode_idat(&png, &DecodeOptions::default(), &ZlibInflate),
    Err(PngError::Decompression)
  );
}

#[test]
fn test_missing_ihdr() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(make_chunk(b"IDAT", b"whatever"));
  png.extend(make_chunk(b"IEND", &[]));
  assert_eq!(extract_geometry(&png), Err(PngError::MissingIHDR));
}

#[test]
fn test_header_extractor_skips_earlier_chunks() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(make_chunk(b"zzZZ", &[0xAB; 40]));
  png.extend(make_chunk(b"IHDR", &ihdr_payload(640, 480, 16, 2)));
  assert_eq!(
    extract_geometry(&png),
    Ok(ImageGeometry { width: 640, height: 480, bytes_per_pixel: 6 })
  );
  let header = extract_header(&png).unwrap();
  assert_eq!(header.bit_depth, 16);
  assert_eq!(header.color_type, PngColorType::RGB);
}

#[test]
fn test_unsupported_color_type() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(make_chunk(b"IHDR", &ihdr_payload(1, 1, 8, 7)));
  assert_eq!(extract_geometry(&png), Err(PngError::UnsupportedColorType(7)));
}

#[test]
fn test_verify_crc_catches_bad_checksum() {
  let filtered = [0, 9];
  let mut png = make_png(&ihdr_payload(1, 1, 8, 0), &filtered, 1);
  let scan = find_chunks_by_marker(&png, PngChunkTy::IDAT).unwrap();
  let idat = scan.chunks[0];
  let crc_at = png.windows(4).position(|w| w == b"IDAT").unwrap() + 4 + idat.data().len();
  assert_eq!(&png[crc_at..crc_at + 4], &idat.declared_crc_bytes());
  png[crc_at] ^= 0xFF;

  let checked = DecodeOptions { verify_crc: true, ..DecodeOptions::default() };
  assert!(matches!(
    decode_idat(&png, &checked, &ZlibInflate),
    Err(PngError::CrcMismatch { ty: PngChunkTy::IDAT, .. })
  ));
  // by default checksums aren't looked at
  let decoded = decode_idat(&png, &DecodeOptions::default(), &ZlibInflate).unwrap();
  assert_eq!(decoded.pixels, [9]);
}

#[test]
fn test_interlaced_is_rejected() {
  let mut ihdr = ihdr_payload(1, 1, 8, 0);
  ihdr[12] = 1;
  let png = make_png(&ihdr, &[0, 0], 1);
  assert_eq!(
    decode_idat(&png, &DecodeOptions::default(), &ZlibInflate),
    Err(PngError::InterlaceNotSupported)
  );
}

#[test]
fn test_custom_inflater() {
  let mut png = PNG_SIGNATURE.to_vec();
  png.extend(make_chunk(b"IHDR", &ihdr_payload(2, 1, 8, 0)));
  png.extend(make_chunk(b"IDAT", b"not zlib"));
  // stands in for a decompressor, ignores its input
  let fake = |_: &[u8]| -> PngResult<Vec<u8>> { Ok(vec![1, 3, 4]) };
  let decoded = decode_idat(&png, &DecodeOptions::default(), &fake).unwrap();
  assert_eq!(decoded.compressed, b"not zlib");
  assert_eq!(decoded.pixels, [3, 7]);

  let failing = |_: &[u8]| -> PngResult<Vec<u8>> { Err(PngError::Decompression) };
  assert_eq!(decompress_idat(&decoded.idat_chunks, &failing), Err(PngError::Decompression));
}

#[test]
fn test_unknown_filter_through_pipeline() {
  let png = make_png(&ihdr_payload(1, 2, 8, 0), &[0, 1, 7, 1], 1);
  assert_eq!(
    decode_idat(&png, &DecodeOptions::default(), &ZlibInflate),
    Err(PngError::UnknownFilterType { row: 1, filter: 7 })
  );
}

#[test]
fn test_decode_and_decompress_share_the_inflate_step() {
  let filtered = [0, 3, 1, 4, 1];
  let png = make_png(&ihdr_payload(4, 1, 8, 0), &filtered, 2);
  let decoded = decode_idat(&png, &DecodeOptions::default(), &ZlibInflate).unwrap();
  assert_eq!(decompress_idat(&decoded.idat_chunks, &ZlibInflate), Ok(decoded.decompressed.clone()));
  assert_eq!(decoded.decompressed, filtered);
}
