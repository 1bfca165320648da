#![allow(bad_style)]

mod crc32;
mod png;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// Length, type, payload, and a correct CRC.
fn make_chunk(ty: &[u8; 4], data: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(12 + data.len());
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(ty);
  out.extend_from_slice(data);
  let crc = idat_unbuilder::crc32::crc32_reflected(&[&ty[..], data].concat());
  out.extend_from_slice(&crc.to_be_bytes());
  out
}

fn ihdr_payload(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
  let mut out = Vec::new();
  out.extend_from_slice(&width.to_be_bytes());
  out.extend_from_slice(&height.to_be_bytes());
  out.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
  out
}

/// A PNG with the given header, the zlib compressed `filtered` data split into
/// `idat_count` IDAT chunks, and an IEND.
fn make_png(ihdr: &[u8], filtered: &[u8], idat_count: usize) -> Vec<u8> {
  let compressed = miniz_oxide::deflate::compress_to_vec_zlib(filtered, 6);
  let piece = (compressed.len() + idat_count - 1) / idat_count;
  let mut png = idat_unbuilder::png::PNG_SIGNATURE.to_vec();
  png.extend(make_chunk(b"IHDR", ihdr));
  png.extend(make_chunk(b"tEXt", b"Comment\0made for a test"));
  for part in compressed.chunks(piece.max(1)) {
    png.extend(make_chunk(b"IDAT", part));
  }
  png.extend(make_chunk(b"IEND", &[]));
  png
}
