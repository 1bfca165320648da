#![forbid(unsafe_code)]

//! Tools for getting the raw pixel bytes out of PNG data.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! The general format of a PNG is that the information is stored in "chunks".
//! Each chunk is a big-endian length, a four byte type tag, that many bytes of
//! payload, and a CRC. Only two chunk types matter here:
//! * **Header** (`IHDR`) - The image's dimensions and pixel format. From this
//!   we get the [`ImageGeometry`]: width, height, and bytes per pixel.
//! * **Image Data** (`IDAT`) - One or more chunks of compressed data. All of
//!   the compressed data forms a single zlib data stream. All of the image data
//!   chunks should appear one after the other.
//!
//! When storing the PNG, the raw pixel values are first "filtered" (to try and
//! make them more compression-friendly), and then compressed into a Zlib data
//! stream. Getting the pixels back means reversing both steps: first
//! decompressing, and then unfiltering.
//!
//! ## Automatic Decoding
//!
//! [`decode_idat`] does every step and hands back each intermediate buffer.
//! [`png_unfiltered_pixels`] does the same with default settings and only
//! gives you the pixels. These need the `alloc` feature, and the built in
//! [`ZlibInflate`] needs `miniz_oxide`.
//!
//! ## Step By Step
//!
//! 1) Find the chunks. There's two framing disciplines, see the [`scan`]
//!    module: [`SequentialChunks`] for strict framing and [`MarkerSearch`] for
//!    hunting down one chunk type even past damaged data.
//! 2) Join the `IDAT` payloads with [`aggregate`] and inflate the result using
//!    any zlib decompressor (anything implementing [`Inflate`]).
//! 3) Call [`extract_geometry`] to read the `IHDR`.
//! 4) Call [`unfilter`] (or [`unfilter_to_slice`] to use your own buffer) to
//!    turn the decompressed data into `height` lines of `width *
//!    bytes_per_pixel` bytes each.
//!
//! ## Parsing Errors
//!
//! Chunk scanning is forgiving: a damaged chunk stops the scan, but you still
//! get all the chunks before it along with the error (see [`ChunkScan`]).
//! Header and unfiltering errors are not forgiving, you get an error and no
//! partial data. CRC checks are skipped unless you ask for them with
//! [`DecodeOptions::verify_crc`] or [`PngChunk::verify_crc`].
//!
//! Interlaced images, palette expansion, and bit depths below 8 (other than
//! indexed color) are not handled.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

mod chunks;
pub use chunks::*;

mod error;
pub use error::*;

pub mod scan;
pub use scan::*;

mod header;
pub use header::*;

mod idat;
pub use idat::*;

mod unfilter;
pub use unfilter::*;

#[cfg(feature = "alloc")]
mod pipeline;
#[cfg(feature = "alloc")]
pub use pipeline::*;
