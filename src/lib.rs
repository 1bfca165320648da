#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]

//! A crate for pulling the image data out of PNG files.
//!
//! The PNG support finds the `IDAT` chunks, joins and inflates them, and
//! reverses the scanline filters to give back raw pixel bytes. Alongside that
//! is a general CRC32 calculator, which the PNG side can use to check chunk
//! checksums.

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

pub mod crc32;

#[cfg(feature = "png")]
pub mod png;
