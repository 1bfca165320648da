//! Takes a PNG apart and writes each stage of the image data to disk.
//!
//! Everything lands in `_<file stem>/` in the current directory.

use std::{
  fmt, fs,
  path::{Path, PathBuf},
  process::ExitCode,
};

use clap::Parser;

use idat_unbuilder::png::*;

/// Extract, decompress, and unfilter the IDAT chunks of a PNG file.
#[derive(Parser, Debug)]
#[command(name = "idat_unbuilder")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    idat_unbuilder input.png --extract-idat
    idat_unbuilder input.png --extract-idat --decompress --unfilter -v")]
struct Args {
  /// The PNG file to read
  #[arg(value_name = "FILE")]
  file: PathBuf,

  /// Save each IDAT chunk and its CRC32 bytes
  #[arg(long)]
  extract_idat: bool,

  /// Save the decompressed IDAT stream
  #[arg(long)]
  decompress: bool,

  /// Unfilter the decompressed stream using the IHDR geometry and save it
  #[arg(long)]
  unfilter: bool,

  /// Fail if an IDAT chunk's CRC32 doesn't match its contents
  #[arg(long)]
  verify_crc: bool,

  /// Walk the chunks with strict framing instead of searching for IDAT tags
  #[arg(long)]
  strict: bool,

  /// Log every step, down to each scanline
  #[arg(short, long)]
  verbose: bool,
}
impl Args {
  fn decode_options(&self) -> DecodeOptions {
    let discipline =
      if self.strict { ScanDiscipline::Sequential } else { ScanDiscipline::MarkerSearch };
    DecodeOptions { discipline, verify_crc: self.verify_crc }
  }

  fn artifacts_dir(&self) -> PathBuf {
    let stem = self.file.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    PathBuf::from(format!("_{stem}"))
  }
}

#[derive(Debug)]
enum CliError {
  Io(PathBuf, std::io::Error),
  Png(PngError),
}
impl fmt::Display for CliError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(path, e) => write!(f, "{}: {e}", path.display()),
      Self::Png(e) => fmt::Display::fmt(e, f),
    }
  }
}
impl From<PngError> for CliError {
  #[inline]
  fn from(e: PngError) -> Self {
    Self::Png(e)
  }
}

fn write_artifact(dir: &Path, name: &str, data: &[u8]) -> Result<(), CliError> {
  fs::create_dir_all(dir).map_err(|e| CliError::Io(dir.to_path_buf(), e))?;
  let path = dir.join(name);
  fs::write(&path, data).map_err(|e| CliError::Io(path.clone(), e))?;
  log::info!("saved {} bytes to '{}'", data.len(), path.display());
  Ok(())
}

fn run(args: &Args) -> Result<(), CliError> {
  let bytes = fs::read(&args.file).map_err(|e| CliError::Io(args.file.clone(), e))?;
  let artifacts = args.artifacts_dir();

  let scan = collect_idat(&bytes, &args.decode_options())?;
  if args.extract_idat {
    let chunk_dir = artifacts.join("_idat_chunks");
    for (i, chunk) in scan.chunks.iter().enumerate() {
      let n = i + 1;
      let tagged = [&chunk.ty().as_bytes()[..], chunk.data()].concat();
      write_artifact(&chunk_dir, &format!("idat_chunk_{n:03}.bin"), &tagged)?;
      write_artifact(
        &chunk_dir,
        &format!("idat_chunk_{n:03}_crc32.bin"),
        &chunk.declared_crc_bytes(),
      )?;
    }
  }

  let decompressed = decompress_idat(&scan.chunks, &ZlibInflate)?;
  if args.decompress {
    write_artifact(&artifacts, "idat_uncompressed.bin", &decompressed)?;
  }

  let header = extract_header(&bytes)?;
  log::info!(
    "width: {}, height: {}, bit depth: {}, color type: {:?}, bytes per pixel: {}",
    header.geometry.width,
    header.geometry.height,
    header.bit_depth,
    header.color_type,
    header.geometry.bytes_per_pixel
  );

  if args.unfilter {
    if header.is_interlaced {
      return Err(PngError::InterlaceNotSupported.into());
    }
    let pixels = unfilter(&decompressed, header.geometry)?;
    write_artifact(&artifacts, "idat_unfiltered.bin", &pixels)?;
  }
  Ok(())
}

fn main() -> ExitCode {
  let args = Args::parse();
  let level = if args.verbose { "trace" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

  match run(&args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{e}");
      ExitCode::FAILURE
    }
  }
}
