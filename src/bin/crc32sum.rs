//! Prints the CRC32 of a file.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, ValueEnum};

use idat_unbuilder::crc32::{parse_polynomial, Crc32Config};

/// Calculate the CRC32 checksum of a file using the standard, reversed, or a
/// custom polynomial.
#[derive(Parser, Debug)]
#[command(name = "crc32sum")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    crc32sum file.bin standard
    crc32sum file.bin reversed
    crc32sum file.bin custom 0x82F63B78")]
struct Args {
  /// The file to checksum
  #[arg(value_name = "FILE")]
  file: PathBuf,

  /// Which polynomial to use
  #[arg(value_enum)]
  polynomial_type: PolynomialType,

  /// Hex polynomial in reflected form, needed for `custom` (eg: 0x1EDC6F41)
  #[arg(value_name = "POLYNOMIAL")]
  custom_polynomial: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolynomialType {
  /// 0x04C11DB7, forward bit order
  Standard,
  /// 0xEDB88320, reflected bit order (zlib, PNG, ZIP)
  Reversed,
  /// Your polynomial, reflected bit order
  Custom,
}

/// The preset to use and how to describe it.
fn pick_config(args: &Args) -> Result<(Crc32Config, String), String> {
  Ok(match args.polynomial_type {
    PolynomialType::Standard => {
      (Crc32Config::STANDARD, "Standard Polynomial 0x04C11DB7".to_string())
    }
    PolynomialType::Reversed => {
      (Crc32Config::REVERSED, "Reversed Polynomial 0xEDB88320".to_string())
    }
    PolynomialType::Custom => {
      let Some(text) = args.custom_polynomial.as_deref() else {
        return Err(
          "Custom polynomial value is required when using 'custom' polynomial type.".to_string(),
        );
      };
      let polynomial = parse_polynomial(text)
        .map_err(|_| format!("'{text}' is not a valid hexadecimal polynomial."))?;
      (Crc32Config::custom(polynomial), format!("Custom Polynomial {text}"))
    }
  })
}

fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
  let args = Args::parse();

  let (config, description) = match pick_config(&args) {
    Ok(picked) => picked,
    Err(msg) => {
      eprintln!("Error: {msg}");
      return ExitCode::FAILURE;
    }
  };
  let data = match std::fs::read(&args.file) {
    Ok(data) => data,
    Err(e) => {
      eprintln!("Error: '{}': {e}", args.file.display());
      return ExitCode::FAILURE;
    }
  };
  log::debug!("{config:?} over {} bytes", data.len());
  println!("CRC32 ({description}) for '{}': {:08x}", args.file.display(), config.checksum(&data));
  ExitCode::SUCCESS
}
