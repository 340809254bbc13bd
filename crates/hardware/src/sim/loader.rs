//! Image Loader.
//!
//! This module places program images into ROM or RAM through the memory controller's
//! backdoor, which ignores write protection and takes no simulated time. It performs:
//! 1. **Flat binaries:** Raw little-endian bytes copied to a base address.
//! 2. **Hex images:** One 32-bit word per line, as used for memory initialization files.
//!    Blank lines and `#`/`//` comments are ignored; `@addr` sets the word address.
//! 3. **ELF executables:** `PT_LOAD` segments of 32- or 64-bit RISC-V ELF files, with the
//!    zero-filled tail of each segment and the entry point.

use std::fs;
use std::path::Path;

use object::elf::{ELFCLASS32, ELFCLASS64, EM_RISCV, FileHeader32, FileHeader64, PT_LOAD};
use object::read::elf::{FileHeader, ProgramHeader};
use object::Endianness;
use thiserror::Error;
use tracing::{debug, info};

use crate::common::MemFault;
use crate::soc::MemoryController;

/// Errors raised while loading an image.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The image file could not be read.
    #[error("cannot read image: {0}")]
    Io(#[from] std::io::Error),

    /// The image does not fit inside ROM or RAM.
    #[error("image does not fit in memory: {0}")]
    OutOfRange(#[from] MemFault),

    /// A hex image line could not be parsed.
    #[error("hex image line {line}: {message}")]
    Hex {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// The ELF file is malformed.
    #[error("malformed ELF: {0}")]
    Elf(String),

    /// The ELF file is not a RISC-V executable of a supported class.
    #[error("unsupported ELF file: {0}")]
    UnsupportedElf(String),
}

/// Image file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageFormat {
    /// Flat little-endian binary.
    Binary,
    /// Text hex words.
    Hex,
    /// ELF executable.
    Elf,
    /// Choose from the file contents: ELF magic, then extension `.hex`/`.mem`, else binary.
    #[default]
    Auto,
}

/// Summary of a loaded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadedImage {
    /// Entry point, for formats that carry one.
    pub entry: Option<u64>,
    /// Number of bytes written.
    pub bytes: usize,
}

/// Copies a flat binary to `base`.
///
/// # Returns
///
/// The number of bytes written.
pub fn load_binary(
    controller: &mut MemoryController,
    base: u64,
    data: &[u8],
) -> Result<usize, LoadError> {
    controller.load(base, data)?;
    debug!(base = format_args!("{base:#x}"), len = data.len(), "binary loaded");
    Ok(data.len())
}

/// Parses a hex image into contiguous chunks.
///
/// # Arguments
///
/// * `base` - Byte address of word address 0.
/// * `text` - The image text.
///
/// # Returns
///
/// `(byte address, bytes)` for every run of consecutive words.
pub fn parse_hex(base: u64, text: &str) -> Result<Vec<(u64, Vec<u8>)>, LoadError> {
    let mut chunks: Vec<(u64, Vec<u8>)> = Vec::new();
    let mut word_addr: u64 = 0;
    for (idx, raw) in text.lines().enumerate() {
        let line = raw
            .split("//")
            .next()
            .and_then(|l| l.split('#').next())
            .unwrap_or("")
            .trim();
        if line.is_empty() {
            continue;
        }
        let error = |message: String| LoadError::Hex {
            line: idx + 1,
            message,
        };
        if let Some(addr) = line.strip_prefix('@') {
            word_addr = u64::from_str_radix(addr.trim(), 16)
                .map_err(|e| error(format!("bad address {addr:?}: {e}")))?;
            continue;
        }
        let digits = line.trim_start_matches("0x").replace('_', "");
        let word = u32::from_str_radix(&digits, 16)
            .map_err(|e| error(format!("bad word {line:?}: {e}")))?;
        let addr = base.wrapping_add(word_addr.wrapping_mul(4));
        match chunks.last_mut() {
            Some((start, bytes)) if *start + bytes.len() as u64 == addr => {
                bytes.extend_from_slice(&word.to_le_bytes());
            }
            _ => chunks.push((addr, word.to_le_bytes().to_vec())),
        }
        word_addr += 1;
    }
    Ok(chunks)
}

/// Loads a hex image whose word address 0 is at `base`.
///
/// # Returns
///
/// The number of bytes written.
pub fn load_hex(
    controller: &mut MemoryController,
    base: u64,
    text: &str,
) -> Result<usize, LoadError> {
    let mut total = 0;
    for (addr, bytes) in parse_hex(base, text)? {
        controller.load(addr, &bytes)?;
        total += bytes.len();
    }
    debug!(base = format_args!("{base:#x}"), len = total, "hex image loaded");
    Ok(total)
}

fn load_segments<Elf: FileHeader<Endian = Endianness>>(
    controller: &mut MemoryController,
    data: &[u8],
) -> Result<LoadedImage, LoadError> {
    let malformed = |e: object::read::Error| LoadError::Elf(e.to_string());
    let header = Elf::parse(data).map_err(malformed)?;
    let endian = header.endian().map_err(malformed)?;
    if header.e_machine(endian) != EM_RISCV {
        return Err(LoadError::UnsupportedElf(format!(
            "machine {} is not RISC-V",
            header.e_machine(endian)
        )));
    }
    let mut total = 0;
    for segment in header.program_headers(endian, data).map_err(malformed)? {
        if segment.p_type(endian) != PT_LOAD {
            continue;
        }
        let addr: u64 = segment.p_paddr(endian).into();
        let memsz: u64 = segment.p_memsz(endian).into();
        let bytes = segment
            .data(endian, data)
            .map_err(|()| LoadError::UnsupportedElf(format!("segment at {addr:#x} is truncated")))?;
        controller.load(addr, bytes)?;
        let fill = memsz.saturating_sub(bytes.len() as u64);
        if fill > 0 {
            let zeros = vec![0u8; fill as usize];
            controller.load(addr + bytes.len() as u64, &zeros)?;
        }
        debug!(addr = format_args!("{addr:#x}"), filesz = bytes.len(), memsz, "segment loaded");
        total += memsz as usize;
    }
    Ok(LoadedImage {
        entry: Some(header.e_entry(endian).into()),
        bytes: total,
    })
}

/// Loads the `PT_LOAD` segments of an ELF executable at their physical addresses.
pub fn load_elf(controller: &mut MemoryController, data: &[u8]) -> Result<LoadedImage, LoadError> {
    match data.get(4).copied() {
        Some(ELFCLASS32) => load_segments::<FileHeader32<Endianness>>(controller, data),
        Some(ELFCLASS64) => load_segments::<FileHeader64<Endianness>>(controller, data),
        other => Err(LoadError::UnsupportedElf(format!("ELF class {other:?}"))),
    }
}

/// Reads and loads an image file.
///
/// # Arguments
///
/// * `controller` - Target memory controller.
/// * `path` - Image path.
/// * `format` - Image format, or `Auto`.
/// * `base` - Load address for binary and hex images.
pub fn load_image(
    controller: &mut MemoryController,
    path: &Path,
    format: ImageFormat,
    base: u64,
) -> Result<LoadedImage, LoadError> {
    let data = fs::read(path)?;
    let format = match format {
        ImageFormat::Auto if data.starts_with(b"\x7fELF") => ImageFormat::Elf,
        ImageFormat::Auto
            if path
                .extension()
                .is_some_and(|ext| ext == "hex" || ext == "mem") =>
        {
            ImageFormat::Hex
        }
        ImageFormat::Auto => ImageFormat::Binary,
        explicit => explicit,
    };
    let image = match format {
        ImageFormat::Elf => load_elf(controller, &data)?,
        ImageFormat::Hex => {
            let text = String::from_utf8_lossy(&data);
            LoadedImage {
                entry: None,
                bytes: load_hex(controller, base, &text)?,
            }
        }
        ImageFormat::Binary | ImageFormat::Auto => LoadedImage {
            entry: None,
            bytes: load_binary(controller, base, &data)?,
        },
    };
    info!(path = %path.display(), ?format, bytes = image.bytes, "image loaded");
    Ok(image)
}
