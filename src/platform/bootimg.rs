// CLASSIFICATION: COMMUNITY
// Filename: bootimg.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// devboot · Android Boot Image
//
// Header layout (v0–v2, little endian):
//
//   0    magic "ANDROID!"        36   page_size
//   8    kernel_size             40   header_version
//   16   ramdisk_size            64   cmdline[512]
//   24   second_size             608  extra_cmdline[1024]
//
// The kernel starts at the first page; the ramdisk follows at the
// next page boundary after the kernel.
// ─────────────────────────────────────────────────────────────

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use super::BootContainer;
use crate::config::{BootTarget, GlobalConfig};

pub const BOOT_MAGIC: &[u8; 8] = b"ANDROID!";

const KERNEL_SIZE_OFF: usize = 8;
const RAMDISK_SIZE_OFF: usize = 16;
const PAGE_SIZE_OFF: usize = 36;
const CMDLINE_OFF: usize = 64;
const CMDLINE_LEN: usize = 512;
const EXTRA_CMDLINE_OFF: usize = 608;
const EXTRA_CMDLINE_LEN: usize = 1024;
const HEADER_LEN: usize = EXTRA_CMDLINE_OFF + EXTRA_CMDLINE_LEN;

#[derive(Debug, Error)]
pub enum BootImageError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not an android boot image")]
    BadMagic,
    #[error("boot image header declares page size 0")]
    BadPageSize,
    #[error("boot image is truncated")]
    Truncated,
}

/// Parsed boot image owning its bytes.
#[derive(Debug, Clone)]
pub struct AndroidBootImage {
    data: Vec<u8>,
    kernel: Range<usize>,
    ramdisk: Range<usize>,
    cmdline: String,
}

fn le32(data: &[u8], off: usize) -> usize {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]) as usize
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn align_up(value: usize, align: usize) -> Option<usize> {
    value.checked_add(align - 1).map(|v| v / align * align)
}

impl AndroidBootImage {
    pub fn parse(data: Vec<u8>) -> Result<Self, BootImageError> {
        if data.len() < HEADER_LEN {
            return Err(if data.starts_with(BOOT_MAGIC) {
                BootImageError::Truncated
            } else {
                BootImageError::BadMagic
            });
        }
        if &data[..BOOT_MAGIC.len()] != BOOT_MAGIC {
            return Err(BootImageError::BadMagic);
        }
        let page = le32(&data, PAGE_SIZE_OFF);
        if page == 0 {
            return Err(BootImageError::BadPageSize);
        }
        let kernel_size = le32(&data, KERNEL_SIZE_OFF);
        let ramdisk_size = le32(&data, RAMDISK_SIZE_OFF);

        let kernel_start = page;
        if kernel_start > data.len() {
            return Err(BootImageError::Truncated);
        }
        let kernel_end = kernel_start
            .checked_add(kernel_size)
            .ok_or(BootImageError::Truncated)?;
        let ramdisk_start = align_up(kernel_end, page).ok_or(BootImageError::Truncated)?;
        let ramdisk_end = ramdisk_start
            .checked_add(ramdisk_size)
            .ok_or(BootImageError::Truncated)?;
        if kernel_end > data.len() || ramdisk_end > data.len() {
            return Err(BootImageError::Truncated);
        }

        // Long command lines spill from the first field into the second.
        let mut cmdline = c_string(&data[CMDLINE_OFF..CMDLINE_OFF + CMDLINE_LEN]);
        cmdline.push_str(&c_string(&data[EXTRA_CMDLINE_OFF..HEADER_LEN]));

        Ok(Self {
            data,
            kernel: kernel_start..kernel_end,
            ramdisk: ramdisk_start..ramdisk_end,
            cmdline,
        })
    }

    pub fn open(path: &Path) -> Result<Self, BootImageError> {
        let data = fs::read(path).map_err(|source| BootImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(data)
    }

    /// Open the image configured for `target`. A missing or unreadable
    /// image is not an error: the caller falls back to flat files.
    pub fn open_configured(config: &GlobalConfig, target: BootTarget) -> Option<Self> {
        let path = config.container_path(target)?;
        match Self::open(&path) {
            Ok(img) => {
                info!("using boot image {}", path.display());
                Some(img)
            }
            Err(e) => {
                warn!("ignoring boot image {}: {e}", path.display());
                None
            }
        }
    }
}

impl BootContainer for AndroidBootImage {
    fn kernel(&self) -> Option<&[u8]> {
        Some(&self.data[self.kernel.clone()]).filter(|k| !k.is_empty())
    }

    fn ramdisk(&self) -> Option<&[u8]> {
        Some(&self.data[self.ramdisk.clone()]).filter(|r| !r.is_empty())
    }

    fn cmdline(&self) -> Option<String> {
        Some(self.cmdline.clone()).filter(|c| !c.is_empty())
    }
}

/// Pack the given parts into an image. Used by tests.
#[doc(hidden)]
pub fn build_image(page: usize, kernel: &[u8], ramdisk: &[u8], cmdline: &str) -> Vec<u8> {
    let mut out = vec![0u8; page.max(HEADER_LEN)];
    out[..8].copy_from_slice(BOOT_MAGIC);
    out[KERNEL_SIZE_OFF..KERNEL_SIZE_OFF + 4].copy_from_slice(&(kernel.len() as u32).to_le_bytes());
    out[RAMDISK_SIZE_OFF..RAMDISK_SIZE_OFF + 4].copy_from_slice(&(ramdisk.len() as u32).to_le_bytes());
    out[PAGE_SIZE_OFF..PAGE_SIZE_OFF + 4].copy_from_slice(&(page as u32).to_le_bytes());
    let cl = cmdline.as_bytes();
    let first = cl.len().min(CMDLINE_LEN - 1);
    out[CMDLINE_OFF..CMDLINE_OFF + first].copy_from_slice(&cl[..first]);
    let rest = &cl[first..];
    out[EXTRA_CMDLINE_OFF..EXTRA_CMDLINE_OFF + rest.len()].copy_from_slice(rest);
    out.truncate(page);
    out.resize(page, 0);
    out.extend_from_slice(kernel);
    out.resize(align_up(out.len(), page).unwrap_or(out.len()), 0);
    out.extend_from_slice(ramdisk);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_kernel_and_ramdisk() {
        let img = build_image(2048, b"KERNEL", b"RAMDISK", "console=ttySAC2");
        let parsed = AndroidBootImage::parse(img).unwrap();
        assert_eq!(parsed.kernel(), Some(&b"KERNEL"[..]));
        assert_eq!(parsed.ramdisk(), Some(&b"RAMDISK"[..]));
        assert_eq!(parsed.cmdline().as_deref(), Some("console=ttySAC2"));
    }

    #[test]
    fn empty_parts_are_absent() {
        let parsed = AndroidBootImage::parse(build_image(2048, b"", b"RD", "")).unwrap();
        assert_eq!(parsed.kernel(), None);
        assert_eq!(parsed.ramdisk(), Some(&b"RD"[..]));
        assert_eq!(parsed.cmdline(), None);
    }

    #[test]
    fn long_cmdline_spans_both_fields() {
        let long = "x".repeat(600);
        let parsed = AndroidBootImage::parse(build_image(4096, b"K", b"", &long)).unwrap();
        assert_eq!(parsed.cmdline().unwrap().len(), 600);
    }

    #[test]
    fn rejects_bad_magic_and_truncation() {
        assert!(matches!(AndroidBootImage::parse(vec![0; 4096]), Err(BootImageError::BadMagic)));
        let mut img = build_image(2048, b"KERNEL", b"RAMDISK", "");
        img.truncate(2050);
        assert!(matches!(AndroidBootImage::parse(img), Err(BootImageError::Truncated)));
    }

    fn with_sizes(page: u32, kernel_size: u32, ramdisk_size: u32) -> Vec<u8> {
        let mut img = build_image(2048, b"K", b"R", "");
        img[KERNEL_SIZE_OFF..KERNEL_SIZE_OFF + 4].copy_from_slice(&kernel_size.to_le_bytes());
        img[RAMDISK_SIZE_OFF..RAMDISK_SIZE_OFF + 4].copy_from_slice(&ramdisk_size.to_le_bytes());
        img[PAGE_SIZE_OFF..PAGE_SIZE_OFF + 4].copy_from_slice(&page.to_le_bytes());
        img
    }

    #[test]
    fn oversized_header_sizes_are_truncation() {
        for img in [
            with_sizes(0x1000, 0xFFFF_F800, 0),
            with_sizes(0x800, 1, 0xFFFF_FFFF),
            with_sizes(0x8000_0000, 0, 0),
        ] {
            assert!(matches!(AndroidBootImage::parse(img), Err(BootImageError::Truncated)));
        }
    }
}
