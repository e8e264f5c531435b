// CLASSIFICATION: COMMUNITY
// Filename: iomem.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Kernel load address from `/proc/iomem`.

use std::fs;
use std::io;
use std::path::Path;

use log::warn;

/// Offset of the kernel text from the start of RAM on 32-bit ARM.
pub const TEXT_OFFSET: u64 = 0x8000;

const SYSTEM_RAM: &str = "System RAM";

/// Start of the first `System RAM` range plus [`TEXT_OFFSET`], rounded up
/// to `page_size`. `None` if no RAM range is listed.
pub fn kernel_base_addr(iomem: &str, page_size: u64) -> Option<u64> {
    let page_size = page_size.max(1);
    for line in iomem.lines() {
        let Some((range, name)) = line.trim_start().split_once(" : ") else {
            continue;
        };
        if name.trim_end() != SYSTEM_RAM {
            continue;
        }
        let Some((start, _end)) = range.split_once('-') else {
            continue;
        };
        let Ok(start) = u64::from_str_radix(start.trim(), 16) else {
            continue;
        };
        let addr = start.checked_add(TEXT_OFFSET)?;
        return addr.checked_add(page_size - 1).map(|a| a / page_size * page_size);
    }
    None
}

/// Read `<proc_root>/iomem` and compute the kernel base address.
pub fn read_kernel_base(proc_root: &Path, page_size: u64) -> io::Result<Option<u64>> {
    let path = proc_root.join("iomem");
    let text = fs::read_to_string(&path).map_err(|e| {
        warn!("couldn't open {}: {e}", path.display());
        e
    })?;
    Ok(kernel_base_addr(&text, page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IOMEM: &str = "\
00000000-0000ffff : reserved
10000000-1000ffff : serial
40000000-7fffffff : System RAM
  40008000-40a1ffff : Kernel code
  40b00000-40c3ffff : Kernel data
";

    #[test]
    fn first_system_ram_plus_text_offset() {
        assert_eq!(kernel_base_addr(IOMEM, 4096), Some(0x4000_8000));
    }

    #[test]
    fn rounds_up_to_page() {
        let text = "00001000-0fffffff : System RAM\n";
        assert_eq!(kernel_base_addr(text, 0x10000), Some(0x10000));
    }

    #[test]
    fn no_ram_listed() {
        assert_eq!(kernel_base_addr("00000000-0000ffff : reserved\n", 4096), None);
    }
}
