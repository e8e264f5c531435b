// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// devboot · Boot Resource Loader
//
// Reads the blobs the resolved device needs:
//
//  1. kernel   – boot image first, then `rootdir/<zImage>`
//  2. ramdisk  – boot image first, then `rootdir/<initramfs>`
//  3. dtb      – first existing `rootdir/<dtbs>/<candidate>`
//  4. overlays – `rootdir/<dtbs>/<overlay path>` when selected
//
// Files are read whole. No call retries; a failed read is final.
// ─────────────────────────────────────────────────────────────

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::cmdline::{build_cmdline, KernelCmdline};
use crate::config::{join_under, DeviceConfig, GlobalConfig, OverlayConfig};
use crate::platform::{BootContainer, Gpio};

/// Overlay selection.
pub mod select;

pub use select::{applicable_overlays, overlays_for, should_apply_overlay};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("couldn't find any matching dtbs for {device}")]
    NoMatchingDtb { device: String },
}

/// Where a blob came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobSource {
    Container,
    File(PathBuf),
}

/// Whole contents of one boot resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub source: BlobSource,
    pub data: Vec<u8>,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            BlobSource::File(p) => Some(p),
            BlobSource::Container => None,
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_open(mut file: File, path: &Path) -> Result<Blob, LoadError> {
    let mut data = Vec::new();
    if let Ok(meta) = file.metadata() {
        data.reserve(meta.len() as usize);
    }
    file.read_to_end(&mut data).map_err(|e| io_error(path, e))?;
    Ok(Blob {
        source: BlobSource::File(path.to_path_buf()),
        data,
    })
}

/// Read `path` whole.
pub fn load_file(path: &Path) -> Result<Blob, LoadError> {
    let file = File::open(path).map_err(|e| {
        warn!("failed to open {}: {e}", path.display());
        io_error(path, e)
    })?;
    info!("loading blob {}", path.display());
    read_open(file, path)
}

fn from_container(data: &[u8]) -> Blob {
    Blob {
        source: BlobSource::Container,
        data: data.to_vec(),
    }
}

fn configured<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, LoadError> {
    value
        .as_deref()
        .ok_or_else(|| LoadError::NotConfigured(what.to_string()))
}

/// Kernel from the boot container, else `rootdir/<zImage>`.
pub fn load_kernel_image(config: &GlobalConfig, container: &dyn BootContainer) -> Result<Blob, LoadError> {
    if let Some(kernel) = container.kernel() {
        info!("using kernel from boot image ({} bytes)", kernel.len());
        return Ok(from_container(kernel));
    }
    load_file(&config.root_path(configured(&config.kernel_image_name, "zImage")?))
}

/// Ramdisk from the boot container, else `rootdir/<initramfs>`.
pub fn load_ramdisk(config: &GlobalConfig, container: &dyn BootContainer) -> Result<Blob, LoadError> {
    if let Some(ramdisk) = container.ramdisk() {
        info!("using ramdisk from boot image ({} bytes)", ramdisk.len());
        return Ok(from_container(ramdisk));
    }
    load_file(&config.root_path(configured(&config.initramfs_name, "initramfs")?))
}

fn dtb_dir(config: &GlobalConfig) -> Result<PathBuf, LoadError> {
    config
        .dtb_dir()
        .ok_or_else(|| LoadError::NotConfigured("dtbs".to_string()))
}

/// Contents of the first candidate device tree that opens.
pub fn load_dtb(config: &GlobalConfig, device: &DeviceConfig) -> Result<Blob, LoadError> {
    let dir = dtb_dir(config)?;
    for candidate in &device.dtb_candidates {
        let path = join_under(&dir, candidate);
        match File::open(&path) {
            Ok(file) => {
                info!("loading dtb {}", path.display());
                return read_open(file, &path);
            }
            Err(e) => warn!("failed to open {}: {e}", path.display()),
        }
    }
    warn!("couldn't find any matching dtbs for {}", device.codename);
    Err(LoadError::NoMatchingDtb {
        device: device.codename.clone(),
    })
}

/// Read the overlay file under the dtb folder.
pub fn load_overlay(config: &GlobalConfig, overlay: &OverlayConfig) -> Result<Blob, LoadError> {
    let file = configured(&overlay.file_path, &format!("path of {}", overlay.name))?;
    load_file(&join_under(&dtb_dir(config)?, file))
}

/// Everything needed to boot the resolved device.
#[derive(Debug, Clone)]
pub struct BootResources {
    pub device: String,
    pub kernel: Blob,
    pub ramdisk: Blob,
    pub dtb: Blob,
    /// `(overlay name, contents)` in declaration order.
    pub overlays: Vec<(String, Blob)>,
    pub cmdline: String,
}

impl BootResources {
    /// Load every resource for `device` and assemble its command line.
    /// Any failed load aborts; none of these can be worked around.
    pub fn gather(
        config: &GlobalConfig,
        device: &DeviceConfig,
        container: &dyn BootContainer,
        gpio: &dyn Gpio,
        current: Option<&KernelCmdline>,
        root: &str,
    ) -> Result<Self, LoadError> {
        let kernel = load_kernel_image(config, container)?;
        let ramdisk = load_ramdisk(config, container)?;
        let dtb = load_dtb(config, device)?;
        let overlays = applicable_overlays(config, device, current, gpio)?
            .into_iter()
            .map(|(ov, blob)| (ov.name.clone(), blob))
            .collect();
        let platform_tail = container.cmdline();
        let cmdline = build_cmdline(config, root, platform_tail.as_deref(), current);
        Ok(Self {
            device: device.codename.clone(),
            kernel,
            ramdisk,
            dtb,
            overlays,
            cmdline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::platform::{AndroidBootImage, NoContainer, NoGpio};
    use std::fs;
    use tempfile::tempdir;

    fn layout() -> (tempfile::TempDir, GlobalConfig) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("dtbs")).unwrap();
        fs::write(dir.path().join("zImage"), b"flat-kernel").unwrap();
        fs::write(dir.path().join("initramfs.cpio"), b"flat-ramdisk").unwrap();
        fs::write(dir.path().join("dtbs/b.dtb"), b"dtb-b").unwrap();
        fs::write(dir.path().join("dtbs/panel.dtbo"), b"panel").unwrap();
        let text = format!(
            "[global]\ndevices=d\nrootdir={}\nzImage=zImage\ninitramfs=initramfs.cpio\ndtbs=dtbs\n\
             [d]\ndtbs=a.dtb,b.dtb,c.dtb\n\
             [overlay-panel]\npath=panel.dtbo\n\
             [overlay-gone]\npath=gone.dtbo\n",
            dir.path().display()
        );
        let cfg = parse_config(&text, &NoGpio, false).unwrap();
        (dir, cfg)
    }

    #[test]
    fn flat_files_when_container_is_empty() {
        let (_dir, cfg) = layout();
        let k = load_kernel_image(&cfg, &NoContainer).unwrap();
        assert_eq!(k.data, b"flat-kernel");
        assert!(k.path().unwrap().ends_with("zImage"));
        assert_eq!(load_ramdisk(&cfg, &NoContainer).unwrap().data, b"flat-ramdisk");
    }

    #[test]
    fn container_wins_over_flat_files() {
        let (_dir, cfg) = layout();
        let img = AndroidBootImage::parse(crate::platform::bootimg::build_image(2048, b"K", b"R", "")).unwrap();
        let k = load_kernel_image(&cfg, &img).unwrap();
        assert_eq!(k.source, BlobSource::Container);
        assert_eq!(k.data, b"K");
        assert_eq!(load_ramdisk(&cfg, &img).unwrap().data, b"R");
    }

    #[test]
    fn dtb_first_existing_candidate() {
        let (_dir, cfg) = layout();
        let dtb = load_dtb(&cfg, cfg.device("d").unwrap()).unwrap();
        assert_eq!(dtb.data, b"dtb-b");
        assert!(dtb.path().unwrap().ends_with("b.dtb"));
    }

    #[test]
    fn dtb_exhausted_candidates_fail() {
        let (dir, cfg) = layout();
        fs::remove_file(dir.path().join("dtbs/b.dtb")).unwrap();
        assert!(matches!(
            load_dtb(&cfg, cfg.device("d").unwrap()),
            Err(LoadError::NoMatchingDtb { device }) if device == "d"
        ));
    }

    #[test]
    fn overlay_read_has_no_fallback() {
        let (_dir, cfg) = layout();
        assert_eq!(load_overlay(&cfg, cfg.overlay("overlay-panel").unwrap()).unwrap().data, b"panel");
        assert!(matches!(
            load_overlay(&cfg, cfg.overlay("overlay-gone").unwrap()),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn absolute_names_are_read_below_rootdir() {
        let (dir, _) = layout();
        let text = format!(
            "[global]\ndevices=d\nrootdir={}\nzImage=/zImage\ndtbs=/dtbs\n\
             [d]\ndtbs=/b.dtb\n\
             [overlay-panel]\npath=/panel.dtbo\ndevices=d\n",
            dir.path().display()
        );
        let cfg = parse_config(&text, &NoGpio, false).unwrap();
        let k = load_kernel_image(&cfg, &NoContainer).unwrap();
        assert!(k.path().unwrap().starts_with(dir.path()));
        assert_eq!(k.data, b"flat-kernel");
        let dtb = load_dtb(&cfg, cfg.device("d").unwrap()).unwrap();
        assert_eq!(dtb.path().unwrap(), dir.path().join("dtbs/b.dtb"));
        let ov = load_overlay(&cfg, cfg.overlay("overlay-panel").unwrap()).unwrap();
        assert_eq!(ov.data, b"panel");
    }

    #[test]
    fn unconfigured_kernel_name() {
        let cfg = parse_config("[global]\ndevices=d\n", &NoGpio, false).unwrap();
        assert!(matches!(
            load_kernel_image(&cfg, &NoContainer),
            Err(LoadError::NotConfigured(what)) if what == "zImage"
        ));
    }
}
