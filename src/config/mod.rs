// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// devboot · Configuration Model
//
// Typed view of the device configuration file:
//
//   [global]                 paths, cmdline, devices list
//   [<codename>]             one section per declared device
//   [overlay<anything>]      one section per device-tree overlay
//
// The model is built once per run by [`ConfigBuilder`] and is
// immutable afterwards.
// ─────────────────────────────────────────────────────────────

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::ini::{self, IniError};
use crate::platform::Gpio;

/// Incremental builder fed by configuration entries.
pub mod builder;
/// Overlay definitions and registry.
pub mod overlay;

pub use builder::ConfigBuilder;
pub use overlay::{CmdlineCondition, GpioCondition, OverlayConfig, OverlayMode};

/// Errors raised while building the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A device section appeared before `[global]` declared it.
    #[error("section [{section}] appears before the global section declares it")]
    GlobalNotFirst { section: String },
    #[error("parse error on line {} ({} line(s) rejected)", first_line(.lines), .lines.len())]
    Rejected { lines: Vec<usize> },
    #[error("no devices configured")]
    NoDevices,
    #[error("device {device} references unknown overlay {overlay}")]
    DanglingOverlay { device: String, overlay: String },
}

fn first_line(lines: &[usize]) -> usize {
    lines.first().copied().unwrap_or(0)
}

/// Which packed boot image to look into for an embedded kernel/ramdisk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootTarget {
    #[default]
    Normal,
    Recovery,
}

/// One supported device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceConfig {
    pub codename: String,
    pub display_name: Option<String>,
    /// Bootloader identifiers naming this device.
    pub hardware_identifiers: BTreeSet<String>,
    /// Device tree files, tried in order.
    pub dtb_candidates: Vec<String>,
    pub overlay_names: BTreeSet<String>,
}

impl DeviceConfig {
    pub fn new(codename: &str) -> Self {
        Self {
            codename: codename.to_string(),
            ..Self::default()
        }
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.hardware_identifiers.contains(identifier)
    }
}

/// Global settings plus every device and overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalConfig {
    pub rootdir: PathBuf,
    pub kernel_image_name: Option<String>,
    pub initramfs_name: Option<String>,
    pub dtb_folder: Option<String>,
    pub boot_image_path: Option<String>,
    pub recovery_image_path: Option<String>,
    pub cmdline: Option<String>,
    pub keep_cmdline_keys: Vec<String>,
    devices: Vec<DeviceConfig>,
    overlays: Vec<OverlayConfig>,
    #[serde(skip)]
    device_index: HashMap<String, usize>,
    #[serde(skip)]
    overlay_index: HashMap<String, usize>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            rootdir: PathBuf::from("/"),
            kernel_image_name: None,
            initramfs_name: None,
            dtb_folder: None,
            boot_image_path: None,
            recovery_image_path: None,
            cmdline: None,
            keep_cmdline_keys: Vec::new(),
            devices: Vec::new(),
            overlays: Vec::new(),
            device_index: HashMap::new(),
            overlay_index: HashMap::new(),
        }
    }
}

impl GlobalConfig {
    /// Devices in declaration order.
    pub fn devices(&self) -> &[DeviceConfig] {
        &self.devices
    }

    pub fn device(&self, codename: &str) -> Option<&DeviceConfig> {
        self.device_index.get(codename).map(|&i| &self.devices[i])
    }

    /// Overlays in declaration order.
    pub fn overlays(&self) -> &[OverlayConfig] {
        &self.overlays
    }

    pub fn overlay(&self, name: &str) -> Option<&OverlayConfig> {
        self.overlay_index.get(name).map(|&i| &self.overlays[i])
    }

    /// `name` resolved under `rootdir`, even when written as absolute.
    pub fn root_path(&self, name: &str) -> PathBuf {
        join_under(&self.rootdir, name)
    }

    /// The device tree folder, if one is configured.
    pub fn dtb_dir(&self) -> Option<PathBuf> {
        self.dtb_folder.as_deref().map(|d| join_under(&self.rootdir, d))
    }

    /// Path of the packed boot image for `target`, if configured.
    pub fn container_path(&self, target: BootTarget) -> Option<PathBuf> {
        let name = match target {
            BootTarget::Normal => self.boot_image_path.as_deref(),
            BootTarget::Recovery => self.recovery_image_path.as_deref(),
        };
        name.map(|n| self.root_path(n))
    }

    pub(crate) fn add_device(&mut self, codename: &str) -> bool {
        if self.device_index.contains_key(codename) {
            return false;
        }
        self.device_index.insert(codename.to_string(), self.devices.len());
        self.devices.push(DeviceConfig::new(codename));
        true
    }

    pub(crate) fn device_mut(&mut self, codename: &str) -> Option<&mut DeviceConfig> {
        let idx = *self.device_index.get(codename)?;
        Some(&mut self.devices[idx])
    }

    pub(crate) fn set_overlays(&mut self, overlays: Vec<OverlayConfig>) {
        self.overlay_index = overlays
            .iter()
            .enumerate()
            .map(|(i, o)| (o.name.clone(), i))
            .collect();
        self.overlays = overlays;
    }
}

/// Join `name` below `base`. Leading `/` is dropped so the result never
/// leaves `base`.
pub(crate) fn join_under(base: &Path, name: &str) -> PathBuf {
    base.join(name.trim_start_matches('/'))
}

/// Split a comma separated list, trimming items and dropping empty ones.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and build the configuration at `path`.
///
/// With `strict_numbers` non-numeric GPIO `pin`/`value` entries reject the
/// line instead of reading as 0.
pub fn load_config(
    path: &Path,
    gpio: &dyn Gpio,
    strict_numbers: bool,
) -> Result<GlobalConfig, ConfigError> {
    let mut builder = ConfigBuilder::new(gpio).strict_numbers(strict_numbers);
    let parsed = ini::parse_file(path, |_, section, key, value| builder.handle(section, key, value));
    finish(builder, parsed)
}

/// Build a configuration from text already in memory.
pub fn parse_config(
    text: &str,
    gpio: &dyn Gpio,
    strict_numbers: bool,
) -> Result<GlobalConfig, ConfigError> {
    let mut builder = ConfigBuilder::new(gpio).strict_numbers(strict_numbers);
    let parsed = ini::parse_str(text, |_, section, key, value| builder.handle(section, key, value));
    finish(builder, parsed)
}

fn finish(builder: ConfigBuilder<'_>, parsed: Result<(), IniError>) -> Result<GlobalConfig, ConfigError> {
    builder.check_order()?;
    match parsed {
        Ok(()) => builder.finish(),
        Err(IniError::Io { path, source }) => Err(ConfigError::Io { path, source }),
        Err(IniError::Rejected { lines }) => {
            error!("configuration rejected on {} line(s): {lines:?}", lines.len());
            Err(ConfigError::Rejected { lines })
        }
    }
}
