// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Boot resource resolution for multi-device boot images.
//!
//! A single boot image carries kernels, ramdisks and device trees for many
//! devices. The crate parses the sectioned device configuration, matches the
//! running hardware against exactly one device entry, loads the blobs that
//! device needs and assembles the kernel command line handed to the next
//! kernel.

/// Sectioned `key=value` configuration reader.
pub mod ini;

/// Typed configuration model and its incremental builder.
pub mod config;

/// Hardware identifier to device matching.
pub mod resolver;

/// Kernel, ramdisk, device tree and overlay loading.
pub mod loader;

/// Kernel command line parsing and assembly.
pub mod cmdline;

/// Platform collaborators: GPIO, boot images, hardware identity, iomem.
pub mod platform;

/// Environment driven runtime settings.
pub mod settings;

/// Inspection CLI.
pub mod cli;

pub use config::{load_config, parse_config, ConfigError, DeviceConfig, GlobalConfig};
pub use loader::{Blob, BootResources, LoadError};
pub use resolver::{find_device, resolve};
