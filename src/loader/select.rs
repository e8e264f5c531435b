// CLASSIFICATION: COMMUNITY
// Filename: select.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Decide which overlays apply to the resolved device.
//!
//! `Cmdline` overlays need an exact `key=value` match; a bare `key` does
//! not satisfy them. This is stricter than the presence test used when
//! carrying parameters over to the next command line.

use log::{debug, warn};

use super::{load_overlay, Blob, LoadError};
use crate::cmdline::KernelCmdline;
use crate::config::{DeviceConfig, GlobalConfig, OverlayConfig, OverlayMode};
use crate::platform::Gpio;

/// Overlays the device names, or that name the device, in declaration order.
pub fn overlays_for<'c>(
    config: &'c GlobalConfig,
    device: &'c DeviceConfig,
) -> impl Iterator<Item = &'c OverlayConfig> + 'c {
    config.overlays().iter().filter(move |ov| {
        device.overlay_names.contains(&ov.name) || ov.device_codenames.contains(&device.codename)
    })
}

/// Evaluate an overlay's mode for `device` against the current state.
pub fn should_apply_overlay(
    overlay: &OverlayConfig,
    device: &DeviceConfig,
    current: Option<&KernelCmdline>,
    gpio: &dyn Gpio,
) -> bool {
    if let OverlayMode::Invalid { raw } = &overlay.mode {
        warn!("{} has invalid mode {raw:?}, not applying", overlay.name);
        return false;
    }
    if !overlay.allows_device(&device.codename) {
        debug!("{} is not for {}", overlay.name, device.codename);
        return false;
    }
    match &overlay.mode {
        OverlayMode::Fixed => true,
        OverlayMode::Gpio(cond) => {
            let Some(bank) = cond.bank.as_deref() else {
                warn!("{} has no usable gpio bank", overlay.name);
                return false;
            };
            match gpio.read_pin(bank, cond.pin) {
                Ok(v) => v == cond.value,
                Err(e) => {
                    warn!("{}: reading {bank} pin {}: {e}", overlay.name, cond.pin);
                    false
                }
            }
        }
        OverlayMode::Cmdline(cond) => match (cond.key.as_deref(), cond.value.as_deref(), current) {
            (Some(key), Some(expected), Some(cl)) => cl.get_value(key) == Some(expected),
            _ => false,
        },
        OverlayMode::Invalid { .. } => false,
    }
}

/// Load every overlay that applies to `device`. A failed read aborts.
pub fn applicable_overlays<'c>(
    config: &'c GlobalConfig,
    device: &'c DeviceConfig,
    current: Option<&KernelCmdline>,
    gpio: &dyn Gpio,
) -> Result<Vec<(&'c OverlayConfig, Blob)>, LoadError> {
    let mut out = Vec::new();
    for ov in overlays_for(config, device) {
        if should_apply_overlay(ov, device, current, gpio) {
            out.push((ov, load_overlay(config, ov)?));
        }
    }
    Ok(out)
}
