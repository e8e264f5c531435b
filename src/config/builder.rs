// CLASSIFICATION: COMMUNITY
// Filename: builder.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Builds a [`GlobalConfig`] from `(section, key, value)` entries.
//!
//! Entries are accepted in file order. `[global]` must come first since it
//! declares the device sections; overlay sections may appear anywhere.
//! Each entry reports success so the reader can collect bad line numbers,
//! and building continues after a bad entry to surface every problem in
//! one run. A device section that precedes its declaration aborts the
//! build: every later entry is refused.

use log::{debug, error, warn};

use super::overlay::OverlayRegistry;
use super::{split_list, ConfigError, GlobalConfig};
use crate::platform::Gpio;

pub struct ConfigBuilder<'g> {
    config: GlobalConfig,
    overlays: OverlayRegistry,
    gpio: &'g dyn Gpio,
    strict_numbers: bool,
    aborted_at: Option<String>,
}

impl<'g> ConfigBuilder<'g> {
    /// `gpio` resolves the bank names of GPIO overlays.
    pub fn new(gpio: &'g dyn Gpio) -> Self {
        Self {
            config: GlobalConfig::default(),
            overlays: OverlayRegistry::new(),
            gpio,
            strict_numbers: false,
            aborted_at: None,
        }
    }

    /// Reject non-numeric GPIO `pin`/`value` entries instead of reading 0.
    pub fn strict_numbers(mut self, strict: bool) -> Self {
        self.strict_numbers = strict;
        self
    }

    /// Number of devices declared so far.
    pub fn device_count(&self) -> usize {
        self.config.devices().len()
    }

    /// Apply one configuration entry. Returns `false` if it was refused.
    pub fn handle(&mut self, section: &str, key: &str, value: &str) -> bool {
        if let Some(first) = &self.aborted_at {
            debug!("[{section}] {key}: ignored, build aborted at [{first}]");
            return false;
        }
        if section == "global" {
            self.handle_global(key, value)
        } else if section.starts_with("overlay") {
            self.handle_overlay(section, key, value)
        } else {
            self.handle_device(section, key, value)
        }
    }

    fn handle_global(&mut self, key: &str, value: &str) -> bool {
        let cfg = &mut self.config;
        match key {
            "devices" => {
                for codename in split_list(value) {
                    if !cfg.add_device(&codename) {
                        warn!("device {codename} declared twice");
                    }
                }
            }
            "rootdir" => cfg.rootdir = value.into(),
            "zImage" => cfg.kernel_image_name = Some(value.to_string()),
            "initramfs" => cfg.initramfs_name = Some(value.to_string()),
            "dtbs" => cfg.dtb_folder = Some(value.to_string()),
            "cmdline" => cfg.cmdline = Some(value.to_string()),
            "bootimage" => cfg.boot_image_path = Some(value.to_string()),
            "recoveryimage" => cfg.recovery_image_path = Some(value.to_string()),
            "cmdline_keep" => cfg.keep_cmdline_keys = split_list(value),
            _ => {
                warn!("unknown global config option {key}");
                return false;
            }
        }
        true
    }

    fn handle_device(&mut self, section: &str, key: &str, value: &str) -> bool {
        let Some(dev) = self.config.device_mut(section) else {
            error!("section [{section}] is not a declared device; global section should be first");
            self.aborted_at = Some(section.to_string());
            return false;
        };
        match key {
            "name" => dev.display_name = Some(value.to_string()),
            "model" => dev.hardware_identifiers.extend(split_list(value)),
            "dtbs" => dev.dtb_candidates = split_list(value),
            "overlays" => dev.overlay_names.extend(split_list(value)),
            _ => {
                warn!("unknown option {key} for device {section}");
                return false;
            }
        }
        true
    }

    fn handle_overlay(&mut self, section: &str, key: &str, value: &str) -> bool {
        let draft = self.overlays.find_or_create(section);
        match draft.apply(key, value, self.gpio, self.strict_numbers) {
            Ok(()) => true,
            Err(e) => {
                warn!("[{section}] {e}");
                false
            }
        }
    }

    /// Fail if a configuration-order error aborted the build.
    pub fn check_order(&self) -> Result<(), ConfigError> {
        match &self.aborted_at {
            Some(section) => Err(ConfigError::GlobalNotFirst {
                section: section.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Validate cross references and freeze the configuration.
    pub fn finish(self) -> Result<GlobalConfig, ConfigError> {
        self.check_order()?;
        let Self {
            mut config,
            overlays,
            ..
        } = self;

        if config.devices().is_empty() {
            error!("no devices configured");
            return Err(ConfigError::NoDevices);
        }
        for dev in config.devices() {
            if let Some(missing) = dev.overlay_names.iter().find(|n| !overlays.contains(n)) {
                return Err(ConfigError::DanglingOverlay {
                    device: dev.codename.clone(),
                    overlay: missing.clone(),
                });
            }
        }

        config.set_overlays(overlays.finish());
        for ov in config.overlays() {
            for codename in &ov.device_codenames {
                if config.device(codename).is_none() {
                    warn!("[{}] restricted to unknown device {codename}", ov.name);
                }
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayMode;
    use crate::platform::NoGpio;

    fn feed<'a>(entries: &[(&str, &str, &str)]) -> (ConfigBuilder<'a>, Vec<bool>) {
        let mut b = ConfigBuilder::new(&NoGpio);
        let results = entries.iter().map(|(s, k, v)| b.handle(s, k, v)).collect();
        (b, results)
    }

    #[test]
    fn builds_global_and_devices() {
        let (b, ok) = feed(&[
            ("global", "devices", "hammerhead,bullhead"),
            ("global", "zImage", "zImage"),
            ("global", "cmdline_keep", "androidboot.serialno,androidboot.mode"),
            ("hammerhead", "name", "Nexus 5"),
            ("hammerhead", "model", "HHZ11k,HHZ12h"),
            ("hammerhead", "dtbs", "b.dtb,a.dtb"),
            ("bullhead", "model", "BHZ10k"),
        ]);
        assert!(ok.iter().all(|&r| r));
        let cfg = b.finish().unwrap();
        assert_eq!(cfg.devices().len(), 2);
        let hh = cfg.device("hammerhead").unwrap();
        assert_eq!(hh.display_name.as_deref(), Some("Nexus 5"));
        assert!(hh.matches("HHZ12h"));
        assert_eq!(hh.dtb_candidates, vec!["b.dtb", "a.dtb"]);
        assert_eq!(cfg.keep_cmdline_keys, vec!["androidboot.serialno", "androidboot.mode"]);
        assert_eq!(cfg.kernel_image_name.as_deref(), Some("zImage"));
    }

    #[test]
    fn unknown_options_are_refused_but_build_continues() {
        let (b, ok) = feed(&[
            ("global", "devices", "d"),
            ("global", "colour", "blue"),
            ("d", "flavour", "x"),
            ("d", "name", "D"),
        ]);
        assert_eq!(ok, vec![true, false, false, true]);
        assert!(b.finish().is_ok());
    }

    #[test]
    fn device_before_global_aborts() {
        let (b, ok) = feed(&[
            ("d", "name", "D"),
            ("global", "devices", "d"),
            ("d", "name", "D"),
        ]);
        assert_eq!(ok, vec![false, false, false]);
        assert_eq!(b.device_count(), 0);
        assert!(matches!(b.finish(), Err(ConfigError::GlobalNotFirst { section }) if section == "d"));
    }

    #[test]
    fn undeclared_device_section_aborts() {
        let (b, _) = feed(&[("global", "devices", "d"), ("e", "name", "E")]);
        assert!(matches!(b.finish(), Err(ConfigError::GlobalNotFirst { .. })));
    }

    #[test]
    fn empty_device_list_fails() {
        let (b, _) = feed(&[("global", "rootdir", "/")]);
        assert!(matches!(b.finish(), Err(ConfigError::NoDevices)));
    }

    #[test]
    fn dangling_overlay_reference_fails() {
        let (b, _) = feed(&[
            ("global", "devices", "d"),
            ("d", "overlays", "overlay-missing"),
        ]);
        match b.finish() {
            Err(ConfigError::DanglingOverlay { device, overlay }) => {
                assert_eq!(device, "d");
                assert_eq!(overlay, "overlay-missing");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overlays_may_be_declared_after_referencing_device() {
        let (b, ok) = feed(&[
            ("global", "devices", "d"),
            ("d", "overlays", "overlay-panel"),
            ("overlay-panel", "path", "panel.dtbo"),
            ("overlay-panel", "mode", "fixed"),
        ]);
        assert!(ok.iter().all(|&r| r));
        let cfg = b.finish().unwrap();
        let ov = cfg.overlay("overlay-panel").unwrap();
        assert_eq!(ov.mode, OverlayMode::Fixed);
        assert_eq!(ov.file_path.as_deref(), Some("panel.dtbo"));
    }

    #[test]
    fn gpio_bank_failure_rejects_only_that_key() {
        let (b, ok) = feed(&[
            ("global", "devices", "d"),
            ("overlay-g", "mode", "gpio"),
            ("overlay-g", "bank", "nope"),
            ("overlay-g", "pin", "3"),
        ]);
        assert_eq!(ok, vec![true, true, false, true]);
        let cfg = b.finish().unwrap();
        match &cfg.overlay("overlay-g").unwrap().mode {
            OverlayMode::Gpio(c) => {
                assert_eq!(c.bank, None);
                assert_eq!(c.pin, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn strict_numbers_reject_garbage() {
        let mut b = ConfigBuilder::new(&NoGpio).strict_numbers(true);
        assert!(b.handle("overlay-g", "mode", "gpio"));
        assert!(!b.handle("overlay-g", "pin", "three"));
        assert!(b.handle("overlay-g", "value", "1"));
    }

    #[test]
    fn repeated_devices_key_appends() {
        let (b, _) = feed(&[("global", "devices", "a,b"), ("global", "devices", "b,c")]);
        let cfg = b.finish().unwrap();
        let names: Vec<_> = cfg.devices().iter().map(|d| d.codename.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
