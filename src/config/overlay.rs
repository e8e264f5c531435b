// CLASSIFICATION: COMMUNITY
// Filename: overlay.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Overlay definitions and the registry that assembles them.
//!
//! An overlay section arrives as independent `key=value` entries. The
//! `mode` entry decides which further keys are meaningful, so entries are
//! applied to an [`OverlayDraft`] that is only frozen into an
//! [`OverlayConfig`] once the whole file has been read.

use std::collections::HashMap;

use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

use crate::platform::Gpio;

/// Condition under which an overlay applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OverlayMode {
    /// Always applies when selected by a device.
    Fixed,
    /// Applies when a GPIO line reads an expected value.
    Gpio(GpioCondition),
    /// Applies when the active command line carries `key=value`.
    Cmdline(CmdlineCondition),
    /// Unrecognised mode string; never applies.
    Invalid { raw: String },
}

impl OverlayMode {
    /// Parse the `mode` value of an overlay section.
    pub fn parse(value: &str) -> Self {
        match value {
            "fixed" => OverlayMode::Fixed,
            "gpio" => OverlayMode::Gpio(GpioCondition::default()),
            "cmdline" => OverlayMode::Cmdline(CmdlineCondition::default()),
            other => OverlayMode::Invalid { raw: other.to_string() },
        }
    }

    fn same_kind(&self, other: &OverlayMode) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GpioCondition {
    /// Bank handle returned by [`Gpio::resolve_bank`]; `None` until a
    /// `bank` entry resolved successfully.
    pub bank: Option<String>,
    pub pin: i32,
    pub value: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CmdlineCondition {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// A fully read overlay section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayConfig {
    /// Full section name, e.g. `overlay-panel-rev2`.
    pub name: String,
    /// Overlay file, relative to the configured dtb folder.
    pub file_path: Option<String>,
    /// When non-empty, only these devices may apply the overlay. Listing a
    /// device here also selects the overlay for it, as if the device named
    /// the overlay in its own `overlays` key.
    pub device_codenames: Vec<String>,
    pub mode: OverlayMode,
}

impl OverlayConfig {
    /// Whether the device restriction admits `codename`.
    pub fn allows_device(&self, codename: &str) -> bool {
        self.device_codenames.is_empty() || self.device_codenames.iter().any(|d| d == codename)
    }
}

/// Reasons an overlay entry is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverlayKeyError {
    #[error("unknown overlay option {0}")]
    UnknownKey(String),
    #[error("{0} given before mode")]
    ModeNotSet(String),
    #[error("mode {0} conflicts with options already set")]
    ModeConflict(String),
    #[error("invalid gpio bank: {0}")]
    BadBank(String),
    #[error("{key} is not a number: {value}")]
    BadNumber { key: String, value: String },
}

/// Overlay under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayDraft {
    name: String,
    file_path: Option<String>,
    device_codenames: Vec<String>,
    mode: Option<OverlayMode>,
    mode_keys: usize,
}

impl OverlayDraft {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            file_path: None,
            device_codenames: Vec::new(),
            mode: None,
            mode_keys: 0,
        }
    }

    /// Apply one `key=value` entry of this overlay's section.
    pub fn apply(
        &mut self,
        key: &str,
        value: &str,
        gpio: &dyn Gpio,
        strict_numbers: bool,
    ) -> Result<(), OverlayKeyError> {
        match key {
            "path" => self.file_path = Some(value.to_string()),
            "devices" => self.device_codenames = super::split_list(value),
            "mode" => self.set_mode(value)?,
            _ => {
                self.apply_mode_key(key, value, gpio, strict_numbers)?;
                self.mode_keys += 1;
            }
        }
        Ok(())
    }

    fn set_mode(&mut self, value: &str) -> Result<(), OverlayKeyError> {
        let mode = OverlayMode::parse(value);
        if let OverlayMode::Invalid { raw } = &mode {
            error!("[{}] invalid overlay mode {raw:?}", self.name);
        }
        match &self.mode {
            Some(current) if current.same_kind(&mode) => Ok(()),
            Some(_) if self.mode_keys > 0 => Err(OverlayKeyError::ModeConflict(value.to_string())),
            _ => {
                self.mode = Some(mode);
                Ok(())
            }
        }
    }

    fn apply_mode_key(
        &mut self,
        key: &str,
        value: &str,
        gpio: &dyn Gpio,
        strict_numbers: bool,
    ) -> Result<(), OverlayKeyError> {
        match &mut self.mode {
            None => Err(OverlayKeyError::ModeNotSet(key.to_string())),
            Some(OverlayMode::Gpio(cond)) => match key {
                "bank" => match gpio.resolve_bank(value) {
                    Ok(handle) => {
                        cond.bank = Some(handle);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("[{}] gpio bank {value:?}: {e}", self.name);
                        Err(OverlayKeyError::BadBank(value.to_string()))
                    }
                },
                "pin" => {
                    cond.pin = parse_number(key, value, strict_numbers)?;
                    Ok(())
                }
                "value" => {
                    cond.value = parse_number(key, value, strict_numbers)?;
                    Ok(())
                }
                _ => Err(OverlayKeyError::UnknownKey(key.to_string())),
            },
            Some(OverlayMode::Cmdline(cond)) => match key {
                "key" => {
                    cond.key = Some(value.to_string());
                    Ok(())
                }
                "value" => {
                    cond.value = Some(value.to_string());
                    Ok(())
                }
                _ => Err(OverlayKeyError::UnknownKey(key.to_string())),
            },
            Some(OverlayMode::Fixed) | Some(OverlayMode::Invalid { .. }) => {
                Err(OverlayKeyError::UnknownKey(key.to_string()))
            }
        }
    }

    /// Freeze the draft. An overlay that never saw `mode` is fixed.
    pub fn finish(self) -> OverlayConfig {
        OverlayConfig {
            name: self.name,
            file_path: self.file_path,
            device_codenames: self.device_codenames,
            mode: self.mode.unwrap_or(OverlayMode::Fixed),
        }
    }
}

/// Lenient numbers take the leading integer prefix and fall back to 0.
fn parse_number(key: &str, value: &str, strict: bool) -> Result<i32, OverlayKeyError> {
    let value = value.trim();
    if strict {
        return value.parse().map_err(|_| OverlayKeyError::BadNumber {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    let (sign, digits) = match value.as_bytes().first() {
        Some(b'-') => (-1i64, &value[1..]),
        Some(b'+') => (1, &value[1..]),
        _ => (1, value),
    };
    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        n = (n * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    Ok((sign * n).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Name-keyed overlay drafts in declaration order.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    drafts: Vec<OverlayDraft>,
    index: HashMap<String, usize>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the draft called `name`, creating an empty one on first use.
    pub fn find_or_create(&mut self, name: &str) -> &mut OverlayDraft {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.drafts.push(OverlayDraft::new(name));
                let idx = self.drafts.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.drafts[idx]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Freeze every draft, keeping declaration order.
    pub fn finish(self) -> Vec<OverlayConfig> {
        self.drafts.into_iter().map(OverlayDraft::finish).collect()
    }
}
