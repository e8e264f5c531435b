// CLASSIFICATION: COMMUNITY
// Filename: gpio.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! GPIO access through the sysfs class interface.
//!
//! Banks are `gpiochipN` directories carrying `label`, `base` and `ngpio`
//! files. A pin is read from `gpio<base+pin>/value`, exporting the line
//! first when it is not yet visible.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use super::Gpio;

#[derive(Debug, Error)]
pub enum GpioError {
    #[error("unknown gpio bank {0}")]
    UnknownBank(String),
    #[error("pin {pin} is outside bank {bank}")]
    PinOutOfRange { bank: String, pin: i32 },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected contents in {}", .path.display())]
    BadValue { path: PathBuf },
}

/// GPIO banks under a sysfs class root such as `/sys/class/gpio`.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_trimmed(path: &Path) -> Result<String, GpioError> {
        fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .map_err(|source| GpioError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    fn read_int(path: &Path) -> Result<i32, GpioError> {
        Self::read_trimmed(path)?
            .parse()
            .map_err(|_| GpioError::BadValue {
                path: path.to_path_buf(),
            })
    }
}

impl Gpio for SysfsGpio {
    /// Accepts a chip label (`msm_gpio`) or a chip directory name (`gpiochip0`).
    fn resolve_bank(&self, name: &str) -> Result<String, GpioError> {
        if name.starts_with("gpiochip") && self.root.join(name).join("base").is_file() {
            return Ok(name.to_string());
        }
        let entries = fs::read_dir(&self.root).map_err(|source| GpioError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut chips: Vec<_> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("gpiochip"))
            .collect();
        chips.sort();
        for chip in chips {
            let label = self.root.join(&chip).join("label");
            if let Ok(found) = Self::read_trimmed(&label) {
                if found == name {
                    debug!("gpio bank {name} is {chip}");
                    return Ok(chip);
                }
            }
        }
        Err(GpioError::UnknownBank(name.to_string()))
    }

    fn read_pin(&self, bank: &str, pin: i32) -> Result<i32, GpioError> {
        let chip = self.root.join(bank);
        let base = Self::read_int(&chip.join("base"))?;
        let ngpio = Self::read_int(&chip.join("ngpio"))?;
        if pin < 0 || pin >= ngpio {
            return Err(GpioError::PinOutOfRange {
                bank: bank.to_string(),
                pin,
            });
        }
        let line = base + pin;
        let value = self.root.join(format!("gpio{line}")).join("value");
        if !value.exists() {
            let export = self.root.join("export");
            debug!("exporting gpio {line}");
            fs::write(&export, line.to_string()).map_err(|source| GpioError::Io {
                path: export.clone(),
                source,
            })?;
        }
        Self::read_int(&value)
    }
}
