// CLASSIFICATION: COMMUNITY
// Filename: settings.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use std::path::PathBuf;

pub const CONFIG_ENV: &str = "DEVBOOT_CONFIG";
pub const PROC_ENV: &str = "DEVBOOT_PROC";
pub const GPIO_SYSFS_ENV: &str = "DEVBOOT_GPIO_SYSFS";

/// Runtime paths, overridable through the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_path: PathBuf,
    pub proc_root: PathBuf,
    pub gpio_sysfs: PathBuf,
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: env_path(CONFIG_ENV, "/etc/devboot.ini"),
            proc_root: env_path(PROC_ENV, "/proc"),
            gpio_sysfs: env_path(GPIO_SYSFS_ENV, "/sys/class/gpio"),
        }
    }
}
