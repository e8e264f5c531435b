// CLASSIFICATION: COMMUNITY
// Filename: identity.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Hardware identifier sources.

use super::HardwareIdentity;
use crate::cmdline::KernelCmdline;

/// Command line key carrying the bootloader name on Android devices.
pub const BOOTLOADER_KEY: &str = "androidboot.bootloader";

/// Reads the bootloader name from the active kernel command line.
#[derive(Debug, Clone, Default)]
pub struct CmdlineBootloader {
    cmdline: Option<KernelCmdline>,
}

impl CmdlineBootloader {
    pub fn new(cmdline: Option<KernelCmdline>) -> Self {
        Self { cmdline }
    }
}

impl HardwareIdentity for CmdlineBootloader {
    fn identifier(&self) -> Option<String> {
        self.cmdline
            .as_ref()?
            .get_value(BOOTLOADER_KEY)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// A fixed identifier, e.g. supplied on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity(pub String);

impl HardwareIdentity for FixedIdentity {
    fn identifier(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
