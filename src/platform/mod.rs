// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower
//
// ─────────────────────────────────────────────────────────────
// devboot · Platform Collaborators
//
// The resolver and loader only see the traits below; the std
// implementations talk to procfs, sysfs and packed boot images.
//
// * `gpio`     – sysfs GPIO bank lookup and pin reads
// * `identity` – hardware identifier of the running device
// * `bootimg`  – Android boot image container
// * `iomem`    – kernel load address from /proc/iomem
// ─────────────────────────────────────────────────────────────

pub mod bootimg;
pub mod gpio;
pub mod identity;
pub mod iomem;

pub use bootimg::{AndroidBootImage, BootImageError};
pub use gpio::{GpioError, SysfsGpio};
pub use identity::{CmdlineBootloader, FixedIdentity};

/// Source of the identifier naming the running hardware.
pub trait HardwareIdentity {
    /// `None` when the identifier cannot be obtained.
    fn identifier(&self) -> Option<String>;
}

/// GPIO access needed by conditional overlays.
pub trait Gpio {
    /// Map a human readable bank name to the handle used by [`Gpio::read_pin`].
    fn resolve_bank(&self, name: &str) -> Result<String, GpioError>;
    /// Current logic value of `pin` on `bank`.
    fn read_pin(&self, bank: &str, pin: i32) -> Result<i32, GpioError>;
}

/// GPIO backend for systems without GPIO overlays. Every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGpio;

impl Gpio for NoGpio {
    fn resolve_bank(&self, name: &str) -> Result<String, GpioError> {
        Err(GpioError::UnknownBank(name.to_string()))
    }

    fn read_pin(&self, bank: &str, _pin: i32) -> Result<i32, GpioError> {
        Err(GpioError::UnknownBank(bank.to_string()))
    }
}

/// Packed boot image that may embed a kernel and ramdisk.
pub trait BootContainer {
    fn kernel(&self) -> Option<&[u8]>;
    fn ramdisk(&self) -> Option<&[u8]>;
    /// Command line stored in the container, if any.
    fn cmdline(&self) -> Option<String>;
}

/// Used when no boot image is configured or it could not be read.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContainer;

impl BootContainer for NoContainer {
    fn kernel(&self) -> Option<&[u8]> {
        None
    }

    fn ramdisk(&self) -> Option<&[u8]> {
        None
    }

    fn cmdline(&self) -> Option<String> {
        None
    }
}
