// CLASSIFICATION: COMMUNITY
// Filename: resolver.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Match the running hardware against the configured devices.

use log::{debug, info, warn};

use crate::config::{DeviceConfig, GlobalConfig};
use crate::platform::HardwareIdentity;

/// First device, in declaration order, listing `identifier`.
pub fn find_device<'c>(config: &'c GlobalConfig, identifier: &str) -> Option<&'c DeviceConfig> {
    config.devices().iter().find(|d| d.matches(identifier))
}

/// Resolve the running device. `None` if the identifier is unavailable
/// or no device lists it; the caller decides whether that is fatal.
pub fn resolve<'c>(config: &'c GlobalConfig, identity: &dyn HardwareIdentity) -> Option<&'c DeviceConfig> {
    let Some(id) = identity.identifier() else {
        warn!("hardware identifier unavailable");
        return None;
    };
    debug!("resolving device for {id}");
    match find_device(config, &id) {
        Some(dev) => {
            info!("running on {} ({id})", dev.codename);
            Some(dev)
        }
        None => {
            warn!("no device matches {id}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::platform::{FixedIdentity, NoGpio};

    struct Unavailable;

    impl HardwareIdentity for Unavailable {
        fn identifier(&self) -> Option<String> {
            None
        }
    }

    fn config() -> GlobalConfig {
        parse_config(
            "[global]\ndevices=i9300,i9305,n7100\n\
             [i9300]\nmodel=I9300XX,SHARED\n\
             [i9305]\nmodel=I9305XX,SHARED\n\
             [n7100]\nmodel=N7100XX\n",
            &NoGpio,
            false,
        )
        .unwrap()
    }

    #[test]
    fn finds_device_by_any_identifier() {
        let cfg = config();
        assert_eq!(find_device(&cfg, "N7100XX").unwrap().codename, "n7100");
        assert_eq!(find_device(&cfg, "I9305XX").unwrap().codename, "i9305");
    }

    #[test]
    fn first_declared_device_wins() {
        let cfg = config();
        assert_eq!(find_device(&cfg, "SHARED").unwrap().codename, "i9300");
    }

    #[test]
    fn unknown_identifier_is_no_device() {
        let cfg = config();
        assert!(resolve(&cfg, &FixedIdentity("OTHER".into())).is_none());
    }

    #[test]
    fn unavailable_identity_is_no_device() {
        let cfg = config();
        assert!(resolve(&cfg, &Unavailable).is_none());
    }
}
