// CLASSIFICATION: COMMUNITY
// Filename: args.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};

fn model_arg() -> Arg {
    Arg::new("model")
        .long("model")
        .value_name("ID")
        .help("Hardware identifier to resolve instead of the running bootloader's")
}

fn root_arg() -> Arg {
    Arg::new("root")
        .long("root")
        .value_name("DEV")
        .help("Root device passed as root= to the next kernel")
        .required(true)
}

/// Builds and returns the CLI argument parser for `devboot`.
pub fn build_cli() -> Command {
    Command::new("devboot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve boot resources for multi-device boot images")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Device configuration file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("proc")
                .long("proc")
                .value_name("DIR")
                .help("procfs root used for cmdline and iomem")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("gpio-sysfs")
                .long("gpio-sysfs")
                .value_name("DIR")
                .help("sysfs GPIO class directory")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Reject non-numeric GPIO pin/value entries")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("dump")
                .about("List configured devices and overlays")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the parsed configuration as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Show the device, dtb and overlays for this hardware")
                .arg(model_arg()),
        )
        .subcommand(
            Command::new("cmdline")
                .about("Print the command line for the next kernel")
                .arg(root_arg())
                .arg(
                    Arg::new("recovery")
                        .long("recovery")
                        .help("Take the command line tail from the recovery image")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("prepare")
                .about("Load every boot resource and stage it in a directory")
                .arg(root_arg())
                .arg(model_arg())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .help("Directory receiving the staged files")
                        .value_parser(value_parser!(PathBuf))
                        .required(true),
                )
                .arg(
                    Arg::new("recovery")
                        .long("recovery")
                        .help("Use the recovery image instead of the boot image")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("page-size")
                        .long("page-size")
                        .value_name("BYTES")
                        .help("Page size used to align the kernel load address")
                        .value_parser(value_parser!(u64))
                        .default_value("4096"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn prepare_requires_root_and_out() {
        assert!(build_cli().try_get_matches_from(["devboot", "prepare", "--root", "/dev/sda1"]).is_err());
        let m = build_cli()
            .try_get_matches_from(["devboot", "-c", "x.ini", "prepare", "--root", "/dev/sda1", "--out", "o"])
            .unwrap();
        let (name, sub) = m.subcommand().unwrap();
        assert_eq!(name, "prepare");
        assert_eq!(sub.get_one::<u64>("page-size"), Some(&4096));
        assert_eq!(sub.get_one::<PathBuf>("config"), Some(&PathBuf::from("x.ini")));
    }
}
