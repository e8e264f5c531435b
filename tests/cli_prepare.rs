// CLASSIFICATION: COMMUNITY
// Filename: cli_prepare.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use devboot::cli::args::build_cli;
use devboot::cli::run_with;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn setup(root: &Path) {
    let boot = root.join("boot");
    fs::create_dir_all(boot.join("dtbs")).unwrap();
    fs::write(boot.join("zImage"), b"kernel").unwrap();
    fs::write(boot.join("initramfs"), b"ramdisk").unwrap();
    fs::write(boot.join("dtbs/hh.dtb"), b"dtb").unwrap();
    fs::write(boot.join("dtbs/panel.dtbo"), b"panel").unwrap();
    fs::write(
        root.join("devboot.ini"),
        format!(
            "[global]\ndevices=hammerhead\nrootdir={}\nzImage=zImage\ninitramfs=initramfs\ndtbs=dtbs\n\
             cmdline=console=ttyMSM0\ncmdline_keep=androidboot.serialno\n\
             [hammerhead]\nname=Nexus 5\nmodel=HHZ11k\ndtbs=hh.dtb\noverlays=overlay-panel\n\
             [overlay-panel]\nmode=fixed\npath=panel.dtbo\n",
            boot.display()
        ),
    )
    .unwrap();
    let proc_root = root.join("proc");
    fs::create_dir_all(&proc_root).unwrap();
    fs::write(
        proc_root.join("cmdline"),
        "androidboot.bootloader=HHZ11k androidboot.serialno=04a1b2 quiet\n",
    )
    .unwrap();
    fs::write(
        proc_root.join("iomem"),
        "00000000-0fffffff : reserved\n10000000-3fffffff : System RAM\n",
    )
    .unwrap();
}

fn run(root: &Path, args: &[&str]) -> anyhow::Result<String> {
    let config = root.join("devboot.ini");
    let proc_root = root.join("proc");
    let mut argv = vec![
        "devboot".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--proc".to_string(),
        proc_root.display().to_string(),
        "--gpio-sysfs".to_string(),
        root.join("gpio").display().to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    let matches = build_cli().try_get_matches_from(argv)?;
    let mut out = Vec::new();
    run_with(&matches, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn dump_lists_devices_and_overlays() {
    let dir = tempdir().unwrap();
    setup(dir.path());
    let out = run(dir.path(), &["dump"]).unwrap();
    assert_eq!(out, "hammerhead (Nexus 5)\n\toverlay-panel, mode=fixed\n");

    let json: Value = serde_json::from_str(&run(dir.path(), &["dump", "--json"]).unwrap()).unwrap();
    assert_eq!(json["devices"][0]["codename"], "hammerhead");
    assert_eq!(json["overlays"][0]["mode"]["kind"], "fixed");
}

#[test]
fn resolve_uses_running_bootloader() {
    let dir = tempdir().unwrap();
    setup(dir.path());
    let out = run(dir.path(), &["resolve"]).unwrap();
    assert!(out.starts_with("device: hammerhead\n"));
    assert!(out.contains("overlay: overlay-panel"));
    assert!(run(dir.path(), &["resolve", "--model", "nope"]).is_err());
}

#[test]
fn cmdline_carries_kept_keys() {
    let dir = tempdir().unwrap();
    setup(dir.path());
    let out = run(dir.path(), &["cmdline", "--root", "/dev/mmcblk0p25"]).unwrap();
    assert_eq!(out, "root=/dev/mmcblk0p25 console=ttyMSM0 androidboot.serialno=04a1b2\n");
}

#[test]
fn prepare_stages_files_and_manifest() {
    let dir = tempdir().unwrap();
    setup(dir.path());
    let staged = dir.path().join("staged");
    let staged_arg = staged.display().to_string();
    run(dir.path(), &["prepare", "--root", "/dev/sda1", "--out", &staged_arg]).unwrap();

    assert_eq!(fs::read(staged.join("kernel")).unwrap(), b"kernel");
    assert_eq!(fs::read(staged.join("ramdisk")).unwrap(), b"ramdisk");
    assert_eq!(fs::read(staged.join("dtb")).unwrap(), b"dtb");
    assert_eq!(fs::read(staged.join("overlays/overlay-panel.dtbo")).unwrap(), b"panel");

    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(staged.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["device"], "hammerhead");
    assert_eq!(manifest["kernel_base"], "0x10008000");
    assert_eq!(manifest["overlays"][0]["file"], "overlays/overlay-panel.dtbo");
    assert_eq!(
        manifest["cmdline"],
        "root=/dev/sda1 console=ttyMSM0 androidboot.serialno=04a1b2"
    );
}

#[test]
fn broken_config_reports_failure() {
    let dir = tempdir().unwrap();
    setup(dir.path());
    fs::write(dir.path().join("devboot.ini"), "[hammerhead]\nname=x\n").unwrap();
    let err = run(dir.path(), &["dump"]).unwrap_err();
    assert!(format!("{err:#}").contains("before the global section"));
}
