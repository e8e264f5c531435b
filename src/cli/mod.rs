// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Inspection CLI for `devboot`. Exports argument parser and main entry.

pub mod args;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context as _};
use clap::ArgMatches;
use log::warn;
use serde::Serialize;

use crate::cli::args::build_cli;
use crate::cmdline::{build_cmdline, KernelCmdline};
use crate::config::{load_config, BootTarget, DeviceConfig, GlobalConfig, OverlayMode};
use crate::loader::{applicable_overlays, load_dtb, Blob, BlobSource, BootResources};
use crate::platform::iomem::read_kernel_base;
use crate::platform::{AndroidBootImage, BootContainer, CmdlineBootloader, FixedIdentity, NoContainer, SysfsGpio};
use crate::resolver::resolve;
use crate::settings::Settings;

/// Entry point for the CLI. Parses arguments and runs the subcommand.
pub fn run() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    let stdout = std::io::stdout();
    run_with(&matches, &mut stdout.lock())
}

/// Run already parsed arguments, writing results to `out`.
pub fn run_with(matches: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no subcommand given"))?;
    let ctx = Context::load(sub)?;
    match name {
        "dump" => dump(&ctx, sub.get_flag("json"), out),
        "resolve" => show_resolved(&ctx, sub, out),
        "cmdline" => print_cmdline(&ctx, sub, out),
        "prepare" => prepare(&ctx, sub, out),
        other => Err(anyhow!("unknown subcommand {other}")),
    }
}

struct Context {
    settings: Settings,
    config: GlobalConfig,
    gpio: SysfsGpio,
    current: Option<KernelCmdline>,
}

impl Context {
    fn load(sub: &ArgMatches) -> anyhow::Result<Self> {
        let mut settings = Settings::default();
        if let Some(p) = sub.get_one::<PathBuf>("config") {
            settings.config_path = p.clone();
        }
        if let Some(p) = sub.get_one::<PathBuf>("proc") {
            settings.proc_root = p.clone();
        }
        if let Some(p) = sub.get_one::<PathBuf>("gpio-sysfs") {
            settings.gpio_sysfs = p.clone();
        }

        let gpio = SysfsGpio::new(&settings.gpio_sysfs);
        let config = load_config(&settings.config_path, &gpio, sub.get_flag("strict"))
            .with_context(|| format!("loading {}", settings.config_path.display()))?;
        let current = match KernelCmdline::from_proc(&settings.proc_root) {
            Ok(cl) => Some(cl),
            Err(e) => {
                warn!("current command line unavailable: {e}");
                None
            }
        };
        Ok(Self {
            settings,
            config,
            gpio,
            current,
        })
    }

    fn device(&self, sub: &ArgMatches) -> anyhow::Result<&DeviceConfig> {
        let found = match sub.get_one::<String>("model") {
            Some(model) => resolve(&self.config, &FixedIdentity(model.clone())),
            None => resolve(&self.config, &CmdlineBootloader::new(self.current.clone())),
        };
        found.ok_or_else(|| anyhow!("no configured device matches this hardware"))
    }
}

fn target(sub: &ArgMatches) -> BootTarget {
    if sub.get_flag("recovery") {
        BootTarget::Recovery
    } else {
        BootTarget::Normal
    }
}

fn mode_name(mode: &OverlayMode) -> &'static str {
    match mode {
        OverlayMode::Fixed => "fixed",
        OverlayMode::Gpio(_) => "gpio",
        OverlayMode::Cmdline(_) => "cmdline",
        OverlayMode::Invalid { .. } => "invalid",
    }
}

fn dump(ctx: &Context, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&ctx.config)?)?;
        return Ok(());
    }
    for dev in ctx.config.devices() {
        match &dev.display_name {
            Some(name) => writeln!(out, "{} ({name})", dev.codename)?,
            None => writeln!(out, "{}", dev.codename)?,
        }
        for ov in crate::loader::overlays_for(&ctx.config, dev) {
            writeln!(out, "\t{}, mode={}", ov.name, mode_name(&ov.mode))?;
        }
    }
    Ok(())
}

fn show_resolved(ctx: &Context, sub: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    let dev = ctx.device(sub)?;
    writeln!(out, "device: {}", dev.codename)?;
    let dtb = load_dtb(&ctx.config, dev)?;
    writeln!(out, "dtb: {}", describe(&dtb))?;
    for (ov, blob) in applicable_overlays(&ctx.config, dev, ctx.current.as_ref(), &ctx.gpio)? {
        writeln!(out, "overlay: {} ({})", ov.name, describe(&blob))?;
    }
    Ok(())
}

fn print_cmdline(ctx: &Context, sub: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    let root = required(sub, "root")?;
    let image = AndroidBootImage::open_configured(&ctx.config, target(sub));
    let tail = image.as_ref().and_then(|i| i.cmdline());
    let line = build_cmdline(&ctx.config, root, tail.as_deref(), ctx.current.as_ref());
    writeln!(out, "{line}")?;
    Ok(())
}

fn required<'a>(sub: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    sub.get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("--{id} is required"))
}

fn describe(blob: &Blob) -> String {
    match &blob.source {
        BlobSource::File(p) => format!("{}, {} bytes", p.display(), blob.len()),
        BlobSource::Container => format!("boot image, {} bytes", blob.len()),
    }
}

#[derive(Debug, Serialize)]
struct StagedFile {
    file: String,
    size: usize,
    source: String,
}

#[derive(Debug, Serialize)]
struct Manifest {
    device: String,
    kernel: StagedFile,
    ramdisk: StagedFile,
    dtb: StagedFile,
    overlays: Vec<StagedFile>,
    cmdline: String,
    kernel_base: Option<String>,
}

fn stage(dir: &Path, name: &str, blob: &Blob) -> anyhow::Result<StagedFile> {
    let path = dir.join(name);
    fs::write(&path, &blob.data).with_context(|| format!("writing {}", path.display()))?;
    Ok(StagedFile {
        file: name.to_string(),
        size: blob.len(),
        source: match &blob.source {
            BlobSource::File(p) => p.display().to_string(),
            BlobSource::Container => "bootimage".to_string(),
        },
    })
}

fn prepare(ctx: &Context, sub: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    let dev = ctx.device(sub)?;
    let root = required(sub, "root")?;
    let dir = sub
        .get_one::<PathBuf>("out")
        .ok_or_else(|| anyhow!("--out is required"))?;
    let page_size = sub.get_one::<u64>("page-size").copied().unwrap_or(4096);

    let image = AndroidBootImage::open_configured(&ctx.config, target(sub));
    let container: &dyn BootContainer = match &image {
        Some(img) => img,
        None => &NoContainer,
    };
    let res = BootResources::gather(&ctx.config, dev, container, &ctx.gpio, ctx.current.as_ref(), root)?;

    fs::create_dir_all(dir.join("overlays")).with_context(|| format!("creating {}", dir.display()))?;
    let mut overlays = Vec::new();
    for (name, blob) in &res.overlays {
        overlays.push(stage(dir, &format!("overlays/{name}.dtbo"), blob)?);
    }
    fs::write(dir.join("cmdline"), &res.cmdline)?;

    let kernel_base = match read_kernel_base(&ctx.settings.proc_root, page_size) {
        Ok(base) => base.map(|b| format!("{b:#x}")),
        Err(_) => None,
    };
    let manifest = Manifest {
        device: res.device.clone(),
        kernel: stage(dir, "kernel", &res.kernel)?,
        ramdisk: stage(dir, "ramdisk", &res.ramdisk)?,
        dtb: stage(dir, "dtb", &res.dtb)?,
        overlays,
        cmdline: res.cmdline.clone(),
        kernel_base,
    };
    fs::write(dir.join("manifest.json"), serde_json::to_string_pretty(&manifest)?)?;
    writeln!(out, "staged {} in {}", res.device, dir.display())?;
    Ok(())
}
