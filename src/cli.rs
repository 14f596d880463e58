use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{parse_tag, AdvConfig};
use crate::device::{inspect, load_from_device_with_config, persist_with_config};

#[derive(Parser, Debug)]
#[command(
    name = "advtool",
    version,
    about = "Read and write the ADV metadata record on a META device",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Store a configuration file in the ADV (both copies are rewritten)
    ///
    /// Пример:
    ///   advtool write --device /dev/sda4 --config config.yaml
    Write {
        /// Path to the META device (e.g. /dev/sda4) or an image file
        #[arg(long)]
        device: PathBuf,
        /// Configuration file; stored verbatim unless --json is set
        #[arg(long)]
        config: PathBuf,
        /// Tag id (default: ADV_CONFIG_TAG or 0x0A)
        #[arg(long, value_parser = parse_tag)]
        tag: Option<u8>,
        /// Validate the file as JSON and store its normalized form
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List tags stored in the ADV
    Show {
        #[arg(long)]
        device: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Dump one tag value (raw bytes to stdout or --out)
    Get {
        #[arg(long)]
        device: PathBuf,
        #[arg(long, value_parser = parse_tag)]
        tag: u8,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check both ADV copies (primary at 0, mirror at 256 KiB)
    Verify {
        #[arg(long)]
        device: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = AdvConfig::from_env();
    info!("{}", cfg);

    match cli.cmd {
        Cmd::Write {
            device,
            config,
            tag,
            json,
        } => cmd_write(&device, &config, tag.unwrap_or(cfg.config_tag), json, &cfg),
        Cmd::Show { device, json } => cmd_show(&device, json, &cfg),
        Cmd::Get { device, tag, out } => cmd_get(&device, tag, out.as_deref(), &cfg),
        Cmd::Verify { device, json } => cmd_verify(&device, json),
    }
}

/// Проверить JSON и вернуть нормализованную форму.
pub fn normalize_json(raw: &[u8]) -> Result<Vec<u8>> {
    let v: serde_json::Value = serde_json::from_slice(raw)?;
    Ok(serde_json::to_vec(&v)?)
}

pub fn display_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => format!("(binary {} B)", bytes.len()),
    }
}

fn preview(bytes: &[u8], max: usize) -> String {
    // плейсхолдер для бинарных значений не режем
    let s = match std::str::from_utf8(bytes) {
        Ok(s) => s.replace('\n', "\\n"),
        Err(_) => return display_text(bytes),
    };
    if s.chars().count() > max {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        s
    }
}

pub fn cmd_write(
    device: &Path,
    config: &Path,
    tag: u8,
    json: bool,
    cfg: &AdvConfig,
) -> Result<()> {
    let raw = std::fs::read(config)
        .with_context(|| format!("error reading configuration file {}", config.display()))?;
    let payload = if json {
        normalize_json(&raw).context("invalid JSON configuration")?
    } else {
        raw
    };

    let (adv, status) =
        load_from_device_with_config(device, cfg).context("error loading ADV")?;
    info!("existing ADV on {}: {:?}", device.display(), status);

    adv.try_set_tag(tag, payload)
        .map_err(|e| anyhow!("cannot store configuration in tag {:#04x}: {}", tag, e))?;

    persist_with_config(&adv, device, cfg).context("error writing data to disk")?;

    println!(
        "Configuration successfully written to ADV tag {:#04x} on {}",
        tag,
        device.display()
    );
    Ok(())
}

#[derive(Serialize)]
struct TagRow {
    tag: u8,
    len: usize,
    text: String,
}

pub fn cmd_show(device: &Path, json: bool, cfg: &AdvConfig) -> Result<()> {
    let (adv, status) = load_from_device_with_config(device, cfg).context("error loading ADV")?;
    let tags = adv.tags();

    if json {
        let rows: Vec<TagRow> = tags
            .iter()
            .map(|(&tag, v)| TagRow {
                tag,
                len: v.len(),
                text: display_text(v),
            })
            .collect();
        let out = serde_json::json!({
            "device": device.display().to_string(),
            "status": status,
            "usage": adv.usage(),
            "tags": rows,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("ADV on {}: {:?}, {} tag(s), usage {} B", device.display(), status, tags.len(), adv.usage());
    for (tag, v) in &tags {
        println!("  tag {:#04x}  len {:>7}  {}", tag, v.len(), preview(v, 60));
    }
    Ok(())
}

pub fn cmd_get(device: &Path, tag: u8, out: Option<&Path>, cfg: &AdvConfig) -> Result<()> {
    let (adv, _) = load_from_device_with_config(device, cfg).context("error loading ADV")?;
    let v = adv
        .get_tag(tag)
        .ok_or_else(|| anyhow!("tag {:#04x} not found on {}", tag, device.display()))?;

    match out {
        Some(p) => {
            std::fs::write(p, &v).with_context(|| format!("write {}", p.display()))?;
            println!("{} bytes written to {}", v.len(), p.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(&v)?;
            lock.flush()?;
        }
    }
    Ok(())
}

pub fn cmd_verify(device: &Path, json: bool) -> Result<()> {
    let report = inspect(device)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for c in [&report.primary, &report.mirror] {
            match &c.error {
                None => println!("copy @{:>7}: {:?}, {} tag(s)", c.offset, c.status, c.tags),
                Some(e) => println!("copy @{:>7}: {:?} ({})", c.offset, c.status, e),
            }
        }
        println!("in sync: {}", report.in_sync);
    }

    if !report.any_valid() {
        return Err(anyhow!("no valid ADV copy on {}", device.display()));
    }
    Ok(())
}
