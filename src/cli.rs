use crate::config::{load_config, save_config, ReaderConfig};
use crate::format::DataType;
use crate::patterns::{resolve, table};
use crate::processor;
use crate::segments::lit_segments;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "segmentor")]
#[command(about = "Read seven-segment displays from photographed panels")]
#[command(version)]
pub struct Cli {
    /// Log per-segment detail (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read every labelled position of a panel image.
    Read(ReadArgs),

    /// Print the symbol a segment mask resolves to.
    Decode {
        /// Mask as decimal, 0b… or 0x….
        mask: String,
    },

    /// List every recognized segment mask.
    Table,

    /// Write a config file with default values.
    InitConfig {
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Panel image.
    #[arg(long)]
    pub image: PathBuf,

    /// Label file, or the label text itself.
    #[arg(long)]
    pub labels: String,

    /// letters | numeric-1-decimal | numeric-2-decimal; anything else concatenates.
    #[arg(long, default_value = "plain")]
    pub data_type: String,

    /// JSON reader config.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where to write segment overlays (default: next to the image).
    #[arg(long)]
    pub diagnostics_dir: Option<PathBuf>,

    /// Don't write segment overlays.
    #[arg(long)]
    pub no_diagnostics: bool,

    /// Write a JSON report of every position.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write a CSV summary of every position.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Embed base64 PNG overlays in the JSON report.
    #[arg(long, requires = "report")]
    pub embed_previews: bool,
}

pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Read(args) => read(args),
        Command::Decode { mask } => {
            let mask = parse_mask(&mask)?;
            println!("{mask:3} {:07b} {:7} {}", mask, lit_segments(mask), resolve(mask));
            Ok(())
        }
        Command::Table => {
            for (mask, symbol) in table().entries() {
                println!("{mask:3} {:07b} {:7} {symbol}", mask, lit_segments(mask));
            }
            Ok(())
        }
        Command::InitConfig { path } => {
            save_config(&path, &ReaderConfig::default())?;
            info!(path = %path.display(), "default config written");
            Ok(())
        }
    }
}

fn read(args: ReadArgs) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => ReaderConfig::default(),
    };
    if let Some(dir) = args.diagnostics_dir {
        cfg.diagnostics.dir = Some(dir);
    }
    if args.no_diagnostics {
        cfg.diagnostics.enabled = false;
    }

    let data_type: DataType = args.data_type.parse()?;
    let recognition = processor::run(&args.image, &args.labels, data_type, &cfg)
        .with_context(|| format!("reading {}", args.image.display()))?;

    if let Some(path) = &args.report {
        let report = recognition.report(args.embed_previews);
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    if let Some(path) = &args.csv {
        fs::write(path, recognition.csv())
            .with_context(|| format!("cannot write {}", path.display()))?;
        info!(path = %path.display(), "csv written");
    }

    println!("{}", recognition.text);
    Ok(())
}

fn parse_mask(s: &str) -> Result<u8> {
    let s = s.trim();
    let value = if let Some(bin) = s.strip_prefix("0b") {
        u8::from_str_radix(bin, 2)
    } else if let Some(hex) = s.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else {
        s.parse::<u8>()
    }
    .with_context(|| format!("invalid mask {s:?}"))?;

    if value > 127 {
        bail!("mask {value} has more than 7 bits");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_notations() {
        assert_eq!(parse_mask("91").unwrap(), 91);
        assert_eq!(parse_mask("0b1011011").unwrap(), 91);
        assert_eq!(parse_mask("0x5b").unwrap(), 91);
        assert!(parse_mask("128").is_err());
        assert!(parse_mask("seven").is_err());
    }

    #[test]
    fn read_arguments_parse() {
        let cli = Cli::try_parse_from([
            "segmentor",
            "read",
            "--image",
            "panel.jpg",
            "--labels",
            "gauge.txt",
            "--data-type",
            "numeric-1-decimal",
            "--no-diagnostics",
        ])
        .unwrap();
        let Command::Read(args) = cli.command else {
            panic!("expected read");
        };
        assert_eq!(args.image, PathBuf::from("panel.jpg"));
        assert_eq!(args.data_type, "numeric-1-decimal");
        assert!(args.no_diagnostics);
    }

    #[test]
    fn previews_need_a_report() {
        let res = Cli::try_parse_from([
            "segmentor",
            "read",
            "--image",
            "a.png",
            "--labels",
            "x",
            "--embed-previews",
        ]);
        assert!(res.is_err());
    }
}
