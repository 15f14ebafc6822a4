//! `voxdae`: converts `.vxi` voxel models into COLLADA scenes.
#![forbid(unsafe_code)]

mod batch;
mod config;
mod convert;
mod error;
mod watch;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use voxdae_collada::GeometryLayout;

use crate::config::ConvertConfig;
use crate::convert::Converter;
use crate::error::ConvertError;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LayoutArg {
    Merged,
    PerMaterial,
}

impl From<LayoutArg> for GeometryLayout {
    fn from(l: LayoutArg) -> Self {
        match l {
            LayoutArg::Merged => GeometryLayout::Merged,
            LayoutArg::PerMaterial => GeometryLayout::PerMaterial,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "voxdae", version)]
#[command(about = "Convert voxel models to COLLADA scenes", long_about = None)]
struct Cli {
    /// Model file or directory of models
    input: PathBuf,
    /// Directory receiving the .dae files
    out_dir: PathBuf,
    /// Also copy each converted input here as <name>.bytes
    #[arg(long, value_name = "DIR")]
    meta: Option<PathBuf>,
    /// Convert even when the output is up to date
    #[arg(long)]
    force: bool,
    /// TOML file with converter settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
    /// Edge length of one voxel in the output
    #[arg(long)]
    scale: Option<f32>,
    /// Worker threads for directory inputs
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Keep running and reconvert inputs as they change
    #[arg(long)]
    watch: bool,
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> Result<ConvertConfig, ConvertError> {
    let mut cfg = match &cli.config {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    if let Some(layout) = cli.layout {
        cfg.layout = layout.into();
    }
    if let Some(scale) = cli.scale {
        cfg.scale = scale;
    }
    if let Some(jobs) = cli.jobs {
        cfg.jobs = jobs;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run(cli: Cli) -> Result<(), ConvertError> {
    let cfg = load_config(&cli)?;
    let inputs = batch::collect_inputs(&cli.input, &cfg.input_extension)?;
    if inputs.is_empty() {
        log::warn!(
            "no .{} files under {}",
            cfg.input_extension,
            cli.input.display()
        );
    }
    let jobs = cfg.jobs;
    let mut conv = Converter::new(cfg, &cli.out_dir);
    conv.meta_dir = cli.meta;
    conv.force = cli.force;

    batch::run_batch(&conv, &inputs, jobs)?;

    if cli.watch {
        // Changes after the initial pass go through the staleness check.
        conv.force = false;
        watch::watch(&conv, &cli.input)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            let mut source = e.source();
            while let Some(s) = source {
                log::error!("  caused by: {s}");
                source = s.source();
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "voxdae",
            "models",
            "out",
            "--layout",
            "per-material",
            "--scale",
            "0.25",
            "-j",
            "4",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let cfg = load_config(&cli).unwrap();
        assert_eq!(cfg.layout, GeometryLayout::PerMaterial);
        assert_eq!(cfg.scale, 0.25);
        assert_eq!(cfg.jobs, 4);
        assert_eq!(cfg.output_extension, "dae");
    }

    #[test]
    fn bad_scale_is_rejected() {
        for arg in ["--scale=-1", "--scale=0", "--scale=NaN"] {
            let cli = Cli::try_parse_from(["voxdae", "a.vxi", "out", arg]).unwrap();
            assert!(
                matches!(load_config(&cli), Err(ConvertError::InvalidScale(_))),
                "{arg}"
            );
        }
    }

    #[test]
    fn scale_from_config_file_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxdae.toml");
        std::fs::write(&path, "scale = -2.0\n").unwrap();
        let args: Vec<std::ffi::OsString> = vec![
            "voxdae".into(),
            "a.vxi".into(),
            "out".into(),
            "--config".into(),
            path.clone().into_os_string(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            load_config(&cli),
            Err(ConvertError::InvalidScale(s)) if s == -2.0
        ));
    }

    #[test]
    fn meta_and_force_parse() {
        let cli = Cli::try_parse_from(["voxdae", "a.vxi", "out", "--meta", "m", "--force"]).unwrap();
        assert_eq!(cli.meta, Some(PathBuf::from("m")));
        assert!(cli.force);
        assert!(!cli.watch);
    }
}
