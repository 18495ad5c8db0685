//! Command line arguments and their merge into [`ExportOptions`].

use std::path::PathBuf;

use boba_config::{ConfigError, ExportOptions, OutputFormat, SdfMethod};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SdfMethodArg {
    FeatureNormal,
    FastSweep,
}

impl From<SdfMethodArg> for SdfMethod {
    fn from(arg: SdfMethodArg) -> Self {
        match arg {
            SdfMethodArg::FeatureNormal => Self::FeatureNormal,
            SdfMethodArg::FastSweep => Self::FastSweep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Binary,
    Json,
    Both,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Binary => Self::Binary,
            FormatArg::Json => Self::Json,
            FormatArg::Both => Self::Both,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "boba",
    version,
    about = "Export scenes to boba binary blobs, JSON sidecars and SDF grids"
)]
pub struct Cli {
    /// Scene files to export
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for output files (defaults to each input's directory)
    #[arg(long, short = 'o')]
    pub output_directory: Option<PathBuf>,

    /// JSON options file; flags given on the command line take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store normals octahedral-encoded and uvs as snorm16
    #[arg(long)]
    pub compress_vertices: bool,

    /// Bit-pack index streams
    #[arg(long)]
    pub compress_indices: bool,

    /// Generate a signed distance field for the scene
    #[arg(long)]
    pub sdf: bool,

    #[arg(long, value_enum)]
    pub sdf_method: Option<SdfMethodArg>,

    /// SDF resolution per axis
    #[arg(long)]
    pub grid_size: Option<u32>,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Export even when the outputs are up to date
    #[arg(long)]
    pub force: bool,

    /// 0 = errors only ... 4 = trace
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    pub loglevel: Option<u8>,
}

impl Cli {
    /// Options from `--config` (or defaults) with the flags applied on top.
    pub fn options(&self) -> Result<ExportOptions, ConfigError> {
        let mut options = match &self.config {
            Some(path) => ExportOptions::load(path)?,
            None => ExportOptions::default(),
        };

        if let Some(dir) = &self.output_directory {
            options.output_directory = Some(dir.clone());
        }
        options.compress_vertices |= self.compress_vertices;
        options.compress_indices |= self.compress_indices;
        options.sdf |= self.sdf;
        options.force |= self.force;
        if let Some(method) = self.sdf_method {
            options.sdf_method = method.into();
        }
        if let Some(grid_size) = self.grid_size {
            options.grid_size = grid_size;
        }
        if let Some(format) = self.format {
            options.output_format = format.into();
        }
        if let Some(level) = self.loglevel {
            options.log_level = level;
        }

        options.validate()?;
        Ok(options)
    }
}

/// Map the 0..=4 verbosity scale onto log levels.
pub fn level_filter(level: u8) -> log::LevelFilter {
    match level {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
