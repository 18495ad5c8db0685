//! Shared configuration for the boba exporter
//!
//! This crate provides the single source of truth for export options,
//! used by the pipeline crates and by the command line front end.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Current binary protocol version written into the scene header
pub const BOBA_PROTOCOL_VERSION: u32 = 4;

/// First protocol version that stores transforms as pos/rot/quat/scale
/// instead of raw 3x4 matrices
pub const TRANSFORM_RECORD_VERSION: u32 = 4;

/// Default SDF grid resolution per axis
pub const DEFAULT_GRID_SIZE: u32 = 32;

/// Largest accepted grid resolution per axis
pub const MAX_GRID_SIZE: u32 = 1024;

/// Default exact band (in cells) for the fast-sweep voxelizer
pub const DEFAULT_EXACT_BAND: u32 = 1;

/// Default log verbosity (0 = errors only, 4 = trace)
pub const DEFAULT_LOG_LEVEL: u8 = 1;

/// Errors raised while loading or validating options
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid size must be between 2 and {max}, got {0}", max = MAX_GRID_SIZE)]
    InvalidGridSize(u32),

    #[error("Exact band must be at least 1 cell")]
    InvalidExactBand,

    #[error("Failed to read options file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Which signed distance algorithm the voxelizer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SdfMethod {
    /// Brute-force closest point, sign from the closest feature's normal
    #[default]
    FeatureNormal,
    /// Exact band plus fast sweeping, sign from ray intersection parity
    FastSweep,
}

/// Which artifacts an export produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pointer-free `.boba` blob only
    Binary,
    /// `.json` description plus `.dat` buffer only
    Json,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn writes_binary(self) -> bool {
        matches!(self, Self::Binary | Self::Both)
    }

    pub fn writes_sidecar(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

/// Options controlling a single export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// SDF grid resolution, applied uniformly to all three axes
    pub grid_size: u32,
    /// Generate a signed distance field for the whole scene
    pub sdf: bool,
    pub sdf_method: SdfMethod,
    /// Exact band radius in cells (fast-sweep only)
    pub exact_band: u32,
    /// Octahedral normals and snorm16 uvs
    pub compress_vertices: bool,
    /// Bit-packed delta index streams
    pub compress_indices: bool,
    pub output_format: OutputFormat,
    /// Directory for outputs; defaults to the input's directory
    pub output_directory: Option<PathBuf>,
    /// Re-export even when outputs are newer than the input
    pub force: bool,
    pub log_level: u8,
    /// Fail the save when a fixup was created but never inserted
    pub strict_fixups: bool,
    pub protocol_version: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            sdf: false,
            sdf_method: SdfMethod::default(),
            exact_band: DEFAULT_EXACT_BAND,
            compress_vertices: false,
            compress_indices: false,
            output_format: OutputFormat::default(),
            output_directory: None,
            force: false,
            log_level: DEFAULT_LOG_LEVEL,
            strict_fixups: true,
            protocol_version: BOBA_PROTOCOL_VERSION,
        }
    }
}

impl ExportOptions {
    /// Parse options from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file on disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check invariants the voxelizer relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(ConfigError::InvalidGridSize(self.grid_size));
        }
        if self.exact_band == 0 {
            return Err(ConfigError::InvalidExactBand);
        }
        Ok(())
    }

    /// Whether transforms are written with the quaternion record layout
    pub fn uses_transform_records(&self) -> bool {
        self.protocol_version >= TRANSFORM_RECORD_VERSION
    }

    /// Resolve the output prefix (path without extension) for an input file
    pub fn output_prefix(&self, input: &Path) -> PathBuf {
        let stem = input.file_stem().unwrap_or(input.as_os_str());
        match &self.output_directory {
            Some(dir) => dir.join(stem),
            None => input.with_file_name(stem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExportOptions::default();
        assert_eq!(options.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(options.sdf_method, SdfMethod::FeatureNormal);
        assert_eq!(options.protocol_version, BOBA_PROTOCOL_VERSION);
        assert!(options.strict_fixups);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options =
            ExportOptions::from_json_str(r#"{ "grid_size": 64, "sdf_method": "fast-sweep" }"#)
                .unwrap();
        assert_eq!(options.grid_size, 64);
        assert_eq!(options.sdf_method, SdfMethod::FastSweep);
        assert_eq!(options.output_format, OutputFormat::Both);
        assert!(!options.compress_indices);
    }

    #[test]
    fn test_rejects_tiny_grid() {
        let err = ExportOptions::from_json_str(r#"{ "grid_size": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidGridSize(1)));
    }

    #[test]
    fn test_rejects_huge_grid() {
        let options = ExportOptions {
            grid_size: 3_000_000,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidGridSize(3_000_000))
        ));
        let options = ExportOptions {
            grid_size: MAX_GRID_SIZE,
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_transform_record_gate() {
        let mut options = ExportOptions::default();
        assert!(options.uses_transform_records());
        options.protocol_version = 3;
        assert!(!options.uses_transform_records());
    }

    #[test]
    fn test_output_prefix() {
        let mut options = ExportOptions::default();
        let input = Path::new("scenes/intro.json");
        assert_eq!(options.output_prefix(input), PathBuf::from("scenes/intro"));

        options.output_directory = Some(PathBuf::from("out"));
        assert_eq!(options.output_prefix(input), PathBuf::from("out/intro"));
    }

    #[test]
    fn test_output_format_flags() {
        assert!(OutputFormat::Both.writes_binary());
        assert!(OutputFormat::Both.writes_sidecar());
        assert!(!OutputFormat::Binary.writes_sidecar());
        assert!(!OutputFormat::Json.writes_binary());
    }
}
