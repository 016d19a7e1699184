use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scaler::{Geometry, SourceFormat, Tuning};

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub display: Display,
    pub tuning: TuningConfig,
}

#[derive(Serialize, Deserialize)]
pub struct Display {
    /// "auto" (largest supported panel first) or a fixed geometry:
    /// "480x272", "400x240", "320x240".
    pub geometry: String,
    /// "indexed8" or "packed16"
    pub format: String,
    pub palette: String,
    /// When false, larger panels get a centered unscaled copy.
    pub scaling: bool,
}

#[derive(Serialize, Deserialize)]
pub struct TuningConfig {
    /// Overscan lines skipped at the top of the source frame.
    pub top_skip: usize,
    /// Vertical blending starts at dest_height * num / den.
    pub blend_threshold_num: usize,
    pub blend_threshold_den: usize,
}

impl Default for Config {
    fn default() -> Self {
        let tuning = Tuning::default();
        Config {
            display: Display {
                geometry: "auto".into(),
                format: "indexed8".into(),
                palette: "Vivid".into(),
                scaling: true,
            },
            tuning: TuningConfig {
                top_skip: tuning.top_skip,
                blend_threshold_num: tuning.blend_num,
                blend_threshold_den: tuning.blend_den,
            },
        }
    }
}

impl Config {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("md_display");
        path.push("config.toml");
        path
    }

    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Error parsing {}: {}; using defaults", path.display(), e),
                },
                Err(e) => eprintln!("Error reading {}: {}; using defaults", path.display(), e),
            }
        } else {
            let config = Config::default();
            config.write_defaults();
            return config;
        }
        Config::default()
    }

    fn write_defaults(&self) {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error creating config directory: {}", e);
                return;
            }
        }
        let contents = toml::to_string_pretty(self).expect("Failed to serialize config");
        if let Err(e) = std::fs::write(&path, contents) {
            eprintln!("Error writing {}: {}", path.display(), e);
        } else {
            eprintln!("Wrote default config to {}", path.display());
        }
    }

    /// Geometry probe order for mode selection.
    pub fn geometry_preference(&self) -> Vec<Geometry> {
        match self.display.geometry.as_str() {
            "auto" => Geometry::PREFERRED.to_vec(),
            "480x272" => vec![Geometry::Tall480x272],
            "400x240" => vec![Geometry::Wide400x240],
            "320x240" => vec![Geometry::Native320x240],
            other => {
                eprintln!("Unknown geometry '{}' in config, using auto", other);
                Geometry::PREFERRED.to_vec()
            }
        }
    }

    pub fn source_format(&self) -> SourceFormat {
        match self.display.format.as_str() {
            "indexed8" => SourceFormat::Indexed8,
            "packed16" => SourceFormat::Packed16,
            other => {
                eprintln!("Unknown source format '{}' in config, using indexed8", other);
                SourceFormat::Indexed8
            }
        }
    }

    pub fn tuning(&self) -> Tuning {
        if self.tuning.blend_threshold_den == 0 {
            eprintln!("blend_threshold_den must be nonzero, using defaults");
            return Tuning::default();
        }
        Tuning {
            top_skip: self.tuning.top_skip,
            blend_num: self.tuning.blend_threshold_num,
            blend_den: self.tuning.blend_threshold_den,
        }
    }
}
