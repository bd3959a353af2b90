use clap::Parser;
use std::path::PathBuf;

/// Command line options
#[derive(Parser, Debug, Clone)]
#[command(name = "globe-labels", version, about = "Terminal globe with anchored location labels")]
pub struct Args {
    /// Location dataset (JSON array of records)
    #[arg(long, env = "GLOBE_DATA", default_value = "data/locations.json")]
    pub data: PathBuf,

    /// Coastline GeoJSON drawn on the globe surface (skipped if missing)
    #[arg(long, env = "GLOBE_COASTLINES", default_value = "data/ne_110m_coastline.json")]
    pub coastlines: PathBuf,

    /// Minimum label size; locations with area below its square are hidden
    #[arg(long, default_value_t = LabelSettings::DEFAULT_MIN_AREA)]
    pub min_area: f64,

    /// Back-face cutoff; labels whose facing dot exceeds this are hidden
    #[arg(long, default_value_t = LabelSettings::DEFAULT_MAX_VISIBLE_DOT, allow_negative_numbers = true)]
    pub max_visible_dot: f64,

    /// Write logs to this file (the terminal is owned by the UI)
    #[arg(long, env = "GLOBE_LOG")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn label_settings(&self) -> LabelSettings {
        LabelSettings {
            min_area: self.min_area,
            max_visible_dot: self.max_visible_dot,
        }
    }
}

/// Label culling thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSettings {
    /// Linear size setting. Compared squared against location area.
    pub min_area: f64,
    /// Labels are shown only while dot(normal, camera→point) <= this value.
    pub max_visible_dot: f64,
}

impl LabelSettings {
    pub const DEFAULT_MIN_AREA: f64 = 20.0;
    pub const DEFAULT_MAX_VISIBLE_DOT: f64 = -0.2;

    /// Area a location must reach to be labeled
    #[inline]
    pub fn area_threshold(&self) -> f64 {
        self.min_area * self.min_area
    }
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            min_area: Self::DEFAULT_MIN_AREA,
            max_visible_dot: Self::DEFAULT_MAX_VISIBLE_DOT,
        }
    }
}

/// Camera and orbit control constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    /// Initial distance from the globe center along +Z
    pub distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Fraction of pending rotation applied per frame
    pub damping_factor: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 60.0,
            near: 0.1,
            far: 10.0,
            distance: 2.5,
            min_distance: 1.2,
            max_distance: 4.0,
            damping_factor: 0.05,
        }
    }
}
