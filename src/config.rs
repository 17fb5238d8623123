//! Tunables for active-section detection and panel auto-scroll.

use std::time::Duration;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::detector::Strategy;
use crate::error::{Result, SyncError};
use crate::panel::PanelPolicy;
use crate::visibility::FocalRegion;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Headings inside a band at the top of the viewport
    #[default]
    FocalStrip,
    /// Last heading scrolled past the fixed header
    Threshold,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub detection: DetectionMode,
    pub focal_region: FocalRegion,
    /// Height of fixed chrome above the document, in points
    pub header_offset: f32,
    pub panel_policy: PanelPolicy,
    pub debounce_ms: u64,
    pub panel_padding: f32,
    pub number_sections: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            detection: DetectionMode::default(),
            focal_region: FocalRegion::default(),
            header_offset: 48.0,
            panel_policy: PanelPolicy::default(),
            debounce_ms: 100,
            panel_padding: 0.0,
            number_sections: false,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<()> {
        if self.detection == DetectionMode::FocalStrip {
            self.focal_region.validate()?;
        }
        if !self.header_offset.is_finite() || self.header_offset < 0.0 {
            return Err(SyncError::InvalidConfig(format!(
                "header offset must be a non-negative number, got {}",
                self.header_offset
            )));
        }
        if !self.panel_padding.is_finite() || self.panel_padding < 0.0 {
            return Err(SyncError::InvalidConfig(format!(
                "panel padding must be a non-negative number, got {}",
                self.panel_padding
            )));
        }
        Ok(())
    }

    pub fn strategy(&self) -> Strategy {
        match self.detection {
            DetectionMode::FocalStrip => Strategy::FocalStrip(self.focal_region),
            DetectionMode::Threshold => Strategy::Threshold {
                header_offset: self.header_offset,
            },
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Command-line flags that map onto [`SyncConfig`].
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// How the current section is detected
    #[arg(long, value_enum, default_value_t = DetectionMode::FocalStrip)]
    pub detection: DetectionMode,

    /// Top of the focal strip as a fraction of the viewport height
    #[arg(long, default_value_t = 0.0)]
    pub focal_top: f32,

    /// Bottom of the focal strip as a fraction of the viewport height
    #[arg(long, default_value_t = 0.2)]
    pub focal_bottom: f32,

    /// Fixed header height used by threshold detection
    #[arg(long, default_value_t = 48.0)]
    pub header_offset: f32,

    /// How the outline follows the current section
    #[arg(long, value_enum, default_value_t = PanelPolicy::Center)]
    pub panel_policy: PanelPolicy,

    /// Delay before the outline scrolls to a new section
    #[arg(long, default_value_t = 100)]
    pub debounce_ms: u64,

    /// Number sections in the outline (1, 1.1, ...)
    #[arg(long)]
    pub number_sections: bool,
}

impl SyncArgs {
    pub fn to_config(&self) -> Result<SyncConfig> {
        let config = SyncConfig {
            detection: self.detection,
            focal_region: FocalRegion {
                top: self.focal_top,
                bottom: self.focal_bottom,
            },
            header_offset: self.header_offset,
            panel_policy: self.panel_policy,
            debounce_ms: self.debounce_ms,
            number_sections: self.number_sections,
            ..SyncConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
