//! View-state context owned by the engine.

use aq_common::LayerKey;
use serde::{Deserialize, Serialize};

/// How rasters are materialized for a (city, pollutant, year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterializeMode {
    /// One source/layer pair for the current month; month-only changes touch
    /// neither the network nor the surface.
    SingleMonth,
    /// All twelve month layers are added on the cold path; month-only
    /// changes flip per-layer opacity.
    PreloadYear,
}

/// The numeric domain the selection slider operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliderDomain {
    /// Month selection, 1–12.
    Months,
    /// Opacity percentage, 0–100, while opacity-control mode is active.
    Percent,
}

impl SliderDomain {
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            SliderDomain::Months => (1, 12),
            SliderDomain::Percent => (0, 100),
        }
    }
}

/// What is currently materialized on the rendering surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadedState {
    /// Nothing has been materialized yet.
    #[default]
    Idle,
    /// A "no data" selection tore the raster down.
    NoData,
    /// This key's raster layers are up.
    Key(LayerKey),
}

impl LoadedState {
    pub fn key(&self) -> Option<&LayerKey> {
        match self {
            LoadedState::Key(key) => Some(key),
            _ => None,
        }
    }
}

/// The machine's whole mutable context. One instance per engine; nothing is
/// process-global, so independent engines can coexist (and be tested)
/// freely.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub loaded: LoadedState,
    /// Shared raster opacity, applied to every (re)materialized layer.
    pub opacity: f64,
    pub slider: SliderDomain,
    pub show_all_stations: bool,
    pub mode: MaterializeMode,
}

impl ViewState {
    pub fn new(mode: MaterializeMode, opacity: f64) -> Self {
        Self {
            loaded: LoadedState::Idle,
            opacity,
            slider: SliderDomain::Months,
            show_all_stations: false,
            mode,
        }
    }

    /// The slider drives opacity instead of month selection.
    pub fn in_opacity_control(&self) -> bool {
        self.slider == SliderDomain::Percent
    }
}
