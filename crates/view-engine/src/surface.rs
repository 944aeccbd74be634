//! The rendering-surface contract.
//!
//! The engine treats the map renderer as an external collaborator exposing
//! a handful of primitive operations; nothing here depends on renderer
//! internals.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use aq_common::DisplayCorners;
use geometry::FeatureCollection;
use raster::DecodedImage;

/// Fixed source/layer ids the engine materializes under.
pub mod ids {
    /// Source/layer pair for the current raster slot (single-month mode).
    pub const RASTER_SOURCE: &str = "aq-raster";
    pub const RASTER_LAYER: &str = "aq-raster-layer";

    /// Per-month pairs used by the preload strategy.
    pub fn month_source(month: u8) -> String {
        format!("aq-raster-m{:02}", month)
    }

    pub fn month_layer(month: u8) -> String {
        format!("aq-raster-m{:02}-layer", month)
    }

    pub const STATION_SOURCE: &str = "aq-stations";
    pub const STATION_LAYER: &str = "aq-stations-layer";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Raster,
    Circle,
}

/// Declarative layer description handed to the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    pub opacity: f64,
}

/// Primitive operations of the rendering surface.
///
/// Implementations are expected to tolerate redundant removals of absent
/// ids; the engine checks `has_layer`/`has_source` before mutating but the
/// contract does not require it.
pub trait MapSurface: Send + Sync {
    /// Add an image source placed at the four display corners.
    fn add_image_source(&self, id: &str, image: &DecodedImage, corners: &DisplayCorners);

    /// Add a GeoJSON source.
    fn add_vector_source(&self, id: &str, collection: &FeatureCollection);

    /// Add a layer, optionally inserted directly below `before`.
    fn add_layer(&self, spec: &LayerSpec, before: Option<&str>);

    fn remove_layer(&self, id: &str);

    fn remove_source(&self, id: &str);

    /// Set the layer's paint opacity.
    fn set_layer_opacity(&self, id: &str, opacity: f64);

    fn has_layer(&self, id: &str) -> bool;

    fn has_source(&self, id: &str) -> bool;
}

/// One recorded surface mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    AddImageSource {
        id: String,
        width: usize,
        height: usize,
        corners: DisplayCorners,
    },
    AddVectorSource {
        id: String,
        feature_count: usize,
    },
    AddLayer {
        id: String,
        source: String,
        kind: LayerKind,
        opacity: f64,
        before: Option<String>,
    },
    RemoveLayer {
        id: String,
    },
    RemoveSource {
        id: String,
    },
    SetLayerOpacity {
        id: String,
        opacity: f64,
    },
}

#[derive(Default)]
struct Recorded {
    ops: Vec<SurfaceOp>,
    layers: HashSet<String>,
    sources: HashSet<String>,
    vector_sources: HashMap<String, FeatureCollection>,
}

/// Surface double that records every operation and tracks live ids. Used by
/// the engine tests and the viewer binary.
#[derive(Default)]
pub struct RecordingSurface {
    inner: Mutex<Recorded>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation applied so far, in order.
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.inner.lock().unwrap().ops.clone()
    }

    /// Live layer ids.
    pub fn layers(&self) -> Vec<String> {
        let mut layers: Vec<String> = self
            .inner
            .lock()
            .unwrap()
            .layers
            .iter()
            .cloned()
            .collect();
        layers.sort();
        layers
    }

    /// The collection most recently attached to a vector source.
    pub fn vector_source(&self, id: &str) -> Option<FeatureCollection> {
        self.inner.lock().unwrap().vector_sources.get(id).cloned()
    }
}

impl MapSurface for RecordingSurface {
    fn add_image_source(&self, id: &str, image: &DecodedImage, corners: &DisplayCorners) {
        let mut inner = self.inner.lock().unwrap();
        inner.sources.insert(id.to_string());
        inner.ops.push(SurfaceOp::AddImageSource {
            id: id.to_string(),
            width: image.width,
            height: image.height,
            corners: *corners,
        });
    }

    fn add_vector_source(&self, id: &str, collection: &FeatureCollection) {
        let mut inner = self.inner.lock().unwrap();
        inner.sources.insert(id.to_string());
        inner
            .vector_sources
            .insert(id.to_string(), collection.clone());
        inner.ops.push(SurfaceOp::AddVectorSource {
            id: id.to_string(),
            feature_count: collection.len(),
        });
    }

    fn add_layer(&self, spec: &LayerSpec, before: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();
        inner.layers.insert(spec.id.clone());
        inner.ops.push(SurfaceOp::AddLayer {
            id: spec.id.clone(),
            source: spec.source.clone(),
            kind: spec.kind,
            opacity: spec.opacity,
            before: before.map(str::to_string),
        });
    }

    fn remove_layer(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.layers.remove(id);
        inner.ops.push(SurfaceOp::RemoveLayer { id: id.to_string() });
    }

    fn remove_source(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.sources.remove(id);
        inner.vector_sources.remove(id);
        inner.ops.push(SurfaceOp::RemoveSource { id: id.to_string() });
    }

    fn set_layer_opacity(&self, id: &str, opacity: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.ops.push(SurfaceOp::SetLayerOpacity {
            id: id.to_string(),
            opacity,
        });
    }

    fn has_layer(&self, id: &str) -> bool {
        self.inner.lock().unwrap().layers.contains(id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.inner.lock().unwrap().sources.contains(id)
    }
}
