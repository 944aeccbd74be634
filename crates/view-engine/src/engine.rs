//! The async adapter around the pure transition table.
//!
//! [`ViewEngine`] owns the view state, the caches and the asset source,
//! executes planned effects against a [`MapSurface`], and guards against
//! out-of-order completions: request parameters are captured by value at
//! initiation, and a completion whose request is no longer the latest makes
//! no surface mutation and no loaded-state write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use aq_common::{AqResult, LayerKey, PeriodKey};
use assets::{layout, AssetSource, BoundsResolver, RasterCache, ResolvedBounds, StationStore};
use assets::raster_cache::RasterCacheStats;
use geometry::FeatureCollection;
use raster::{DecodeOptions, DecodedImage, NormalizationRange};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::plan::{plan, Effect, ViewRequest};
use crate::state::{LoadedState, MaterializeMode, ViewState};
use crate::surface::{ids, LayerKind, LayerSpec, MapSurface};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: MaterializeMode,
    /// Initial shared raster opacity.
    pub opacity: f64,
    /// Extension of the per-month raster images.
    pub raster_extension: String,
    /// Colormap used when the bounds descriptor carries no scale entry for
    /// the requested pollutant.
    pub fallback_colormap: String,
    /// Decoded-image LRU capacity.
    pub raster_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: MaterializeMode::SingleMonth,
            opacity: 0.9,
            raster_extension: "tif".to_string(),
            fallback_colormap: "inferno".to_string(),
            raster_cache_capacity: 16,
        }
    }
}

/// The layer view-state machine's executor.
pub struct ViewEngine {
    surface: Arc<dyn MapSurface>,
    source: Arc<dyn AssetSource>,
    bounds: BoundsResolver,
    stations: StationStore,
    cache: RasterCache,
    config: EngineConfig,
    state: RwLock<ViewState>,
    /// Monotonic request counter; the latest value marks the only request
    /// allowed to mutate the surface after a suspension point.
    seq: AtomicU64,
}

impl ViewEngine {
    pub fn new(
        surface: Arc<dyn MapSurface>,
        source: Arc<dyn AssetSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            surface,
            bounds: BoundsResolver::new(source.clone()),
            stations: StationStore::new(source.clone()),
            cache: RasterCache::new(config.raster_cache_capacity),
            state: RwLock::new(ViewState::new(config.mode, config.opacity)),
            source,
            config,
            seq: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current view state.
    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    pub async fn cache_stats(&self) -> RasterCacheStats {
        self.cache.stats().await
    }

    /// Apply one request: plan against the current state, then execute the
    /// effects in order. A blocking failure aborts the remaining effects;
    /// the previous visual state stays on the surface.
    pub async fn handle(&self, request: ViewRequest) -> AqResult<()> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let effects = {
            let state = self.state.read().await;
            plan(&state, &request)
        };
        debug!(?request, effects = effects.len(), "planned transition");
        for effect in effects {
            self.execute(effect, seq).await?;
        }
        Ok(())
    }

    /// True when a newer request has been initiated since `seq` was issued.
    fn is_stale(&self, seq: u64) -> bool {
        self.seq.load(Ordering::SeqCst) != seq
    }

    async fn execute(&self, effect: Effect, seq: u64) -> AqResult<()> {
        match effect {
            Effect::SetSliderDomain(domain) => {
                self.state.write().await.slider = domain;
                Ok(())
            }
            Effect::SetOpacity(opacity) => {
                self.state.write().await.opacity = opacity.clamp(0.0, 1.0);
                Ok(())
            }
            Effect::ApplyOpacity => {
                self.apply_opacity().await;
                Ok(())
            }
            Effect::SetShowAll(enabled) => {
                self.state.write().await.show_all_stations = enabled;
                Ok(())
            }
            Effect::TearDownRaster => {
                self.remove_raster_layers();
                self.state.write().await.loaded = LoadedState::NoData;
                Ok(())
            }
            Effect::Materialize(key) => self.materialize(key, seq).await,
            Effect::AdvanceMonth(key) => {
                if self.is_stale(seq) {
                    debug!(%key, "dropping stale month advance");
                    return Ok(());
                }
                self.state.write().await.loaded = LoadedState::Key(key);
                Ok(())
            }
            Effect::SwitchVisibleMonth(key) => self.switch_visible_month(key, seq).await,
            Effect::LoadStations(key) => self.load_stations(key, seq).await,
            Effect::LoadAllStations => self.load_all_stations(seq).await,
            Effect::ClearStations => {
                self.remove_station_overlay();
                Ok(())
            }
        }
    }

    /// Re-apply the shared opacity to every raster layer currently up. In
    /// preload mode only the loaded month stays visible; the others are held
    /// at zero.
    async fn apply_opacity(&self) {
        let (opacity, visible_month) = {
            let state = self.state.read().await;
            (state.opacity, state.loaded.key().map(|key| key.period.month))
        };
        if self.surface.has_layer(ids::RASTER_LAYER) {
            self.surface.set_layer_opacity(ids::RASTER_LAYER, opacity);
        }
        for month in 1..=12u8 {
            let layer = ids::month_layer(month);
            if self.surface.has_layer(&layer) {
                let target = if Some(month) == visible_month { opacity } else { 0.0 };
                self.surface.set_layer_opacity(&layer, target);
            }
        }
    }

    /// Cold path: resolve bounds, fetch and decode the raster(s), then swap
    /// them in under the station overlay. Every fetch happens before the
    /// first surface mutation, so a failure leaves the previous layer
    /// untouched.
    async fn materialize(&self, key: LayerKey, seq: u64) -> AqResult<()> {
        let bounds = self
            .bounds
            .resolve(key.city.as_deref(), key.period.year)
            .await?;
        let (colormap, range) = match bounds.scale_for(key.pollutant) {
            Some(scale) => (
                scale.colormap.clone(),
                Some(NormalizationRange::new(scale.vmin as f32, scale.vmax as f32)),
            ),
            None => (self.config.fallback_colormap.clone(), None),
        };

        let mode = self.state.read().await.mode;
        match mode {
            MaterializeMode::SingleMonth => {
                self.materialize_single(key, &bounds, &colormap, range, seq)
                    .await
            }
            MaterializeMode::PreloadYear => {
                self.materialize_year(key, &bounds, &colormap, range, seq)
                    .await
            }
        }
    }

    async fn materialize_single(
        &self,
        key: LayerKey,
        bounds: &ResolvedBounds,
        colormap: &str,
        range: Option<NormalizationRange>,
        seq: u64,
    ) -> AqResult<()> {
        let image = self.fetch_decoded(&key, colormap, range).await?;
        if self.is_stale(seq) {
            debug!(%key, "dropping stale materialization");
            return Ok(());
        }

        let opacity = self.state.read().await.opacity;
        self.remove_raster_layers();
        self.surface
            .add_image_source(ids::RASTER_SOURCE, &image, &bounds.corners);
        self.surface.add_layer(
            &LayerSpec {
                id: ids::RASTER_LAYER.to_string(),
                source: ids::RASTER_SOURCE.to_string(),
                kind: LayerKind::Raster,
                opacity,
            },
            self.below_stations(),
        );
        info!(%key, "materialized raster layer");
        self.state.write().await.loaded = LoadedState::Key(key);
        Ok(())
    }

    /// Preload strategy: all twelve month layers go up at once; the target
    /// month gets the shared opacity and the rest are held at zero, so later
    /// month switches cost nothing. A month whose raster is missing or
    /// malformed is skipped unless it is the requested one.
    async fn materialize_year(
        &self,
        key: LayerKey,
        bounds: &ResolvedBounds,
        colormap: &str,
        range: Option<NormalizationRange>,
        seq: u64,
    ) -> AqResult<()> {
        let mut images: Vec<(u8, Arc<DecodedImage>)> = Vec::new();
        for month in 1..=12u8 {
            let month_key = LayerKey::new(
                key.city.clone(),
                key.pollutant,
                PeriodKey::new(key.period.year, month)?,
            );
            match self.fetch_decoded(&month_key, colormap, range).await {
                Ok(image) => images.push((month, image)),
                Err(e) if month == key.period.month => return Err(e),
                Err(e) => warn!(month, error = %e, "skipping month raster"),
            }
        }
        if self.is_stale(seq) {
            debug!(%key, "dropping stale materialization");
            return Ok(());
        }

        let opacity = self.state.read().await.opacity;
        self.remove_raster_layers();
        for (month, image) in images {
            let source = ids::month_source(month);
            self.surface
                .add_image_source(&source, &image, &bounds.corners);
            self.surface.add_layer(
                &LayerSpec {
                    id: ids::month_layer(month),
                    source,
                    kind: LayerKind::Raster,
                    opacity: if month == key.period.month { opacity } else { 0.0 },
                },
                self.below_stations(),
            );
        }
        info!(%key, "materialized year of raster layers");
        self.state.write().await.loaded = LoadedState::Key(key);
        Ok(())
    }

    /// Preload-mode fast path: flip per-month opacity, no fetches.
    async fn switch_visible_month(&self, key: LayerKey, seq: u64) -> AqResult<()> {
        if self.is_stale(seq) {
            debug!(%key, "dropping stale month switch");
            return Ok(());
        }
        let opacity = self.state.read().await.opacity;
        for month in 1..=12u8 {
            let layer = ids::month_layer(month);
            if self.surface.has_layer(&layer) {
                let target = if month == key.period.month { opacity } else { 0.0 };
                self.surface.set_layer_opacity(&layer, target);
            }
        }
        self.state.write().await.loaded = LoadedState::Key(key);
        Ok(())
    }

    /// Fetch-and-decode with the LRU in front.
    async fn fetch_decoded(
        &self,
        key: &LayerKey,
        colormap: &str,
        range: Option<NormalizationRange>,
    ) -> AqResult<Arc<DecodedImage>> {
        if let Some(image) = self.cache.get(key).await {
            return Ok(image);
        }
        let path = layout::raster_image(
            key.city.as_deref(),
            key.pollutant,
            key.period,
            colormap,
            &self.config.raster_extension,
        );
        let payload = self.source.fetch(&path).await?;
        let grid = raster::read_geotiff(&payload)?;
        let image = Arc::new(raster::decode(
            &grid,
            &DecodeOptions {
                band_indices: None,
                range,
            },
        )?);
        self.cache.insert(key, image.clone()).await;
        Ok(image)
    }

    async fn load_stations(&self, key: LayerKey, seq: u64) -> AqResult<()> {
        let result = self
            .stations
            .load(key.city.as_deref(), key.pollutant, key.period)
            .await;
        let collection = match result {
            Ok(collection) => collection,
            // Missing station files mean "no observations here", not an
            // error the session has to surface.
            Err(e) if !e.blocks_transition() => {
                debug!(error = %e, "no station data for period");
                FeatureCollection::empty()
            }
            Err(e) => return Err(e),
        };
        if self.is_stale(seq) {
            debug!(%key, "dropping stale station load");
            return Ok(());
        }
        self.swap_station_overlay(&collection);
        Ok(())
    }

    async fn load_all_stations(&self, seq: u64) -> AqResult<()> {
        let collection = self.stations.all_stations().await?;
        if self.is_stale(seq) {
            debug!("dropping stale show-all station load");
            return Ok(());
        }
        self.swap_station_overlay(&collection);
        Ok(())
    }

    /// Replace the station overlay, or tear it down when the collection is
    /// empty so no stale-looking layer stays up.
    fn swap_station_overlay(&self, collection: &FeatureCollection) {
        self.remove_station_overlay();
        if collection.is_empty() {
            return;
        }
        self.surface
            .add_vector_source(ids::STATION_SOURCE, collection);
        self.surface.add_layer(
            &LayerSpec {
                id: ids::STATION_LAYER.to_string(),
                source: ids::STATION_SOURCE.to_string(),
                kind: LayerKind::Circle,
                opacity: 1.0,
            },
            None,
        );
    }

    fn remove_station_overlay(&self) {
        if self.surface.has_layer(ids::STATION_LAYER) {
            self.surface.remove_layer(ids::STATION_LAYER);
        }
        if self.surface.has_source(ids::STATION_SOURCE) {
            self.surface.remove_source(ids::STATION_SOURCE);
        }
    }

    /// Remove every raster source/layer pair, layers first. Covers both the
    /// single current pair and the per-month preload pairs, so the surface
    /// never holds two pairs under the same id.
    fn remove_raster_layers(&self) {
        if self.surface.has_layer(ids::RASTER_LAYER) {
            self.surface.remove_layer(ids::RASTER_LAYER);
        }
        if self.surface.has_source(ids::RASTER_SOURCE) {
            self.surface.remove_source(ids::RASTER_SOURCE);
        }
        for month in 1..=12u8 {
            let layer = ids::month_layer(month);
            if self.surface.has_layer(&layer) {
                self.surface.remove_layer(&layer);
            }
            let source = ids::month_source(month);
            if self.surface.has_source(&source) {
                self.surface.remove_source(&source);
            }
        }
    }

    /// Rasters slot in directly below the station overlay when one is up,
    /// keeping stations visually on top.
    fn below_stations(&self) -> Option<&str> {
        self.surface
            .has_layer(ids::STATION_LAYER)
            .then_some(ids::STATION_LAYER)
    }
}
