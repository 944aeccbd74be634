//! The pure transition table.
//!
//! [`plan`] maps (current view state, request) to an ordered list of
//! effects; it performs no I/O and touches no surface, so the whole
//! transition table is testable without a renderer or a network. The
//! [`crate::engine::ViewEngine`] adapter executes the effects and applies
//! their state updates.

use aq_common::{LayerKey, LayerSelection, PeriodKey};

use crate::state::{MaterializeMode, SliderDomain, ViewState};

/// One incoming UI event.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewRequest {
    /// A pollutant-tab selection, resolved against the requested period.
    Select {
        city: Option<String>,
        selection: LayerSelection,
        period: PeriodKey,
    },
    /// A slider drag: a month in normal mode, a percentage while
    /// opacity-control is active.
    Slider(u32),
    /// The "show all stations" toggle.
    ShowAllStations(bool),
}

impl ViewRequest {
    /// Convenience constructor for the common concrete-key selection.
    pub fn select(city: Option<String>, selection: LayerSelection, period: PeriodKey) -> Self {
        ViewRequest::Select {
            city,
            selection,
            period,
        }
    }
}

/// One planned side effect, executed in order by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Swap the slider's numeric domain.
    SetSliderDomain(SliderDomain),
    /// Record a new shared opacity value.
    SetOpacity(f64),
    /// Re-apply the shared opacity to whatever raster layers are up.
    ApplyOpacity,
    /// Record the show-all-stations toggle.
    SetShowAll(bool),
    /// Remove the materialized raster pair(s) and record the no-data state.
    TearDownRaster,
    /// Cold path: fetch, decode and swap in the raster(s) for this key.
    Materialize(LayerKey),
    /// Fast path, single-month mode: record the new month; the materialized
    /// raster and the surface stay untouched.
    AdvanceMonth(LayerKey),
    /// Fast path, preload-year mode: flip per-month layer opacity so only
    /// the target month is visible.
    SwitchVisibleMonth(LayerKey),
    /// Load the station overlay for this key.
    LoadStations(LayerKey),
    /// Load the deduplicated union of stations across all pollutants.
    LoadAllStations,
    /// Remove the station overlay.
    ClearStations,
}

/// Plan the effects for a request against the current state.
pub fn plan(state: &ViewState, request: &ViewRequest) -> Vec<Effect> {
    match request {
        ViewRequest::Select {
            city,
            selection,
            period,
        } => plan_selection(state, city.clone(), *selection, *period),
        ViewRequest::Slider(value) => plan_slider(state, *value),
        ViewRequest::ShowAllStations(enabled) => plan_show_all(state, *enabled),
    }
}

fn plan_selection(
    state: &ViewState,
    city: Option<String>,
    selection: LayerSelection,
    period: PeriodKey,
) -> Vec<Effect> {
    match selection {
        LayerSelection::OpacityControl => {
            let mut effects = Vec::new();
            if !state.in_opacity_control() {
                effects.push(Effect::SetSliderDomain(SliderDomain::Percent));
            }
            // The materialized raster stays; the slider now drives its
            // opacity. The station overlay has no meaning here.
            effects.push(Effect::ApplyOpacity);
            effects.push(Effect::ClearStations);
            effects
        }
        LayerSelection::NoData => {
            let mut effects = Vec::new();
            if state.in_opacity_control() {
                effects.push(Effect::SetSliderDomain(SliderDomain::Months));
            }
            // Tear the raster down; the station overlay is left as-is.
            effects.push(Effect::TearDownRaster);
            effects
        }
        LayerSelection::Pollutant(pollutant) => {
            let mut effects = Vec::new();
            if state.in_opacity_control() {
                effects.push(Effect::SetSliderDomain(SliderDomain::Months));
                effects.push(Effect::ApplyOpacity);
            }
            effects.extend(concrete_key_effects(state, LayerKey::new(city, pollutant, period)));
            effects
        }
    }
}

fn plan_slider(state: &ViewState, value: u32) -> Vec<Effect> {
    if state.in_opacity_control() {
        let opacity = value.min(100) as f64 / 100.0;
        return vec![Effect::SetOpacity(opacity), Effect::ApplyOpacity];
    }
    // A month drag only means something once a pollutant is materialized.
    let Some(current) = state.loaded.key() else {
        return Vec::new();
    };
    let (lo, hi) = SliderDomain::Months.bounds();
    if value < lo || value > hi {
        return Vec::new();
    }
    let Ok(period) = PeriodKey::new(current.period.year, value as u8) else {
        return Vec::new();
    };
    let key = LayerKey::new(current.city.clone(), current.pollutant, period);
    concrete_key_effects(state, key)
}

fn plan_show_all(state: &ViewState, enabled: bool) -> Vec<Effect> {
    if enabled == state.show_all_stations {
        return Vec::new();
    }
    if enabled {
        return vec![Effect::SetShowAll(true), Effect::LoadAllStations];
    }
    // Leaving show-all restores the per-period overlay for the loaded key.
    let mut effects = vec![Effect::SetShowAll(false)];
    match state.loaded.key() {
        Some(key) => effects.push(Effect::LoadStations(key.clone())),
        None => effects.push(Effect::ClearStations),
    }
    effects
}

/// Effects for a transition ending in a concrete key: fast path when only
/// the month differs from the loaded key, cold path otherwise, and the
/// station load unless show-all suppresses it.
fn concrete_key_effects(state: &ViewState, key: LayerKey) -> Vec<Effect> {
    let mut effects = Vec::new();
    let fast = state
        .loaded
        .key()
        .is_some_and(|current| current.same_raster_slot(&key));
    if fast {
        match state.mode {
            MaterializeMode::SingleMonth => effects.push(Effect::AdvanceMonth(key.clone())),
            MaterializeMode::PreloadYear => effects.push(Effect::SwitchVisibleMonth(key.clone())),
        }
    } else {
        effects.push(Effect::Materialize(key.clone()));
    }
    if !state.show_all_stations {
        effects.push(Effect::LoadStations(key));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LoadedState;
    use aq_common::Pollutant;

    fn key(pollutant: Pollutant, month: u8) -> LayerKey {
        LayerKey::new(
            Some("Bologna".to_string()),
            pollutant,
            PeriodKey::new(2024, month).unwrap(),
        )
    }

    fn select(pollutant: Pollutant, month: u8) -> ViewRequest {
        ViewRequest::select(
            Some("Bologna".to_string()),
            LayerSelection::Pollutant(pollutant),
            PeriodKey::new(2024, month).unwrap(),
        )
    }

    fn materialized(month: u8) -> ViewState {
        let mut state = ViewState::new(MaterializeMode::SingleMonth, 0.9);
        state.loaded = LoadedState::Key(key(Pollutant::No2, month));
        state
    }

    #[test]
    fn test_first_selection_is_cold_path() {
        let state = ViewState::new(MaterializeMode::SingleMonth, 0.9);
        let effects = plan(&state, &select(Pollutant::No2, 2));
        assert_eq!(
            effects,
            vec![
                Effect::Materialize(key(Pollutant::No2, 2)),
                Effect::LoadStations(key(Pollutant::No2, 2)),
            ]
        );
    }

    #[test]
    fn test_month_only_change_is_fast_path() {
        let effects = plan(&materialized(2), &select(Pollutant::No2, 3));
        assert_eq!(
            effects,
            vec![
                Effect::AdvanceMonth(key(Pollutant::No2, 3)),
                Effect::LoadStations(key(Pollutant::No2, 3)),
            ]
        );
    }

    #[test]
    fn test_month_change_in_preload_mode_switches_visibility() {
        let mut state = materialized(2);
        state.mode = MaterializeMode::PreloadYear;
        let effects = plan(&state, &select(Pollutant::No2, 3));
        assert_eq!(effects[0], Effect::SwitchVisibleMonth(key(Pollutant::No2, 3)));
    }

    #[test]
    fn test_pollutant_change_is_cold_path() {
        let effects = plan(&materialized(2), &select(Pollutant::O3, 2));
        assert_eq!(effects[0], Effect::Materialize(key(Pollutant::O3, 2)));
    }

    #[test]
    fn test_city_change_is_cold_path() {
        let request = ViewRequest::select(
            Some("Milano".to_string()),
            LayerSelection::Pollutant(Pollutant::No2),
            PeriodKey::new(2024, 2).unwrap(),
        );
        let effects = plan(&materialized(2), &request);
        assert!(matches!(effects[0], Effect::Materialize(_)));
    }

    #[test]
    fn test_opacity_control_swaps_domain_and_keeps_raster() {
        let request = ViewRequest::select(
            Some("Bologna".to_string()),
            LayerSelection::OpacityControl,
            PeriodKey::new(2024, 2).unwrap(),
        );
        let effects = plan(&materialized(2), &request);
        assert_eq!(
            effects,
            vec![
                Effect::SetSliderDomain(SliderDomain::Percent),
                Effect::ApplyOpacity,
                Effect::ClearStations,
            ]
        );
    }

    #[test]
    fn test_leaving_opacity_control_restores_domain() {
        let mut state = materialized(2);
        state.slider = SliderDomain::Percent;
        let effects = plan(&state, &select(Pollutant::No2, 3));
        assert_eq!(effects[0], Effect::SetSliderDomain(SliderDomain::Months));
        assert_eq!(effects[1], Effect::ApplyOpacity);
        assert_eq!(effects[2], Effect::AdvanceMonth(key(Pollutant::No2, 3)));
    }

    #[test]
    fn test_no_data_tears_down_without_touching_stations() {
        let request = ViewRequest::select(
            Some("Bologna".to_string()),
            LayerSelection::NoData,
            PeriodKey::new(2024, 2).unwrap(),
        );
        let effects = plan(&materialized(2), &request);
        assert_eq!(effects, vec![Effect::TearDownRaster]);
    }

    #[test]
    fn test_slider_in_percent_domain_drives_opacity() {
        let mut state = materialized(2);
        state.slider = SliderDomain::Percent;
        let effects = plan(&state, &ViewRequest::Slider(40));
        assert_eq!(effects, vec![Effect::SetOpacity(0.4), Effect::ApplyOpacity]);
    }

    #[test]
    fn test_slider_in_month_domain_selects_month() {
        let effects = plan(&materialized(2), &ViewRequest::Slider(5));
        assert_eq!(effects[0], Effect::AdvanceMonth(key(Pollutant::No2, 5)));
    }

    #[test]
    fn test_slider_month_without_loaded_key_is_noop() {
        let state = ViewState::new(MaterializeMode::SingleMonth, 0.9);
        assert!(plan(&state, &ViewRequest::Slider(5)).is_empty());
    }

    #[test]
    fn test_slider_out_of_calendar_range_is_noop() {
        assert!(plan(&materialized(2), &ViewRequest::Slider(0)).is_empty());
        assert!(plan(&materialized(2), &ViewRequest::Slider(13)).is_empty());
        // Far outside the domain must not alias back into it.
        assert!(plan(&materialized(2), &ViewRequest::Slider(268)).is_empty());
    }

    #[test]
    fn test_show_all_suppresses_station_load() {
        let mut state = materialized(2);
        state.show_all_stations = true;
        let effects = plan(&state, &select(Pollutant::No2, 3));
        assert_eq!(effects, vec![Effect::AdvanceMonth(key(Pollutant::No2, 3))]);
    }

    #[test]
    fn test_show_all_toggle_round_trip() {
        let state = materialized(2);
        let on = plan(&state, &ViewRequest::ShowAllStations(true));
        assert_eq!(on, vec![Effect::SetShowAll(true), Effect::LoadAllStations]);

        let mut showing_all = state.clone();
        showing_all.show_all_stations = true;
        let off = plan(&showing_all, &ViewRequest::ShowAllStations(false));
        assert_eq!(
            off,
            vec![
                Effect::SetShowAll(false),
                Effect::LoadStations(key(Pollutant::No2, 2)),
            ]
        );
    }

    #[test]
    fn test_show_all_toggle_is_idempotent() {
        let state = materialized(2);
        assert!(plan(&state, &ViewRequest::ShowAllStations(false)).is_empty());
    }
}
