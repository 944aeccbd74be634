//! Scripted driver for the air-quality view engine.
//!
//! Runs a month/pollutant sweep against a local asset tree and prints the
//! surface operations the engine performed, plus station ground-truth values
//! converted to µg/m³. Exists to exercise the engine end-to-end without a
//! real map renderer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use aq_common::{LayerSelection, PeriodKey, Pollutant};
use assets::LocalAssetSource;
use view_engine::{
    ids, EngineConfig, MaterializeMode, RecordingSurface, SurfaceOp, ViewEngine, ViewRequest,
};

#[derive(Parser, Debug)]
#[command(name = "viewer")]
#[command(about = "Air-quality map view engine driver")]
struct Args {
    /// Root of the published asset tree
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// City whose predictions to display (default asset tree when omitted)
    #[arg(long)]
    city: Option<String>,

    /// Prediction year
    #[arg(long, default_value = "2024")]
    year: u16,

    /// Pollutants to sweep (NO2, O3, SO2, PM2.5, PM10)
    #[arg(long, default_value = "NO2", value_delimiter = ',')]
    pollutants: Vec<String>,

    /// Months to sweep
    #[arg(long, default_value = "1,2,3", value_delimiter = ',')]
    months: Vec<u8>,

    /// Materialize all twelve month layers up front
    #[arg(long)]
    preload_year: bool,

    /// Initial raster opacity
    #[arg(long, default_value = "0.9")]
    opacity: f64,

    /// Finish the sweep in the show-all-stations view
    #[arg(long)]
    show_all: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level: Level = args.log_level.parse().context("invalid log level")?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let pollutants: Vec<Pollutant> = args
        .pollutants
        .iter()
        .map(|name| Pollutant::parse(name))
        .collect::<Result<_, _>>()?;

    let config = EngineConfig {
        mode: if args.preload_year {
            MaterializeMode::PreloadYear
        } else {
            MaterializeMode::SingleMonth
        },
        opacity: args.opacity,
        ..Default::default()
    };

    let surface = Arc::new(RecordingSurface::new());
    let source = Arc::new(LocalAssetSource::new(args.assets.clone()));
    let engine = ViewEngine::new(surface.clone(), source, config);

    info!(assets = %args.assets.display(), year = args.year, "starting sweep");

    for &pollutant in &pollutants {
        for &month in &args.months {
            let period = PeriodKey::new(args.year, month)?;
            let request = ViewRequest::select(
                args.city.clone(),
                LayerSelection::Pollutant(pollutant),
                period,
            );
            if let Err(e) = engine.handle(request).await {
                warn!(%pollutant, month, error = %e, "transition failed, previous view kept");
                continue;
            }
            report_stations(&surface, pollutant);
        }
    }

    if args.show_all {
        engine.handle(ViewRequest::ShowAllStations(true)).await?;
        if let Some(stations) = surface.vector_source(ids::STATION_SOURCE) {
            info!(stations = stations.len(), "show-all overlay");
        }
    }

    println!("surface operations:");
    for op in surface.ops() {
        println!("  {}", describe(&op));
    }

    let stats = engine.cache_stats().await;
    info!(
        hits = stats.hits,
        misses = stats.misses,
        entries = stats.entries,
        "decoded raster cache"
    );
    Ok(())
}

fn report_stations(surface: &RecordingSurface, pollutant: Pollutant) {
    let Some(stations) = surface.vector_source(ids::STATION_SOURCE) else {
        info!(%pollutant, "no station overlay");
        return;
    };
    for feature in &stations.features {
        let station = feature.property_str("station_id").unwrap_or("?");
        if let Some(value) = feature.property_f64("ground_truth_value") {
            info!(
                station,
                %pollutant,
                value_ug_m3 = pollutant.to_ug_per_m3(value),
                "ground truth"
            );
        }
    }
}

fn describe(op: &SurfaceOp) -> String {
    match op {
        SurfaceOp::AddImageSource {
            id, width, height, ..
        } => format!("add image source {} ({}x{})", id, width, height),
        SurfaceOp::AddVectorSource { id, feature_count } => {
            format!("add vector source {} ({} features)", id, feature_count)
        }
        SurfaceOp::AddLayer {
            id,
            source,
            opacity,
            before,
            ..
        } => match before {
            Some(before) => format!(
                "add layer {} (source {}, opacity {:.2}, below {})",
                id, source, opacity, before
            ),
            None => format!("add layer {} (source {}, opacity {:.2})", id, source, opacity),
        },
        SurfaceOp::RemoveLayer { id } => format!("remove layer {}", id),
        SurfaceOp::RemoveSource { id } => format!("remove source {}", id),
        SurfaceOp::SetLayerOpacity { id, opacity } => {
            format!("set layer {} opacity {:.2}", id, opacity)
        }
    }
}
