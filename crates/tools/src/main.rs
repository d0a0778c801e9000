use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::bounds::Extent;
use foundation::math::{Srs, Vec2, transform, transform_extent};
use foundation::time::Time;
use layers::ClickResult;
use scene::selection::SelectionPolygon;
use serde::Serialize;
use tools::{HeadlessMap, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the map interaction engine")]
struct Args {
    /// Session file (JSON: config, view, layers, records, polygons)
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List loaded layers and their render layers
    Layers,

    /// Resolve a click at a pixel of the session view
    Click {
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },

    /// Catalogue records intersecting an extent (default: the session view)
    Extent {
        /// Extent: minX,minY,maxX,maxY
        #[arg(long)]
        bbox: Option<String>,

        /// SRS of --bbox
        #[arg(long, default_value = "EPSG:4326")]
        srs: String,
    },

    /// Normalize a polygon the way the clipboard stores it
    Simplify {
        /// Coordinates: "x,y x,y ..."
        coordinates: String,

        /// SRS of the input coordinates
        #[arg(long, default_value = "EPSG:4326")]
        srs: String,

        /// Clipboard name of the polygon
        #[arg(long, default_value = "cli")]
        name: String,
    },
}

#[derive(Serialize)]
struct LayerReport {
    id: String,
    name: String,
    render_layers: Vec<u64>,
}

#[derive(Serialize)]
struct FeatureReport {
    render_layer: u64,
    owner: Option<String>,
    record_id: Option<String>,
    name: Option<String>,
}

#[derive(Serialize)]
struct ClickReport {
    pixel: [f64; 2],
    click_coord: [f64; 2],
    lon_lat: [f64; 2],
    layers: Vec<String>,
    render_layers: Vec<u64>,
    features: Vec<FeatureReport>,
}

#[derive(Serialize)]
struct RecordReport {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct PolygonReport {
    name: String,
    srs: String,
    vertices: usize,
    coordinates: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let session = match &args.session {
        Some(path) => Session::load(path).map_err(|e| e.to_string())?,
        None => Session::default(),
    };
    let mut map = session.open().map_err(|e| e.to_string())?;

    match args.command {
        Command::Layers => cmd_layers(&map),
        Command::Click { x, y } => cmd_click(&mut map, Vec2::new(x, y)),
        Command::Extent { bbox, srs } => cmd_extent(&map, bbox.as_deref(), &srs),
        Command::Simplify {
            coordinates,
            srs,
            name,
        } => cmd_simplify(&mut map, SelectionPolygon::new(name, srs, coordinates)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn cmd_layers(map: &HeadlessMap) -> Result<(), String> {
    let reports: Vec<LayerReport> = map
        .registry()
        .models()
        .map(|model| LayerReport {
            id: model.id.clone(),
            name: model.name.clone(),
            render_layers: map
                .registry()
                .get_layer_by_id(&model.id)
                .map(|h| h.iter().map(|id| id.0).collect())
                .unwrap_or_default(),
        })
        .collect();
    print_json(&reports)
}

fn cmd_click(map: &mut HeadlessMap, pixel: Vec2) -> Result<(), String> {
    let result: ClickResult = map
        .handle_click(pixel, Time::default())
        .map_err(|e| e.to_string())?
        .ok_or("click ignored")?;

    let lon_lat = transform(result.click_coord, Srs::WORKING, Srs::CATALOGUE);
    let mut layers: Vec<String> = Vec::new();
    for handle in &result.clicked_layers {
        if let Some(owner) = map.registry().owner_of(*handle) {
            if !layers.iter().any(|l| l == owner) {
                layers.push(owner.to_string());
            }
        }
    }

    let report = ClickReport {
        pixel: result.pixel.as_array(),
        click_coord: result.click_coord.as_array(),
        lon_lat: lon_lat.as_array(),
        layers,
        render_layers: result.clicked_layers.iter().map(|h| h.0).collect(),
        features: result
            .clicked_features
            .iter()
            .map(|hit| FeatureReport {
                render_layer: hit.layer.0,
                owner: hit.feature.owner.clone(),
                record_id: hit.feature.record_id.clone(),
                name: hit.feature.name.clone(),
            })
            .collect(),
    };
    print_json(&report)
}

fn parse_bbox(text: &str) -> Result<Extent, String> {
    let values = text
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("bbox value `{v}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [min_x, min_y, max_x, max_y] => Ok(Extent::new(*min_x, *min_y, *max_x, *max_y)),
        _ => Err(format!("bbox needs 4 values, got {}", values.len())),
    }
}

fn cmd_extent(map: &HeadlessMap, bbox: Option<&str>, srs: &str) -> Result<(), String> {
    let extent = match bbox {
        Some(text) => {
            let from = Srs::parse(srs).map_err(|e| e.to_string())?;
            transform_extent(parse_bbox(text)?, from, Srs::WORKING)
        }
        None => map.map_extent(),
    };
    let reports: Vec<RecordReport> = map
        .records_in_extent(&extent)
        .into_iter()
        .map(|r| RecordReport {
            id: r.id.clone(),
            name: r.name.clone(),
        })
        .collect();
    print_json(&reports)
}

fn cmd_simplify(map: &mut HeadlessMap, polygon: SelectionPolygon) -> Result<(), String> {
    print_json(&simplify_report(map, polygon)?)
}

fn simplify_report(
    map: &mut HeadlessMap,
    polygon: SelectionPolygon,
) -> Result<PolygonReport, String> {
    let name = polygon.name.clone();
    let added = map.add_polygon(polygon).map_err(|e| e.to_string())?;
    if !added {
        return Err(format!("polygon `{name}` already in session clipboard"));
    }
    let stored = map
        .clipboard()
        .get(&name)
        .ok_or_else(|| format!("polygon `{name}` missing after add"))?;
    let vertices = stored.vertices().map_err(|e| e.to_string())?.len();
    Ok(PolygonReport {
        name: stored.name.clone(),
        srs: stored.srs.clone(),
        vertices,
        coordinates: stored.coordinates.clone(),
    })
}
