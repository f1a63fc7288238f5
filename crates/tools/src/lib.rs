use std::fs;
use std::path::{Path, PathBuf};

use compute::display::{format_km2, format_percent, format_rate};
use compute::{Change, RetreatSeries, YearMetrics, compute_change};
use formats::normalize::copy_id_property;
use formats::{DatasetRegistry, GlacierCollection, ParseOptions, REGISTRY_FILE_NAME, TileCoord};
use foundation::{Aabb2, EntityId, Year};
use layers::{LayerSource, MapLayer};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use layers::charts::{ChartFrame, RecordingPanel};
use layers::symbology::LayerStyle;
use layers::vector::VectorLayer;
use runtime::{BinderConfig, ChartPanels, ControlEvent, RenderBinder, Viewer};
use serde::Serialize;
use streaming::FsSource;

/// One row of the area report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearReport {
    pub year: Year,
    pub total_km2: f64,
    pub glaciers: usize,
    pub skipped_features: usize,
    pub since_previous: Option<Change>,
    pub since_baseline: Change,
}

/// Per-year totals and changes for every dataset in the registry.
pub fn build_report(registry: &DatasetRegistry, options: &ParseOptions) -> Result<Vec<YearReport>, String> {
    let mut rows: Vec<YearReport> = Vec::new();
    let mut baseline: Option<(Year, f64)> = None;

    for entry in registry.entries() {
        let path = &entry.features;
        let payload = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
        let collection = GlacierCollection::from_geojson_str(&payload, options)
            .map_err(|e| format!("parse {path:?}: {e}"))?;
        let metrics = YearMetrics::from_collection(entry.year, &collection);

        let (base_year, base_total) = *baseline.get_or_insert((entry.year, metrics.total_km2));
        let since_previous = rows.last().map(|prev| {
            compute_change(metrics.total_km2, prev.total_km2, entry.year.years_since(prev.year))
        });

        rows.push(YearReport {
            year: entry.year,
            total_km2: metrics.total_km2,
            glaciers: metrics.by_entity.len(),
            skipped_features: collection.diagnostics.len(),
            since_previous,
            since_baseline: compute_change(metrics.total_km2, base_total, entry.year.years_since(base_year)),
        });
    }
    Ok(rows)
}

pub fn format_report(rows: &[YearReport]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{}  {:>14}  {:>5} glaciers",
            row.year,
            format_km2(row.total_km2),
            row.glaciers
        ));
        if let Some(prev) = &row.since_previous {
            out.push_str(&format!(
                "  prev {:>14} {:>9} {:>14}",
                format_km2(prev.absolute),
                format_percent(prev.percent),
                format_rate(prev.per_year)
            ));
        }
        if row.skipped_features > 0 {
            out.push_str(&format!("  ({} skipped)", row.skipped_features));
        }
        out.push('\n');
    }
    let series = RetreatSeries::new(rows.iter().map(|r| (r.year, r.total_km2)));
    if let (Some(first), Some(total)) = (rows.first(), series.since_first()) {
        out.push_str(&format!(
            "since {}: {} ({}, {})\n",
            first.year,
            format_km2(total.absolute),
            format_percent(total.percent),
            format_rate(total.per_year)
        ));
    }
    out
}

/// Scans `dir` for yearly GeoJSON files and writes a registry manifest.
///
/// `{year}` in `tiles_template` is replaced per dataset. Dataset paths are
/// written relative to the manifest when it lands in `dir`.
pub fn write_manifest(dir: &Path, out: Option<&Path>, tiles_template: Option<&str>) -> Result<PathBuf, String> {
    let registry = DatasetRegistry::scan_dir(dir).map_err(|e| format!("scan {dir:?}: {e}"))?;
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join(REGISTRY_FILE_NAME));

    let mut manifest = registry.to_manifest();
    let relative = out.parent() == Some(dir);
    for entry in &mut manifest.datasets {
        if relative {
            if let Ok(rel) = entry.features.strip_prefix(dir) {
                entry.features = rel.to_path_buf();
            }
        }
        entry.tiles = tiles_template.map(|t| t.replace("{year}", &entry.year.to_string()));
    }

    let payload = serde_json::to_string_pretty(&manifest).map_err(|e| format!("json: {e}"))?;
    fs::write(&out, payload).map_err(|e| format!("write {out:?}: {e}"))?;
    Ok(out)
}

/// Copies the `from` id property to `to` in every `.geojson` file of `dir`.
///
/// Files without any matching feature are left untouched. Returns the files
/// rewritten with the number of features in each.
pub fn normalize_dir(dir: &Path, from: &str, to: &str) -> Result<Vec<(PathBuf, usize)>, String> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| format!("read {dir:?}: {e}"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("geojson"))
        .collect();
    paths.sort();

    let mut touched = Vec::new();
    for path in paths {
        let payload = fs::read_to_string(&path).map_err(|e| format!("read {path:?}: {e}"))?;
        let mut doc: serde_json::Value =
            serde_json::from_str(&payload).map_err(|e| format!("parse {path:?}: {e}"))?;
        let n = copy_id_property(&mut doc, from, to);
        if n == 0 {
            continue;
        }
        let payload = serde_json::to_string_pretty(&doc).map_err(|e| format!("json: {e}"))?;
        fs::write(&path, payload).map_err(|e| format!("write {path:?}: {e}"))?;
        touched.push((path, n));
    }
    Ok(touched)
}

/// What [`extract_tiles`] wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub tiles: usize,
    /// Tiles stored gzip-compressed. They are written as stored.
    pub compressed: usize,
}

/// Unpacks an MBTiles file into a `{z}/{x}/{y}.pbf` tree under `out_dir`.
///
/// Only zoom levels inside the file's `minzoom`/`maxzoom` metadata are
/// written. The file is rejected when that metadata is missing or invalid,
/// and `out_dir` must not exist yet. With `remove_source` the MBTiles file is
/// deleted once every tile has been written.
pub fn extract_tiles(mbtiles: &Path, out_dir: &Path, remove_source: bool) -> Result<ExtractStats, String> {
    if out_dir.exists() {
        return Err(format!("{out_dir:?} already exists"));
    }
    let conn = Connection::open_with_flags(mbtiles, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| format!("open {mbtiles:?}: {e}"))?;
    let stats = write_tile_tree(&conn, out_dir).map_err(|e| format!("{mbtiles:?}: {e}"))?;
    conn.close().map_err(|(_, e)| format!("close {mbtiles:?}: {e}"))?;

    if remove_source {
        fs::remove_file(mbtiles).map_err(|e| format!("remove {mbtiles:?}: {e}"))?;
    }
    Ok(stats)
}

fn write_tile_tree(conn: &Connection, out_dir: &Path) -> Result<ExtractStats, String> {
    let min_zoom = zoom_metadata(conn, "minzoom")?;
    let max_zoom = zoom_metadata(conn, "maxzoom")?;
    if min_zoom > max_zoom {
        return Err(format!("minzoom {min_zoom} is above maxzoom {max_zoom}"));
    }

    let mut stmt = conn
        .prepare(
            "SELECT zoom_level, tile_column, tile_row, tile_data FROM tiles \
             WHERE zoom_level BETWEEN ?1 AND ?2 \
             ORDER BY zoom_level, tile_column, tile_row",
        )
        .map_err(|e| format!("tiles: {e}"))?;
    let rows = stmt
        .query_map([min_zoom, max_zoom], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })
        .map_err(|e| format!("tiles: {e}"))?;

    let mut stats = ExtractStats {
        min_zoom,
        max_zoom,
        tiles: 0,
        compressed: 0,
    };
    for row in rows {
        let (z, x, tms_row, data) = row.map_err(|e| format!("tiles: {e}"))?;
        let coord = TileCoord::from_tms(z, x, tms_row)
            .ok_or_else(|| format!("tile {z}/{x}/{tms_row} is outside the zoom level"))?;
        let dir = out_dir.join(coord.z.to_string()).join(coord.x.to_string());
        fs::create_dir_all(&dir).map_err(|e| format!("create {dir:?}: {e}"))?;
        let path = dir.join(format!("{}.pbf", coord.y));
        fs::write(&path, &data).map_err(|e| format!("write {path:?}: {e}"))?;

        stats.tiles += 1;
        if data.starts_with(&[0x1f, 0x8b]) {
            stats.compressed += 1;
        }
    }
    Ok(stats)
}

fn zoom_metadata(conn: &Connection, name: &str) -> Result<u32, String> {
    let value: Option<String> = conn
        .query_row(
            "SELECT CAST(value AS TEXT) FROM metadata WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| format!("metadata: {e}"))?;
    let value = value.ok_or_else(|| format!("no {name} in metadata"))?;
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|z| *z < 32)
        .ok_or_else(|| format!("invalid {name} {value:?}"))
}

/// Headless render of one selection, as JSON-friendly data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSummary {
    pub year: Year,
    pub glacier: Option<String>,
    /// `geojson` or the tile URL template the map is pointed at.
    pub source: String,
    pub highlighted: usize,
    pub camera: Option<Aabb2>,
    pub total_km2: f64,
    pub glacier_km2: Option<f64>,
    pub since_baseline: Change,
    pub since_previous: Option<Change>,
    /// Features the map layer draws for the year.
    pub features: usize,
    /// MapLibre paint properties for the glacier fill.
    pub paint: serde_json::Value,
    pub charts: [ChartFrame; 3],
}

/// Drives the viewer to `year` and `glacier` and reports what it drew.
pub async fn render(
    registry: DatasetRegistry,
    parse: ParseOptions,
    year: Option<Year>,
    glacier: Option<&str>,
) -> Result<RenderSummary, String> {
    let config = BinderConfig {
        parse,
        ..BinderConfig::default()
    };
    let binder = RenderBinder::new(
        registry,
        config,
        VectorLayer::new(1, LayerStyle::default()),
        ChartPanels::<RecordingPanel>::default(),
    );
    let mut viewer = Viewer::new(FsSource, binder);
    viewer.start();
    if let Some(year) = year {
        if viewer.binder().registry().years().index_of(year).is_none() {
            return Err(format!("no dataset for {year}"));
        }
        viewer.dispatch(&ControlEvent::YearPicked(year));
    }
    if let Some(id) = glacier.and_then(EntityId::new) {
        viewer.dispatch(&ControlEvent::EntityPicked(id));
    }
    viewer.settle().await;

    let binder = viewer.into_binder();
    let frame = binder
        .last_frame()
        .ok_or_else(|| "nothing rendered (see log for failed loads)".to_string())?;
    if frame.selection != binder.selection().snapshot() {
        return Err(format!("selection could not be rendered, last frame is {}", frame.year));
    }

    Ok(RenderSummary {
        year: frame.year,
        glacier: frame.selection.entity.as_ref().map(|e| e.to_string()),
        source: match &frame.source {
            LayerSource::GeoJson { .. } => "geojson".to_string(),
            LayerSource::Tiles { template, .. } => template.clone(),
        },
        highlighted: frame.highlighted.len(),
        camera: binder.layer().camera(),
        total_km2: frame.total_km2,
        glacier_km2: frame.entity_km2,
        since_baseline: frame.since_baseline,
        since_previous: frame.since_previous,
        features: binder.layer().rendered_features().len(),
        paint: binder.layer().style().to_paint(),
        charts: [frame.stacked.clone(), frame.ranked.clone(), frame.rates.clone()],
    })
}
