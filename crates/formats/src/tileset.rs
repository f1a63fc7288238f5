/// Payload served for vector tiles that were never generated.
///
/// A zero-length protobuf is a valid Mapbox Vector Tile with no layers, so the
/// map renderer draws nothing instead of reporting an error.
pub const EMPTY_TILE: &[u8] = &[];

pub const VECTOR_TILE_CONTENT_TYPE: &str = "application/x-protobuf";

/// Tile extensions written by the tiling step (`ogr2ogr -f MVT` uses `pbf`).
pub const VECTOR_TILE_EXTENSIONS: [&str; 2] = ["pbf", "mvt"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Converts a TMS (bottom-origin) row, as stored in MBTiles, to the
    /// top-origin `y` used in tile URLs. `None` outside the grid.
    pub fn from_tms(z: u32, x: u32, tms_row: u32) -> Option<Self> {
        if z >= 32 {
            return None;
        }
        let n = 1u64 << z;
        let y = n.checked_sub(u64::from(tms_row) + 1)?;
        let coord = Self::new(z, x, u32::try_from(y).ok()?);
        coord.is_valid().then_some(coord)
    }

    /// `x`/`y` inside the `2^z` grid.
    pub fn is_valid(&self) -> bool {
        if self.z >= 32 {
            return false;
        }
        let n = 1u64 << self.z;
        u64::from(self.x) < n && u64::from(self.y) < n
    }
}

/// A request path recognised as a vector tile inside a tile directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePath<'a> {
    /// Everything before `{z}/{x}/{y}.ext`, without the trailing slash.
    pub tileset: &'a str,
    pub coord: TileCoord,
    pub extension: &'a str,
}

/// Recognises `<tileset>/<z>/<x>/<y>.<pbf|mvt>`.
pub fn parse_tile_path(path: &str) -> Option<TilePath<'_>> {
    let path = path.trim_start_matches('/');
    let mut parts = path.rsplitn(4, '/');
    let file = parts.next()?;
    let x = parts.next()?.parse::<u32>().ok()?;
    let z = parts.next()?.parse::<u32>().ok()?;
    let tileset = parts.next().unwrap_or("");

    let (y, extension) = file.rsplit_once('.')?;
    if !VECTOR_TILE_EXTENSIONS.contains(&extension) {
        return None;
    }
    let y = y.parse::<u32>().ok()?;

    Some(TilePath {
        tileset,
        coord: TileCoord::new(z, x, y),
        extension,
    })
}

/// Substitutes `{z}`, `{x}` and `{y}` in a tile URL template.
pub fn expand_template(template: &str, coord: TileCoord) -> String {
    template
        .replace("{z}", &coord.z.to_string())
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
}

#[cfg(test)]
mod tests {
    use super::{TileCoord, expand_template, parse_tile_path};

    #[test]
    fn tms_rows_flip_to_url_rows() {
        assert_eq!(TileCoord::from_tms(0, 0, 0), Some(TileCoord::new(0, 0, 0)));
        assert_eq!(TileCoord::from_tms(3, 2, 0), Some(TileCoord::new(3, 2, 7)));
        assert_eq!(TileCoord::from_tms(3, 2, 7), Some(TileCoord::new(3, 2, 0)));
        assert_eq!(TileCoord::from_tms(3, 2, 8), None);
        assert_eq!(TileCoord::from_tms(3, 8, 0), None);
        assert_eq!(TileCoord::from_tms(32, 0, 0), None);
    }

    #[test]
    fn recognises_tile_paths() {
        let p = parse_tile_path("/tiles/glaciers_1850/6/33/22.pbf").unwrap();
        assert_eq!(p.tileset, "tiles/glaciers_1850");
        assert_eq!(p.coord, TileCoord::new(6, 33, 22));
        assert_eq!(p.extension, "pbf");

        let bare = parse_tile_path("3/1/2.mvt").unwrap();
        assert_eq!(bare.tileset, "");
        assert_eq!(bare.coord, TileCoord::new(3, 1, 2));
    }

    #[test]
    fn ignores_non_tile_paths() {
        assert!(parse_tile_path("index.html").is_none());
        assert!(parse_tile_path("data/1850.geojson").is_none());
        assert!(parse_tile_path("tiles/6/33/22.png").is_none());
        assert!(parse_tile_path("tiles/six/33/22.pbf").is_none());
        assert!(parse_tile_path("tiles/6/33/abc.pbf").is_none());
    }

    #[test]
    fn template_expansion() {
        let url = expand_template("tiles/1850/{z}/{x}/{y}.pbf", TileCoord::new(7, 66, 45));
        assert_eq!(url, "tiles/1850/7/66/45.pbf");
    }

    #[test]
    fn coord_validity_follows_zoom_grid() {
        assert!(TileCoord::new(0, 0, 0).is_valid());
        assert!(!TileCoord::new(0, 1, 0).is_valid());
        assert!(TileCoord::new(12, 4095, 4095).is_valid());
        assert!(!TileCoord::new(40, 0, 0).is_valid());
    }
}
