use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use formats::normalize::{LEGACY_ID_FIELD, NORMALIZED_ID_FIELD};
use formats::{DatasetRegistry, ParseOptions, TileCoord, expand_template};
use foundation::Year;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Glacier retreat dataset tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-year total area and change
    Report {
        /// Registry manifest (datasets.json)
        #[arg(long)]
        manifest: PathBuf,

        #[command(flatten)]
        parse: ParseArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Scan a directory of yearly GeoJSON files and write a manifest
    Manifest {
        dir: PathBuf,

        /// Output file (default: <dir>/datasets.json)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Tile URL template; `{year}` is replaced per dataset
        #[arg(long)]
        tiles_template: Option<String>,
    },

    /// Copy legacy glacier ids to the normalised property name
    NormalizeIds {
        dir: PathBuf,

        #[arg(long, default_value = LEGACY_ID_FIELD)]
        from: String,

        #[arg(long, default_value = NORMALIZED_ID_FIELD)]
        to: String,
    },

    /// Expand a tile URL template for one tile
    TilePath {
        template: String,
        z: u32,
        x: u32,
        y: u32,
    },

    /// Unpack an .mbtiles file into a {z}/{x}/{y}.pbf directory
    ExtractTiles {
        file: PathBuf,

        /// Output directory (default: the file name without extension, next to it)
        out_dir: Option<PathBuf>,

        /// Keep the .mbtiles file after extracting
        #[arg(long)]
        keep_source: bool,
    },

    /// Render one selection headless and print it as JSON
    Render {
        #[arg(long)]
        manifest: PathBuf,

        #[arg(long)]
        year: Option<i32>,

        /// Glacier id to select
        #[arg(long)]
        glacier: Option<String>,

        #[command(flatten)]
        parse: ParseArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ParseArgs {
    /// Property holding the glacier id; repeat to try several in order
    #[arg(long = "id-field")]
    id_fields: Vec<String>,

    /// Numeric property holding the area in km² (default: computed from geometry)
    #[arg(long)]
    area_field: Option<String>,
}

impl ParseArgs {
    fn options(self) -> ParseOptions {
        let defaults = ParseOptions::default();
        ParseOptions {
            id_fields: if self.id_fields.is_empty() {
                defaults.id_fields
            } else {
                self.id_fields
            },
            area_field: self.area_field,
        }
    }
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
    match Args::parse().command {
        Command::Report {
            manifest,
            parse,
            json,
        } => {
            let registry = load_registry(&manifest)?;
            let rows = tools::build_report(&registry, &parse.options())?;
            if json {
                let payload = serde_json::to_string_pretty(&rows).map_err(|e| format!("json: {e}"))?;
                println!("{payload}");
            } else {
                print!("{}", tools::format_report(&rows));
            }
            Ok(())
        }
        Command::Manifest {
            dir,
            out,
            tiles_template,
        } => {
            let path = tools::write_manifest(&dir, out.as_deref(), tiles_template.as_deref())?;
            eprintln!("wrote {}", path.display());
            Ok(())
        }
        Command::NormalizeIds { dir, from, to } => {
            let touched = tools::normalize_dir(&dir, &from, &to)?;
            for (path, n) in &touched {
                eprintln!("{}: {n} feature(s)", path.display());
            }
            eprintln!("rewrote {} file(s)", touched.len());
            Ok(())
        }
        Command::TilePath { template, z, x, y } => {
            let coord = TileCoord::new(z, x, y);
            if !coord.is_valid() {
                return Err(format!("tile {z}/{x}/{y} is outside the zoom level"));
            }
            println!("{}", expand_template(&template, coord));
            Ok(())
        }
        Command::ExtractTiles {
            file,
            out_dir,
            keep_source,
        } => {
            let out_dir = match out_dir {
                Some(dir) => dir,
                None => file.with_extension(""),
            };
            if out_dir == file {
                return Err(format!("cannot derive an output directory from {file:?}"));
            }
            let stats = tools::extract_tiles(&file, &out_dir, !keep_source)?;
            eprintln!(
                "wrote {} tile(s), zoom {}-{}, to {}",
                stats.tiles,
                stats.min_zoom,
                stats.max_zoom,
                out_dir.display()
            );
            if stats.compressed > 0 {
                eprintln!("note: {} tile(s) are gzip-compressed as stored", stats.compressed);
            }
            Ok(())
        }
        Command::Render {
            manifest,
            year,
            glacier,
            parse,
        } => {
            let registry = load_registry(&manifest)?;
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| format!("runtime: {e}"))?;
            let summary = rt.block_on(tools::render(
                registry,
                parse.options(),
                year.map(Year),
                glacier.as_deref(),
            ))?;
            let payload = serde_json::to_string_pretty(&summary).map_err(|e| format!("json: {e}"))?;
            println!("{payload}");
            Ok(())
        }
    }
}

fn load_registry(path: &Path) -> Result<DatasetRegistry, String> {
    DatasetRegistry::load(path).map_err(|e| format!("load {path:?}: {e}"))
}
