use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use foundation::{Year, YearSet, YearSetError};
use serde::{Deserialize, Serialize};

pub const REGISTRY_VERSION: &str = "1.0";
pub const REGISTRY_FILE_NAME: &str = "datasets.json";

/// On-disk form of the dataset registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistryManifest {
    pub version: String,
    pub datasets: Vec<DatasetEntry>,
}

/// Where the data for one survey year lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetEntry {
    pub year: Year,
    /// GeoJSON FeatureCollection with the glacier outlines; metrics are always
    /// computed from this file.
    pub features: PathBuf,
    /// Vector tile URL template (`{z}/{x}/{y}`) the map should draw instead of
    /// the GeoJSON, if the year has been tiled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<String>,
}

/// What the map layer should be pointed at for a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapSource<'a> {
    GeoJson(&'a Path),
    Tiles(&'a str),
}

impl DatasetEntry {
    pub fn map_source(&self) -> MapSource<'_> {
        match &self.tiles {
            Some(template) => MapSource::Tiles(template),
            None => MapSource::GeoJson(&self.features),
        }
    }
}

#[derive(Debug)]
pub enum RegistryError {
    UnknownYear(Year),
    DuplicateYear(Year),
    Years(YearSetError),
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    UnsupportedVersion(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::UnknownYear(y) => write!(f, "no dataset registered for year {y}"),
            RegistryError::DuplicateYear(y) => write!(f, "year {y} is registered more than once"),
            RegistryError::Years(e) => write!(f, "invalid registry years: {e}"),
            RegistryError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            RegistryError::Parse(e) => write!(f, "invalid registry manifest: {e}"),
            RegistryError::UnsupportedVersion(v) => {
                write!(f, "unsupported registry version {v} (expected {REGISTRY_VERSION})")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Fixed mapping from survey year to dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRegistry {
    years: YearSet,
    entries: BTreeMap<Year, DatasetEntry>,
}

impl DatasetRegistry {
    pub fn new(entries: impl IntoIterator<Item = DatasetEntry>) -> Result<Self, RegistryError> {
        let mut by_year: BTreeMap<Year, DatasetEntry> = BTreeMap::new();
        for entry in entries {
            let year = entry.year;
            if by_year.insert(year, entry).is_some() {
                return Err(RegistryError::DuplicateYear(year));
            }
        }
        let years = YearSet::new(by_year.keys().copied()).map_err(RegistryError::Years)?;
        Ok(Self {
            years,
            entries: by_year,
        })
    }

    pub fn from_manifest(manifest: RegistryManifest) -> Result<Self, RegistryError> {
        if manifest.version != REGISTRY_VERSION {
            return Err(RegistryError::UnsupportedVersion(manifest.version));
        }
        Self::new(manifest.datasets)
    }

    /// Loads a manifest file. Relative dataset paths are resolved against the
    /// manifest's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: RegistryManifest =
            serde_json::from_str(&payload).map_err(RegistryError::Parse)?;
        if let Some(base) = path.parent() {
            for entry in &mut manifest.datasets {
                if entry.features.is_relative() {
                    entry.features = base.join(&entry.features);
                }
            }
        }
        Self::from_manifest(manifest)
    }

    /// Builds a registry from `<year>.geojson` or `<name>_<year>.geojson` files.
    pub fn scan_dir(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        let read_dir = fs::read_dir(dir).map_err(|source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| RegistryError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("geojson") {
                continue;
            }
            let Some(year) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(year_from_stem)
            else {
                continue;
            };
            entries.push(DatasetEntry {
                year,
                features: path,
                tiles: None,
            });
        }
        Self::new(entries)
    }

    pub fn years(&self) -> &YearSet {
        &self.years
    }

    pub fn locate(&self, year: Year) -> Result<&DatasetEntry, RegistryError> {
        self.entries.get(&year).ok_or(RegistryError::UnknownYear(year))
    }

    pub fn entries(&self) -> impl Iterator<Item = &DatasetEntry> {
        self.entries.values()
    }

    pub fn to_manifest(&self) -> RegistryManifest {
        RegistryManifest {
            version: REGISTRY_VERSION.to_string(),
            datasets: self.entries.values().cloned().collect(),
        }
    }
}

fn year_from_stem(stem: &str) -> Option<Year> {
    let digits = stem.rsplit(['_', '-']).next()?;
    if digits.len() != 4 {
        return None;
    }
    digits.parse::<i32>().ok().map(Year)
}
