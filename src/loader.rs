//! Fetching the read-only JSON documents the session starts from.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::FeatureCollection;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{location} is not valid JSON: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where documents come from. Locations are the strings stored in the
/// documents themselves, e.g. `./data/lotes-SEC-001.geojson`.
pub trait DocumentSource {
    fn fetch(&self, location: &str) -> Result<String, LoadError>;
}

/// Resolves locations against a data root on disk.
#[derive(Clone, Debug)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, location: &str) -> PathBuf {
        let trimmed = location.trim_start_matches("./");
        let path = Path::new(trimmed);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl DocumentSource for FsSource {
    fn fetch(&self, location: &str) -> Result<String, LoadError> {
        std::fs::read_to_string(self.resolve(location)).map_err(|source| LoadError::Io {
            location: location.to_string(),
            source,
        })
    }
}

pub fn load_json<T: DeserializeOwned>(
    source: &impl DocumentSource,
    location: &str,
) -> Result<T, LoadError> {
    let text = source.fetch(location)?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        location: location.to_string(),
        source,
    })
}

/// Like [`load_json`], but a failure is logged and replaced by the default.
pub fn load_or_default<T: DeserializeOwned + Default>(
    source: &impl DocumentSource,
    location: &str,
) -> T {
    load_json(source, location).unwrap_or_else(|err| {
        log::warn!("{err}; continuing with empty data");
        T::default()
    })
}

pub fn load_collection(source: &impl DocumentSource, location: &str) -> FeatureCollection {
    let collection: FeatureCollection = load_or_default(source, location);
    log::info!("{location}: {} features", collection.len());
    collection
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LotCatalog;

    #[test]
    fn reads_relative_locations_under_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data/secciones.geojson"),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]},
                 "properties":{"id":"SEC-001","lotesFile":"./data/lotes-SEC-001.geojson"}}]}"#,
        )
        .unwrap();
        let source = FsSource::new(dir.path());
        let collection = load_collection(&source, "./data/secciones.geojson");
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::new(dir.path());
        assert!(matches!(
            load_json::<FeatureCollection>(&source, "./data/nope.geojson"),
            Err(LoadError::Io { .. })
        ));
        assert!(load_collection(&source, "./data/nope.geojson").is_empty());
    }

    #[test]
    fn invalid_json_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lotes.json"), "{ not json").unwrap();
        let source = FsSource::new(dir.path());
        assert!(matches!(
            load_json::<LotCatalog>(&source, "lotes.json"),
            Err(LoadError::Parse { .. })
        ));
        let catalog: LotCatalog = load_or_default(&source, "lotes.json");
        assert!(catalog.is_empty());
    }

    #[test]
    fn memory_source_serves_registered_text() {
        let source = memory::MemorySource::default().with("a.json", "{}");
        assert!(load_collection(&source, "a.json").is_empty());
        assert!(source.fetch("b.json").is_err());
    }
}
