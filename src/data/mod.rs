use geojson::{GeoJson, Geometry, Value};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use thiserror::Error;

use crate::map::{GlobeSurface, LineString};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed location data in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },
    #[error("malformed GeoJSON in {}: {source}", .path.display())]
    Geojson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },
}

/// One record of the location dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "location_name", alias = "name")]
    pub name: String,
    #[serde(rename = "branch_url", alias = "url")]
    pub url: String,
    pub area: f64,
}

/// Pending background load of the location dataset
pub type PendingLocations = Receiver<Result<Vec<LocationRecord>, LoadError>>;

/// Read and parse a location dataset (a JSON array of records)
pub fn load_locations(path: &Path) -> Result<Vec<LocationRecord>, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    simd_json::serde::from_slice(&mut bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the dataset on a worker thread. The result arrives once on the
/// returned channel; the caller polls it without blocking.
pub fn spawn_location_load(path: PathBuf) -> PendingLocations {
    let (tx, rx) = mpsc::channel();
    rayon::spawn(move || {
        log::debug!("loading locations from {}", path.display());
        // Receiver gone means the app already quit
        let _ = tx.send(load_locations(&path));
    });
    rx
}

/// Load coastline polylines from a GeoJSON file onto the globe surface.
/// Returns the number of lines added.
pub fn load_coastlines(surface: &mut GlobeSurface, path: &Path) -> Result<usize, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson = content.parse().map_err(|source| LoadError::Geojson {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    let before = surface.coastline_count();
    process_geojson_lines(&geojson, |line| surface.add_coastline(line));
    Ok(surface.coastline_count() - before)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    let to_line = |coords: &[Vec<f64>]| -> LineString {
        coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
    };

    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|coords| add_line(to_line(coords))),
        // Only exterior rings trace the coast
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_line(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_line(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const LOCATIONS: &str = r#"[
        {"latitude": 51.5, "longitude": -0.1, "location_name": "London",
         "branch_url": "https://example.com/london", "area": 1500, "extra": true},
        {"latitude": -33.9, "longitude": 151.2, "name": "Sydney",
         "url": "https://example.com/sydney", "area": 12.5}
    ]"#;

    #[test]
    fn test_load_locations() {
        let file = write_temp(LOCATIONS);
        let records = load_locations(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "London");
        assert_eq!(records[0].url, "https://example.com/london");
        assert_eq!(records[0].area, 1500.0);
        assert_eq!(records[1].name, "Sydney");
        assert_eq!(records[1].latitude, -33.9);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_locations(Path::new("/nonexistent/locations.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let file = write_temp(r#"[{"latitude": 1.0, "longitude": "#);
        let err = load_locations(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));

        // Missing required field
        let file = write_temp(r#"[{"latitude": 1.0, "longitude": 2.0}]"#);
        assert!(matches!(load_locations(file.path()), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn test_spawned_load_delivers_result() {
        let file = write_temp(LOCATIONS);
        let rx = spawn_location_load(file.path().to_path_buf());
        let records = rx.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_coastlines() {
        let file = write_temp(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 5], [20, 0]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                    [[[5, 5], [6, 5], [6, 6], [5, 5]]]
                 ]}}
            ]}"#,
        );
        let mut surface = GlobeSurface::new();
        assert_eq!(load_coastlines(&mut surface, file.path()).unwrap(), 3);
    }

    #[test]
    fn test_bad_geojson() {
        let file = write_temp("{\"type\": \"Nope\"}");
        let mut surface = GlobeSurface::new();
        assert!(matches!(
            load_coastlines(&mut surface, file.path()),
            Err(LoadError::Geojson { .. })
        ));
    }
}
