//! File search backend for `/find`.
//!
//! The index is built once by walking the configured roots; queries only
//! filter the in-memory list, so typing stays responsive.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use walkdir::WalkDir;

use crate::error::KueResult;
use crate::model::{FileKind, GeometryKind, SearchHit};
use crate::paths;

pub trait SearchBackend {
    fn search(&self, query: &str) -> KueResult<Vec<SearchHit>>;
}

#[derive(Debug, Clone)]
struct IndexedFile {
    path: PathBuf,
    name_lower: String,
    accessed: Option<SystemTime>,
    file_kind: FileKind,
    geometry_kind: GeometryKind,
    location: String,
}

#[derive(Debug, Default)]
pub struct FileIndex {
    files: Vec<IndexedFile>,
    max_results: usize,
}

/// Vector or raster, judged by extension. `None` for files we don't list.
pub fn classify(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "shp" => Some(FileKind::Vector),
        "tif" | "tiff" => Some(FileKind::Raster),
        _ => None,
    }
}

/// Shape type from a `.shp` header (little-endian i32 at byte 32).
pub fn shapefile_geometry(path: &Path) -> GeometryKind {
    let mut header = [0u8; 36];
    let read = File::open(path).and_then(|mut f| f.read_exact(&mut header));
    if let Err(e) = read {
        tracing::debug!(path = %path.display(), error = %e, "unreadable shapefile header");
        return GeometryKind::Other;
    }
    let shape_type = i32::from_le_bytes([header[32], header[33], header[34], header[35]]);
    match shape_type {
        1 | 8 | 11 | 18 | 21 | 28 => GeometryKind::Point,
        3 | 13 | 23 => GeometryKind::LineString,
        5 | 15 | 25 => GeometryKind::Polygon,
        _ => GeometryKind::Other,
    }
}

pub fn format_access_time(time: Option<SystemTime>) -> String {
    match time {
        Some(t) => DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string(),
        None => "unknown".to_string(),
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

impl FileIndex {
    pub fn build(roots: &[PathBuf], max_depth: usize, max_results: usize, home: Option<&Path>) -> Self {
        let mut files = Vec::new();

        for root in roots {
            let location = match home {
                Some(home) => paths::canonicalize_home(root, home),
                None => root.display().to_string(),
            };

            let walker = WalkDir::new(root)
                .max_depth(max_depth)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !is_hidden(e));

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(file_kind) = classify(entry.path()) else {
                    continue;
                };

                let geometry_kind = match file_kind {
                    FileKind::Vector => shapefile_geometry(entry.path()),
                    FileKind::Raster => GeometryKind::Other,
                };
                let accessed = entry.metadata().ok().and_then(|m| m.accessed().ok());

                files.push(IndexedFile {
                    path: entry.path().to_path_buf(),
                    name_lower: entry.file_name().to_string_lossy().to_lowercase(),
                    accessed,
                    file_kind,
                    geometry_kind,
                    location: location.clone(),
                });
            }
        }

        tracing::info!(roots = roots.len(), files = files.len(), "file index built");
        Self::from_files(files, max_results)
    }

    fn from_files(mut files: Vec<IndexedFile>, max_results: usize) -> Self {
        // Most recently accessed first; files without a time sink to the end.
        files.sort_by(|a, b| b.accessed.cmp(&a.accessed));
        Self { files, max_results }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SearchBackend for FileIndex {
    fn search(&self, query: &str) -> KueResult<Vec<SearchHit>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .files
            .iter()
            .filter(|f| f.name_lower.contains(&needle))
            .take(self.max_results)
            .map(|f| SearchHit {
                path: f.path.clone(),
                access_time: format_access_time(f.accessed),
                file_kind: f.file_kind,
                geometry_kind: f.geometry_kind,
                location: f.location.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_shapefile(path: &Path, shape_type: i32) {
        let mut header = vec![0u8; 100];
        header[32..36].copy_from_slice(&shape_type.to_le_bytes());
        fs::write(path, header).unwrap();
    }

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        write_shapefile(&data.join("lakes.shp"), 5);
        write_shapefile(&data.join("wells.shp"), 1);
        write_shapefile(&data.join("Rivers.SHP"), 3);
        fs::write(data.join("dem.tif"), b"II*\0").unwrap();
        fs::write(data.join("notes.txt"), b"not gis").unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        write_shapefile(&dir.path().join(".cache").join("lakes_old.shp"), 5);
        dir
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Path::new("a.shp")), Some(FileKind::Vector));
        assert_eq!(classify(Path::new("a.TIFF")), Some(FileKind::Raster));
        assert_eq!(classify(Path::new("a.gpkg")), None);
        assert_eq!(classify(Path::new("README")), None);
    }

    #[test]
    fn test_shapefile_geometry() {
        let dir = TempDir::new().unwrap();
        let cases = [
            (1, GeometryKind::Point),
            (13, GeometryKind::LineString),
            (25, GeometryKind::Polygon),
            (31, GeometryKind::Other),
        ];
        for (shape_type, expected) in cases {
            let path = dir.path().join(format!("t{shape_type}.shp"));
            write_shapefile(&path, shape_type);
            assert_eq!(shapefile_geometry(&path), expected);
        }

        let short = dir.path().join("short.shp");
        fs::write(&short, b"tiny").unwrap();
        assert_eq!(shapefile_geometry(&short), GeometryKind::Other);
        assert_eq!(shapefile_geometry(&dir.path().join("missing.shp")), GeometryKind::Other);
    }

    #[test]
    fn test_build_skips_hidden_and_unknown() {
        let dir = sample_tree();
        let index = FileIndex::build(&[dir.path().to_path_buf()], 8, 50, None);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_search_matches_case_insensitively() {
        let dir = sample_tree();
        let index = FileIndex::build(&[dir.path().to_path_buf()], 8, 50, None);

        let hits = index.search("LAKES").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, dir.path().join("data").join("lakes.shp"));
        assert_eq!(hits[0].file_kind, FileKind::Vector);
        assert_eq!(hits[0].geometry_kind, GeometryKind::Polygon);
        assert_eq!(hits[0].location, dir.path().display().to_string());

        let rivers = index.search("rivers").unwrap();
        assert_eq!(rivers[0].geometry_kind, GeometryKind::LineString);

        let rasters = index.search(".tif").unwrap();
        assert_eq!(rasters.len(), 1);
        assert_eq!(rasters[0].file_kind, FileKind::Raster);
    }

    #[test]
    fn test_empty_query_and_no_match() {
        let dir = sample_tree();
        let index = FileIndex::build(&[dir.path().to_path_buf()], 8, 50, None);
        assert!(index.search("").unwrap().is_empty());
        assert!(index.search("   ").unwrap().is_empty());
        assert!(index.search("nothing-like-this").unwrap().is_empty());
    }

    #[test]
    fn test_location_is_home_relative() {
        let dir = sample_tree();
        let index = FileIndex::build(&[dir.path().join("data")], 8, 50, Some(dir.path()));
        let hits = index.search("wells").unwrap();
        assert_eq!(hits[0].location, "~/data");
    }

    #[test]
    fn test_recent_first_and_capped() {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let file = |name: &str, secs: Option<u64>| IndexedFile {
            path: PathBuf::from(format!("/gis/{name}")),
            name_lower: name.to_lowercase(),
            accessed: secs.map(|s| base + Duration::from_secs(s)),
            file_kind: FileKind::Vector,
            geometry_kind: GeometryKind::Point,
            location: "/gis".to_string(),
        };
        let index = FileIndex::from_files(
            vec![
                file("roads_a.shp", Some(10)),
                file("roads_b.shp", None),
                file("roads_c.shp", Some(30)),
                file("roads_d.shp", Some(20)),
            ],
            3,
        );

        let names: Vec<_> = index
            .search("roads")
            .unwrap()
            .into_iter()
            .map(|h| h.path)
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("/gis/roads_c.shp"),
                PathBuf::from("/gis/roads_d.shp"),
                PathBuf::from("/gis/roads_a.shp"),
            ]
        );
    }

    #[test]
    fn test_unknown_access_time() {
        assert_eq!(format_access_time(None), "unknown");
    }
}
