//! Opening find results as map layers.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::delegate::find::OpenCallback;
use crate::error::{KueError, KueResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Vector,
    Raster,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLayer {
    pub name: String,
    pub path: PathBuf,
    pub kind: LayerKind,
}

/// Layers added during this session.
#[derive(Debug, Default)]
pub struct Project {
    layers: Vec<MapLayer>,
}

impl Project {
    pub fn add_layer(&mut self, layer: MapLayer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

pub type SharedProject = Rc<RefCell<Project>>;

pub trait LayerLoader {
    fn load_vector(&self, path: &Path, name: &str) -> KueResult<()>;
    fn load_raster(&self, path: &Path, name: &str) -> KueResult<()>;
}

/// Registers layers into a [`Project`] after checking the file is there.
pub struct ProjectLoader {
    project: SharedProject,
}

impl ProjectLoader {
    pub fn new(project: SharedProject) -> Self {
        Self { project }
    }

    fn register(&self, path: &Path, name: &str, kind: LayerKind) -> KueResult<()> {
        let metadata = std::fs::metadata(path).map_err(|e| KueError::backend("layer loader", e))?;
        if !metadata.is_file() {
            return Err(KueError::backend(
                "layer loader",
                format!("{} is not a file", path.display()),
            ));
        }

        self.project.borrow_mut().add_layer(MapLayer {
            name: name.to_string(),
            path: path.to_path_buf(),
            kind,
        });
        tracing::info!(layer = name, kind = ?kind, path = %path.display(), "layer added to project");
        Ok(())
    }
}

impl LayerLoader for ProjectLoader {
    fn load_vector(&self, path: &Path, name: &str) -> KueResult<()> {
        self.register(path, name, LayerKind::Vector)
    }

    fn load_raster(&self, path: &Path, name: &str) -> KueResult<()> {
        self.register(path, name, LayerKind::Raster)
    }
}

/// Picks the loader entry point from the file extension.
pub struct LayerDispatch {
    loader: Box<dyn LayerLoader>,
}

impl LayerDispatch {
    pub fn new(loader: Box<dyn LayerLoader>) -> Self {
        Self { loader }
    }
}

/// Layer name shown in the project: the file name without its extension.
pub fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl OpenCallback for LayerDispatch {
    fn open(&self, path: &Path) -> KueResult<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let name = layer_name(path);

        match ext.as_deref() {
            Some("shp") => self.loader.load_vector(path, &name),
            Some("tif") | Some("tiff") => self.loader.load_raster(path, &name),
            _ => {
                tracing::warn!(path = %path.display(), "no layer loader for this file type");
                Err(KueError::UnsupportedFormat(path.display().to_string()))
            }
        }
    }
}
