pub mod image_io;
pub mod ser;
pub mod tiff_stack;

use std::path::{Path, PathBuf};

use crate::consts::{SER_EXTENSION, TIFF_EXTENSIONS};
use crate::error::{DelayMapError, Result};
use crate::movie::Movie;

use self::ser::SerReader;
use self::tiff_stack::TiffStack;

/// A multi-frame recording on disk that can be loaded as a [`Movie`].
pub trait MovieSource {
    /// Name used in logs and error messages.
    fn label(&self) -> String;

    fn frame_count(&self) -> usize;

    /// Spatial shape (height, width).
    fn frame_shape(&self) -> (usize, usize);

    /// Decode every frame into memory.
    fn read_movie(&self) -> Result<Movie>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Tiff,
    Ser,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if TIFF_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Tiff)
        } else if ext == SER_EXTENSION {
            Some(Self::Ser)
        } else {
            None
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tiff => write!(f, "TIFF stack"),
            Self::Ser => write!(f, "SER"),
        }
    }
}

/// Open a recording, choosing the reader from the file extension.
pub fn open_source(path: &Path) -> Result<Box<dyn MovieSource>> {
    match InputFormat::from_path(path) {
        Some(InputFormat::Tiff) => Ok(Box::new(TiffStack::open(path)?)),
        Some(InputFormat::Ser) => Ok(Box::new(SerReader::open(path)?)),
        None => Err(DelayMapError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load a whole recording into memory.
pub fn open_movie(path: &Path) -> Result<Movie> {
    open_source(path)?.read_movie()
}

/// Resolve the segment list: directories expand to the recordings they
/// contain, files are kept as given. The result is sorted so segment order,
/// and with it the choice of reference segment, is deterministic.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                let candidate = entry?.path();
                if candidate.is_file() && InputFormat::from_path(&candidate).is_some() {
                    found.push(candidate);
                }
            }
        } else if InputFormat::from_path(path).is_some() {
            found.push(path.clone());
        } else {
            return Err(DelayMapError::UnsupportedFormat(path.display().to_string()));
        }
    }

    found.sort();
    found.dedup();
    if found.is_empty() {
        return Err(DelayMapError::EmptyInputSet);
    }
    Ok(found)
}

pub(crate) fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
