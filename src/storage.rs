// SPDX-License-Identifier: GPL-3.0-only

//! Photo folder management
//!
//! All photos live in one flat folder under the user's Pictures directory.
//! Entries are identified by their display name (file name without extension),
//! which is what the gallery hands back when the user asks for a deletion.

use crate::constants::{MAX_UNIQUE_NAME_ATTEMPTS, thumbnail};
use crate::errors::StorageError;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A file in the photo folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoEntry {
    pub path: PathBuf,
    /// File name without extension
    pub display_name: String,
    pub file_name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

/// Decoded thumbnail pixels (RGBA8)
#[derive(Clone)]
pub struct Thumbnail {
    pub rgba: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Thumbnail({}x{})", self.width, self.height)
    }
}

/// One gallery row: the file plus its thumbnail, if it could be decoded
#[derive(Debug, Clone)]
pub struct GalleryItem {
    pub entry: PhotoEntry,
    pub thumbnail: Option<Thumbnail>,
}

/// The output folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoLibrary {
    dir: PathBuf,
}

impl PhotoLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<Pictures>/<folder_name>`, using the XDG pictures dir when set
    pub fn in_pictures(folder_name: &str) -> Result<Self, StorageError> {
        let pictures = dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
            .ok_or(StorageError::NoPicturesDirectory)?;
        Ok(Self::new(pictures.join(folder_name)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the folder if it does not exist yet
    pub fn ensure(&self) -> Result<&Path, StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        debug!(path = %self.dir.display(), "Photo directory ready");
        Ok(&self.dir)
    }

    /// All regular files in the folder, ordered by display name
    pub fn list(&self) -> Result<Vec<PhotoEntry>, StorageError> {
        self.ensure()?;

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&self.dir)? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let Ok(metadata) = dir_entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let path = dir_entry.path();
            entries.push(PhotoEntry {
                display_name: display_name(&path),
                file_name: dir_entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Local>::from),
                path,
            });
        }

        entries.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        debug!(count = entries.len(), "Listed photo directory");
        Ok(entries)
    }

    /// Create a new, empty file named after `file_name`, uniquified on collision.
    ///
    /// Uses create-new semantics, so a name is never handed out twice even if
    /// another writer races us.
    pub fn create_unique(&self, file_name: &str) -> Result<(PathBuf, File), StorageError> {
        self.ensure()?;

        for attempt in 1..=MAX_UNIQUE_NAME_ATTEMPTS {
            let path = self.dir.join(unique_candidate(file_name, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    debug!(path = %path.display(), attempt, "Created photo file");
                    return Ok((path, file));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::Io(format!(
            "no free file name for {} after {} attempts",
            file_name, MAX_UNIQUE_NAME_ATTEMPTS
        )))
    }

    /// Delete every file whose display name is `name`.
    ///
    /// The folder is re-enumerated first; a name that no longer exists is not
    /// an error and simply deletes nothing.
    pub fn delete_by_display_name(&self, name: &str) -> Result<usize, StorageError> {
        let mut deleted = 0;
        for entry in self.list()?.into_iter().filter(|e| e.display_name == name) {
            match std::fs::remove_file(&entry.path) {
                Ok(()) => {
                    info!(path = %entry.path.display(), "Deleted photo");
                    deleted += 1;
                }
                // Removed out-of-band between listing and deletion
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        if deleted == 0 {
            debug!(name, "No photo with that name, nothing deleted");
        }
        Ok(deleted)
    }
}

/// File name without extension
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `photo.jpg` for the first attempt, then `photo (2).jpg`, `photo (3).jpg`, ...
pub fn unique_candidate(file_name: &str, attempt: u32) -> String {
    if attempt <= 1 {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{} ({}).{}", stem, attempt, ext.to_string_lossy()),
        None => format!("{} ({})", stem, attempt),
    }
}

/// Decode an image file into RGBA pixels that fit inside `max_size` x `max_size`
pub fn decode_thumbnail(path: &Path, max_size: u32) -> Result<Thumbnail, String> {
    let img = image::ImageReader::open(path)
        .map_err(|e| e.to_string())?
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())?;

    let rgba = img.thumbnail(max_size, max_size).to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Thumbnail {
        rgba: Arc::new(rgba.into_raw()),
        width,
        height,
    })
}

/// List the folder and decode one bounded thumbnail per file
pub async fn load_gallery(library: PhotoLibrary) -> Result<Vec<GalleryItem>, StorageError> {
    tokio::task::spawn_blocking(move || {
        let entries = library.list()?;
        let items = entries
            .into_iter()
            .map(|entry| {
                let thumbnail = match decode_thumbnail(&entry.path, thumbnail::DECODE_SIZE) {
                    Ok(thumb) => Some(thumb),
                    Err(e) => {
                        warn!(path = %entry.path.display(), error = %e, "Failed to decode thumbnail");
                        None
                    }
                };
                GalleryItem { entry, thumbnail }
            })
            .collect();
        Ok(items)
    })
    .await
    .map_err(|e| StorageError::Io(format!("Gallery task error: {}", e)))?
}

/// Delete by display name off the UI thread
pub async fn delete_photo(library: PhotoLibrary, name: String) -> Result<usize, StorageError> {
    tokio::task::spawn_blocking(move || library.delete_by_display_name(&name))
        .await
        .map_err(|e| StorageError::Io(format!("Delete task error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_names() {
        assert_eq!(unique_candidate("photo.jpg", 1), "photo.jpg");
        assert_eq!(unique_candidate("photo.jpg", 2), "photo (2).jpg");
        assert_eq!(unique_candidate("photo.jpg", 17), "photo (17).jpg");
        assert_eq!(unique_candidate("README", 3), "README (3)");
    }

    #[test]
    fn display_name_strips_extension_only() {
        assert_eq!(display_name(Path::new("/a/photo (2).jpg")), "photo (2)");
        assert_eq!(display_name(Path::new("/a/archive.tar.gz")), "archive.tar");
        assert_eq!(display_name(Path::new("/a/noext")), "noext");
    }
}
