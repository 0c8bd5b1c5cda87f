//! Photo attachments: image files on disk, one `fotos` row each.
//!
//! Attachments are append-only. A file and its row are committed together:
//! the image is staged in the photo directory, the row is inserted inside a
//! transaction, and the staged file is renamed into place before commit.
//! Files are removed only when their procedure is deleted.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::PhotoAttachment;

/// Largest accepted image.
pub const MAX_PHOTO_BYTES: usize = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("No image provided")]
    Empty,

    #[error("File is not a supported image (JPEG, PNG, GIF, WebP or HEIC)")]
    UnsupportedType,

    #[error("Image too large: {size} bytes (maximum {max})")]
    TooLarge { size: usize, max: usize },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Photo storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image type from magic bytes, as (mime, extension).
pub fn detect_image_type(bytes: &[u8]) -> Option<(&'static str, &'static str)> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(("image/jpeg", "jpg"));
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some(("image/png", "png"));
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(("image/gif", "gif"));
    }
    if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return Some(("image/webp", "webp"));
    }
    if bytes.len() >= 12 && bytes[4..8] == *b"ftyp" {
        let brand = &bytes[8..12];
        if brand == b"heic" || brand == b"heix" || brand == b"mif1" {
            return Some(("image/heic", "heic"));
        }
    }
    None
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Use `dir` for image files, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PhotoError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Attach an image to a procedure. `description` defaults to "".
    pub fn add(
        &self,
        conn: &Connection,
        procedure_id: i64,
        bytes: &[u8],
        description: Option<&str>,
    ) -> Result<PhotoAttachment, PhotoError> {
        if bytes.is_empty() {
            return Err(PhotoError::Empty);
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(PhotoError::TooLarge {
                size: bytes.len(),
                max: MAX_PHOTO_BYTES,
            });
        }
        let (mime, extension) = detect_image_type(bytes).ok_or(PhotoError::UnsupportedType)?;
        if !repository::procedure_exists(conn, procedure_id)? {
            return Err(DatabaseError::not_found("procedimiento", procedure_id).into());
        }

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;

        let file_name = format!("{}.{extension}", Uuid::new_v4());
        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
        let photo = repository::insert_photo(&tx, procedure_id, &file_name, description.unwrap_or(""))?;

        let path = self.path_of(&file_name);
        staged.persist(&path).map_err(|e| PhotoError::Io(e.error))?;
        if let Err(e) = tx.commit() {
            if let Err(io) = std::fs::remove_file(&path) {
                tracing::warn!(file = %file_name, error = %io, "Failed to remove orphaned photo");
            }
            return Err(DatabaseError::from(e).into());
        }

        tracing::info!(
            id_foto = photo.id_foto,
            id_procedimiento = procedure_id,
            size = bytes.len(),
            mime,
            "Photo attached"
        );
        Ok(photo)
    }

    /// Attachments of a procedure in append order.
    pub fn list(&self, conn: &Connection, procedure_id: i64) -> Result<Vec<PhotoAttachment>, PhotoError> {
        if !repository::procedure_exists(conn, procedure_id)? {
            return Err(DatabaseError::not_found("procedimiento", procedure_id).into());
        }
        Ok(repository::list_photos(conn, procedure_id)?)
    }

    /// Stored bytes of one photo and their content type.
    pub fn read(&self, conn: &Connection, photo_id: i64) -> Result<(PhotoAttachment, Vec<u8>, String), PhotoError> {
        let photo = repository::get_photo(conn, photo_id)?
            .ok_or_else(|| DatabaseError::not_found("foto", photo_id))?;
        let path = self.path_of(&photo.file_name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!(id_foto = photo_id, file = %photo.file_name, "Photo file missing");
                return Err(DatabaseError::not_found("foto", photo_id).into());
            }
            Err(e) => return Err(e.into()),
        };
        let mime = mime_guess::from_path(&path).first_or_octet_stream().to_string();
        Ok((photo, bytes, mime))
    }

    /// Remove files left behind by a deleted procedure. Missing files are
    /// ignored; other failures are logged and skipped.
    pub fn discard_files(&self, file_names: &[String]) {
        for name in file_names {
            match std::fs::remove_file(self.path_of(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove photo file"),
            }
        }
    }
}
