use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::PhotoAttachment;

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<PhotoAttachment> {
    let id_foto: i64 = row.get(0)?;
    Ok(PhotoAttachment {
        id_foto,
        id_procedimiento: row.get(1)?,
        url: PhotoAttachment::url_for(id_foto),
        file_name: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert_photo(
    conn: &Connection,
    procedure_id: i64,
    file_name: &str,
    description: &str,
) -> Result<PhotoAttachment, DatabaseError> {
    conn.execute(
        "INSERT INTO fotos (id_procedimiento, file_name, description) VALUES (?1, ?2, ?3)",
        params![procedure_id, file_name, description],
    )?;
    let id = conn.last_insert_rowid();
    get_photo(conn, id)?.ok_or_else(|| DatabaseError::not_found("foto", id))
}

pub fn get_photo(conn: &Connection, id: i64) -> Result<Option<PhotoAttachment>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id_foto, id_procedimiento, file_name, description, created_at FROM fotos WHERE id_foto = ?1",
            params![id],
            photo_from_row,
        )
        .optional()?)
}

/// Attachments of one procedure in append order.
pub fn list_photos(conn: &Connection, procedure_id: i64) -> Result<Vec<PhotoAttachment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id_foto, id_procedimiento, file_name, description, created_at
         FROM fotos WHERE id_procedimiento = ?1 ORDER BY id_foto",
    )?;
    let photos = stmt
        .query_map(params![procedure_id], photo_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(photos)
}

pub fn photo_files_for_procedure(conn: &Connection, procedure_id: i64) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT file_name FROM fotos WHERE id_procedimiento = ?1 ORDER BY id_foto")?;
    let files = stmt
        .query_map(params![procedure_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(files)
}
