use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    pub id_foto: i64,
    pub id_procedimiento: i64,
    /// Where clients fetch the image bytes.
    pub url: String,
    pub description: String,
    pub created_at: String,
    #[serde(skip)]
    pub file_name: String,
}

impl PhotoAttachment {
    pub fn url_for(id_foto: i64) -> String {
        format!("/api/fotos/{id_foto}")
    }
}
