//! Shared application state.
//!
//! `CoreState` is wrapped in `Arc` at startup and handed to the HTTP layer.
//! It owns no connection: each request opens its own. The session table is
//! the only mutable in-memory state, behind an `RwLock` so token checks
//! (every request) don't block each other.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::ServerConfig;
use crate::db::{self, DatabaseError};
use crate::identity::{self, IdentityError, SessionStore};
use crate::models::User;
use crate::photos::{PhotoError, PhotoStore};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    db_path: PathBuf,
    photos: PhotoStore,
    sessions: RwLock<SessionStore>,
    /// PBKDF2 work factor for newly set passwords.
    pub password_iterations: u32,
}

impl CoreState {
    pub fn new(db_path: impl Into<PathBuf>, photos: PhotoStore, password_iterations: u32) -> Self {
        Self {
            db_path: db_path.into(),
            photos,
            sessions: RwLock::new(SessionStore::new()),
            password_iterations,
        }
    }

    /// Prepare storage from configuration: create directories, migrate the
    /// schema and seed the bootstrap admin if the user table is empty.
    pub fn initialize(config: &ServerConfig) -> Result<Self, CoreError> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::Storage(e.to_string()))?;
        }
        let photos = PhotoStore::open(&config.photos_dir)?;
        let state = Self::new(&config.db_path, photos, config.password_iterations);

        let conn = state.open_db()?;
        if let Some(admin) = &config.admin {
            identity::bootstrap_admin(&conn, &admin.login, &admin.password, state.password_iterations)?;
        } else if crate::db::repository::count_users(&conn)? == 0 {
            tracing::warn!("No users exist; set CLINICA_ADMIN_LOGIN and CLINICA_ADMIN_PASSWORD to seed one");
        }
        tracing::info!(db = %config.db_path.display(), photos = %config.photos_dir.display(), "Storage ready");
        Ok(state)
    }

    /// Open a database connection (migrated, foreign keys on).
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    // ── Sessions ────────────────────────────────────────────

    fn read_sessions(&self) -> Result<RwLockReadGuard<'_, SessionStore>, CoreError> {
        self.sessions.read().map_err(|_| CoreError::LockPoisoned)
    }

    fn write_sessions(&self) -> Result<RwLockWriteGuard<'_, SessionStore>, CoreError> {
        self.sessions.write().map_err(|_| CoreError::LockPoisoned)
    }

    /// Start a session for an authenticated user; returns the bearer token.
    pub fn sign_in(&self, user: User) -> Result<String, CoreError> {
        let login = user.login.clone();
        let token = self.write_sessions()?.issue(user);
        tracing::info!(login = %login, "Session opened");
        Ok(token)
    }

    /// The user behind a bearer token, if the session is live.
    pub fn resolve_session(&self, token: &str) -> Result<Option<User>, CoreError> {
        Ok(self.read_sessions()?.resolve(token).cloned())
    }

    pub fn sign_out(&self, token: &str) -> Result<bool, CoreError> {
        Ok(self.write_sessions()?.revoke(token))
    }

    /// Push an edited user's new profile into their open sessions.
    pub fn refresh_user(&self, user: &User) -> Result<(), CoreError> {
        self.write_sessions()?.refresh_user(user);
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.read_sessions().map(|s| s.len()).unwrap_or(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Photo store error: {0}")]
    Photos(#[from] PhotoError),
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapAdmin;
    use crate::models::Role;

    fn config(dir: &Path, admin: Option<BootstrapAdmin>) -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            db_path: dir.join("datos").join("clinica.db"),
            photos_dir: dir.join("fotos"),
            password_iterations: 1000,
            admin,
        }
    }

    fn user(login: &str) -> User {
        User {
            id_usuario: 7,
            login: login.into(),
            email: String::new(),
            nombre: "Rosa".into(),
            apellido: "Luna".into(),
            telefono: String::new(),
            privilegios: Role::Enfermeria,
            id_hospital: 1,
        }
    }

    #[test]
    fn initialize_creates_storage_and_admin() {
        let dir = tempfile::tempdir().unwrap();
        let admin = BootstrapAdmin {
            login: "admin".into(),
            password: "secreto-inicial".into(),
        };
        let state = CoreState::initialize(&config(dir.path(), Some(admin))).unwrap();

        assert!(state.db_path().exists());
        assert!(state.photos().dir().is_dir());
        let conn = state.open_db().unwrap();
        let admin = identity::authenticate(&conn, "admin", "secreto-inicial").unwrap();
        assert_eq!(admin.privilegios, Role::Admin);
    }

    #[test]
    fn initialize_twice_keeps_existing_users() {
        let dir = tempfile::tempdir().unwrap();
        let first = BootstrapAdmin {
            login: "admin".into(),
            password: "uno".into(),
        };
        CoreState::initialize(&config(dir.path(), Some(first))).unwrap();
        let second = BootstrapAdmin {
            login: "otro".into(),
            password: "dos".into(),
        };
        let state = CoreState::initialize(&config(dir.path(), Some(second))).unwrap();
        let conn = state.open_db().unwrap();
        assert_eq!(crate::db::repository::count_users(&conn).unwrap(), 1);
    }

    #[test]
    fn session_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let state = CoreState::initialize(&config(dir.path(), None)).unwrap();

        let token = state.sign_in(user("rluna")).unwrap();
        assert_eq!(state.session_count(), 1);
        assert_eq!(state.resolve_session(&token).unwrap().unwrap().login, "rluna");
        assert!(state.resolve_session("bogus").unwrap().is_none());

        let mut renamed = user("rluna");
        renamed.apellido = "Sol".into();
        state.refresh_user(&renamed).unwrap();
        assert_eq!(state.resolve_session(&token).unwrap().unwrap().apellido, "Sol");

        assert!(state.sign_out(&token).unwrap());
        assert!(!state.sign_out(&token).unwrap());
        assert!(state.resolve_session(&token).unwrap().is_none());
    }
}
