use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::identity::password::PBKDF2_ITERATIONS;

/// Application-level constants
pub const APP_NAME: &str = "Clínica SIC";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Printed at the top of every clinical document.
pub const CLINIC_NAME: &str = "Clínica SIC";
pub const CLINIC_ADDRESS: &str = "Dirección de la Clínica, Cancún, Q.Roo";

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Tracing filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "clinica_lib=info,clinica_sic=info,tower_http=warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine home directory; set CLINICA_DB_PATH and CLINICA_PHOTOS_DIR")]
    NoHomeDir,

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("{0} requires {1} to be set as well")]
    Incomplete(&'static str, &'static str),
}

/// Get the application data directory
/// ~/ClinicaSIC/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join("ClinicaSIC"))
}

/// Credentials of the administrator seeded into an empty user table.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub photos_dir: PathBuf,
    pub password_iterations: u32,
    pub admin: Option<BootstrapAdmin>,
}

impl ServerConfig {
    /// Read `CLINICA_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Build from any key lookup; unset keys fall back to defaults under
    /// [`app_data_dir`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_text = lookup("CLINICA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_text.parse().map_err(|_| ConfigError::Invalid {
            key: "CLINICA_BIND",
            value: bind_text.clone(),
        })?;

        let db_path = match lookup("CLINICA_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()?.join("clinica.db"),
        };
        let photos_dir = match lookup("CLINICA_PHOTOS_DIR") {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()?.join("fotos"),
        };

        let password_iterations = match lookup("CLINICA_PASSWORD_ITERATIONS") {
            Some(text) => text
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    key: "CLINICA_PASSWORD_ITERATIONS",
                    value: text,
                })?,
            None => PBKDF2_ITERATIONS,
        };

        let admin = match (lookup("CLINICA_ADMIN_LOGIN"), lookup("CLINICA_ADMIN_PASSWORD")) {
            (Some(login), Some(password)) => Some(BootstrapAdmin { login, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Incomplete("CLINICA_ADMIN_LOGIN", "CLINICA_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("CLINICA_ADMIN_PASSWORD", "CLINICA_ADMIN_LOGIN")),
        };

        Ok(Self {
            bind,
            db_path,
            photos_dir,
            password_iterations,
            admin,
        })
    }
}
