//! Connection settings for the scheduler's administrative database.

use std::fmt;

use jobwatch_core::error::CoreError;
use tiberius::{AuthMethod, EncryptionLevel};

/// Default database: SQL Server Agent keeps its catalog in `msdb`.
pub const DEFAULT_DATABASE: &str = "msdb";

/// Default TCP port of a default SQL Server instance.
pub const DEFAULT_PORT: u16 = 1433;

const APPLICATION_NAME: &str = "jobwatch";

// ---------------------------------------------------------------------------
// ServerAddress
// ---------------------------------------------------------------------------

/// A parsed `SERVER=` value.
///
/// Accepts the forms SQL Server tooling accepts: `host`, `host,port`,
/// `host\INSTANCE`, each optionally prefixed with `tcp:`. `.` and `(local)`
/// mean the local machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: Option<u16>,
    pub instance: Option<String>,
}

impl ServerAddress {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let without_proto = trimmed
            .strip_prefix("tcp:")
            .or_else(|| trimmed.strip_prefix("TCP:"))
            .unwrap_or(trimmed);

        let (host_part, port) = match without_proto.split_once(',') {
            Some((host, port)) => {
                let port = port.trim().parse::<u16>().map_err(|_| {
                    CoreError::Validation(format!("Invalid port in server address '{raw}'"))
                })?;
                (host, Some(port))
            }
            None => (without_proto, None),
        };

        let (host, instance) = match host_part.split_once('\\') {
            Some((host, instance)) if !instance.trim().is_empty() => {
                (host.trim(), Some(instance.trim().to_string()))
            }
            Some((host, _)) => (host.trim(), None),
            None => (host_part.trim(), None),
        };

        if host.is_empty() {
            return Err(CoreError::Validation(format!(
                "Server address '{raw}' has no host"
            )));
        }

        let host = match host {
            "." | "(local)" => "localhost".to_string(),
            other => other.to_string(),
        };

        Ok(Self {
            host,
            port,
            instance,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp:{}", self.host)?;
        if let Some(instance) = &self.instance {
            write!(f, "\\{instance}")?;
        }
        if let Some(port) = self.port {
            write!(f, ",{port}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// How to reach and authenticate against SQL Server.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub server: ServerAddress,
    pub database: String,
    /// SQL login. `None` selects integrated (Windows) authentication.
    pub user: Option<String>,
    pub password: Option<String>,
    pub encrypt: bool,
    pub trust_cert: bool,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("encrypt", &self.encrypt)
            .field("trust_cert", &self.trust_cert)
            .finish()
    }
}

impl ConnectionConfig {
    /// Integrated authentication against `msdb`, encrypted, trusting the
    /// server certificate.
    pub fn new(server: ServerAddress) -> Self {
        Self {
            server,
            database: DEFAULT_DATABASE.to_string(),
            user: None,
            password: None,
            encrypt: true,
            trust_cert: true,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable                  | Required | Default                  |
    /// |---------------------------|----------|--------------------------|
    /// | `JOBWATCH_SQL_SERVER`     | yes      |                          |
    /// | `JOBWATCH_SQL_DATABASE`   | no       | `msdb`                   |
    /// | `JOBWATCH_SQL_USER`       | no       | integrated auth          |
    /// | `JOBWATCH_SQL_PASSWORD`   | no       |                          |
    /// | `JOBWATCH_SQL_ENCRYPT`    | no       | `true`                   |
    /// | `JOBWATCH_SQL_TRUST_CERT` | no       | `true`                   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server = non_empty("JOBWATCH_SQL_SERVER").ok_or_else(|| {
            CoreError::Validation("JOBWATCH_SQL_SERVER must be set".to_string())
        })?;

        let mut config = Self::new(ServerAddress::parse(&server)?);
        if let Some(database) = non_empty("JOBWATCH_SQL_DATABASE") {
            config.database = database.trim().to_string();
        }
        config.user = non_empty("JOBWATCH_SQL_USER");
        config.password = lookup("JOBWATCH_SQL_PASSWORD");
        if let Some(raw) = non_empty("JOBWATCH_SQL_ENCRYPT") {
            config.encrypt = parse_flag("JOBWATCH_SQL_ENCRYPT", &raw)?;
        }
        if let Some(raw) = non_empty("JOBWATCH_SQL_TRUST_CERT") {
            config.trust_cert = parse_flag("JOBWATCH_SQL_TRUST_CERT", &raw)?;
        }
        Ok(config)
    }

    pub fn uses_integrated_auth(&self) -> bool {
        self.user.is_none()
    }

    /// ADO.NET-style connection string with the password masked, for logs
    /// and `--dry-run` output.
    pub fn connection_string(&self) -> String {
        let mut parts = vec![
            format!("Server={}", self.server),
            format!("Database={}", self.database),
        ];
        match &self.user {
            None => parts.push("Integrated Security=true".to_string()),
            Some(user) => {
                parts.push(format!("User Id={user}"));
                if self.password.is_some() {
                    parts.push("Password=***".to_string());
                }
            }
        }
        parts.push(format!("Encrypt={}", self.encrypt));
        parts.push(format!("TrustServerCertificate={}", self.trust_cert));
        parts.push(format!("Application Name={APPLICATION_NAME}"));
        parts.join(";") + ";"
    }

    /// Build the driver configuration.
    pub fn to_tiberius(&self) -> Result<tiberius::Config, CoreError> {
        let mut config = tiberius::Config::new();
        config.host(&self.server.host);
        config.port(self.server.port.unwrap_or(DEFAULT_PORT));
        // An explicit port wins over SQL Browser instance lookup.
        if let (Some(instance), None) = (&self.server.instance, self.server.port) {
            config.instance_name(instance);
        }
        config.database(&self.database);
        config.application_name(APPLICATION_NAME);
        config.authentication(self.auth_method()?);
        config.encryption(if self.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });
        if self.trust_cert {
            config.trust_cert();
        }
        Ok(config)
    }

    fn auth_method(&self) -> Result<AuthMethod, CoreError> {
        match &self.user {
            Some(user) => Ok(AuthMethod::sql_server(
                user,
                self.password.as_deref().unwrap_or_default(),
            )),
            None => integrated_auth(),
        }
    }
}

#[cfg(windows)]
fn integrated_auth() -> Result<AuthMethod, CoreError> {
    Ok(AuthMethod::Integrated)
}

#[cfg(not(windows))]
fn integrated_auth() -> Result<AuthMethod, CoreError> {
    Err(CoreError::Validation(
        "Integrated authentication is only available on Windows; set JOBWATCH_SQL_USER"
            .to_string(),
    ))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CoreError::Validation(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
