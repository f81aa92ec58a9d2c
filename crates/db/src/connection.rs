//! Opening a TDS session to SQL Server.

use tiberius::error::Error;
use tiberius::{Client, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use jobwatch_core::ports::SchedulerError;

use crate::config::ConnectionConfig;
use crate::error::classify;

/// Client type used by the adapter.
pub type SqlClient = Client<Compat<TcpStream>>;

/// Connect and log in.
///
/// Named instances without an explicit port are located through the SQL
/// Browser service. A single gateway redirect (Azure SQL) is followed.
pub async fn connect(config: &ConnectionConfig) -> Result<SqlClient, SchedulerError> {
    let tds = config
        .to_tiberius()
        .map_err(|e| SchedulerError::Connection(e.to_string()))?;

    tracing::debug!(connection = %config.connection_string(), "Connecting to SQL Server");

    let client = match open(tds.clone()).await {
        Err(Error::Routing { host, port }) => {
            tracing::debug!(host = %host, port, "Following server redirect");
            let mut redirected = tds;
            redirected.host(&host);
            redirected.port(port);
            open(redirected).await
        }
        other => other,
    }
    .map_err(classify)?;

    tracing::info!(server = %config.server, database = %config.database, "Connected to SQL Server");
    Ok(client)
}

async fn open(config: tiberius::Config) -> Result<SqlClient, Error> {
    let tcp = TcpStream::connect_named(&config).await?;
    tcp.set_nodelay(true)?;
    Client::connect(config, tcp.compat_write()).await
}
