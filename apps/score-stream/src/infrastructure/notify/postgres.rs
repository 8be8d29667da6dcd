//! Postgres Listener Adapter
//!
//! Production [`NotificationConnector`] backed by `sqlx`'s [`PgListener`].
//! Every `connect` opens a fresh dedicated connection outside any pool, so a
//! lost listener never takes a query connection down with it.

use async_trait::async_trait;
use sqlx::postgres::PgListener;

use crate::application::ports::{BridgeError, NotificationConnector, NotificationStream};
use crate::infrastructure::config::DatabaseUrl;

/// Opens `LISTEN` connections against a Postgres server.
#[derive(Debug, Clone)]
pub struct PgNotificationConnector {
    database_url: DatabaseUrl,
}

impl PgNotificationConnector {
    /// Create a connector for the given database.
    #[must_use]
    pub const fn new(database_url: DatabaseUrl) -> Self {
        Self { database_url }
    }
}

#[async_trait]
impl NotificationConnector for PgNotificationConnector {
    async fn connect(&self, channel: &str) -> Result<Box<dyn NotificationStream>, BridgeError> {
        let mut listener = PgListener::connect(self.database_url.expose())
            .await
            .map_err(|e| BridgeError::ConnectFailed(e.to_string()))?;

        listener
            .listen(channel)
            .await
            .map_err(|e| BridgeError::ListenFailed {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(PgNotificationStream {
            listener,
            channel: channel.to_string(),
        }))
    }
}

struct PgNotificationStream {
    listener: PgListener,
    channel: String,
}

#[async_trait]
impl NotificationStream for PgNotificationStream {
    async fn recv(&mut self) -> Result<String, BridgeError> {
        // `try_recv` yields `None` when the connection drops; the bridge owns
        // reconnection, so that is surfaced as a loss rather than retried here.
        match self.listener.try_recv().await {
            Ok(Some(notification)) => Ok(notification.payload().to_string()),
            Ok(None) => Err(BridgeError::ConnectionLost(
                "listener connection closed".to_string(),
            )),
            Err(e) => Err(BridgeError::ConnectionLost(e.to_string())),
        }
    }

    async fn close(self: Box<Self>) {
        let Self {
            mut listener,
            channel,
        } = *self;
        if let Err(e) = listener.unlisten(&channel).await {
            tracing::debug!(channel = %channel, error = %e, "UNLISTEN failed during close");
        }
    }
}
