//! Redis-backed frontier shared between crawler processes
//!
//! The pending and visited sets are two named Redis sets. SPOP gives the
//! atomic pending→visited move its teeth: only one process ever receives
//! a given URL. The membership check in `add_candidate` is a separate
//! round-trip from the insert, so a URL visited in between can transiently
//! reappear in the pending set; the next SPOP moves it straight back to
//! visited and nobody fetches it twice.

use async_trait::async_trait;
use log::debug;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::config::FrontierSettings;

use super::{Frontier, FrontierError, IdleCheck, POLL_INTERVAL};

pub struct RedisFrontier {
    host: String,
    port: u16,
    to_visit: String,
    visited: String,
    conn: parking_lot::Mutex<Option<ConnectionManager>>,
}

impl RedisFrontier {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, to_visit: impl Into<String>, visited: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            to_visit: to_visit.into(),
            visited: visited.into(),
            conn: parking_lot::Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &FrontierSettings) -> Self {
        Self::new(
            settings.host.clone(),
            settings.port,
            settings.to_visit_set.clone(),
            settings.visited_set.clone(),
        )
    }

    fn connection(&self) -> Result<ConnectionManager, FrontierError> {
        self.conn
            .lock()
            .clone()
            .ok_or_else(|| FrontierError::Unavailable("connection not initialized".into()))
    }
}

#[async_trait]
impl Frontier for RedisFrontier {
    async fn init(&self) -> Result<(), FrontierError> {
        let client = redis::Client::open(format!("redis://{}:{}/", self.host, self.port))?;
        let manager = client.get_connection_manager().await?;
        *self.conn.lock() = Some(manager);
        debug!("frontier connected to redis at {}:{}", self.host, self.port);
        Ok(())
    }

    async fn add_candidate(&self, url: &str) -> Result<(), FrontierError> {
        let mut conn = self.connection()?;
        let in_visited: bool = conn.sismember(&self.visited, url).await?;
        if !in_visited {
            let _: i64 = conn.sadd(&self.to_visit, url).await?;
        }
        Ok(())
    }

    async fn acquire_next(&self, workers_idle: &IdleCheck) -> Result<Option<String>, FrontierError> {
        let mut conn = self.connection()?;
        loop {
            let url: Option<String> = conn.spop(&self.to_visit).await?;
            if let Some(url) = url {
                let _: i64 = conn.sadd(&self.visited, &url).await?;
                return Ok(Some(url));
            }
            let left: usize = conn.scard(&self.to_visit).await?;
            if left == 0 && workers_idle() {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn mark_visited(&self, url: &str) -> Result<(), FrontierError> {
        let mut conn = self.connection()?;
        let _: i64 = conn.sadd(&self.visited, url).await?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<usize, FrontierError> {
        let mut conn = self.connection()?;
        Ok(conn.scard(&self.to_visit).await?)
    }

    async fn clear(&self) -> Result<(), FrontierError> {
        let mut conn = self.connection()?;
        let _: i64 = conn
            .del((self.to_visit.as_str(), self.visited.as_str()))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), FrontierError> {
        self.conn.lock().take();
        Ok(())
    }
}
