use std::{
    ops::Deref,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: Send + Sync + 'static;

    async fn connect(&self) -> anyhow::Result<Self::Connection>;

    async fn close(&self, _connection: Self::Connection) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Reusable stream connections, checked out through [`PooledConnection`].
pub struct ConnectionPool<C: Connector> {
    connector: C,
    idle: Mutex<Vec<C::Connection>>,
    max_idle: usize,
}

impl<C: Connector> ConnectionPool<C> {
    pub fn new(connector: C, max_idle: usize) -> Self {
        Self {
            connector,
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Reuses an idle connection or opens a new one. The connection goes
    /// back to the pool when the returned guard is dropped.
    pub async fn get(&self) -> anyhow::Result<PooledConnection<'_, C>> {
        let connection = match self.pop_idle() {
            Some(connection) => connection,
            None => self.connector.connect().await?,
        };

        Ok(PooledConnection {
            pool: self,
            connection: Some(connection),
        })
    }

    pub fn idle_connections(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Closes every idle connection. Call once nothing is checked out.
    pub async fn close(&self) {
        for connection in self.take_idle() {
            if let Err(error) = self.connector.close(connection).await {
                log::error!("Failed to close pooled connection. [error = {error:#}]");
            }
        }
    }

    fn pop_idle(&self) -> Option<C::Connection> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop()
    }

    fn take_idle(&self) -> Vec<C::Connection> {
        std::mem::take(&mut *self.idle.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn release(&self, connection: C::Connection) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(connection);
        } else {
            log::debug!("Pool is full, dropping connection");
        }
    }
}

pub struct PooledConnection<'a, C: Connector> {
    pool: &'a ConnectionPool<C>,
    connection: Option<C::Connection>,
}

impl<C: Connector> PooledConnection<'_, C> {
    /// Drops a connection that failed mid-use instead of returning it.
    pub fn discard(mut self) {
        self.connection.take();
    }
}

impl<C: Connector> Deref for PooledConnection<'_, C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("Connection is only taken on discard or drop.")
    }
}

impl<C: Connector> Drop for PooledConnection<'_, C> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.release(connection);
        }
    }
}
