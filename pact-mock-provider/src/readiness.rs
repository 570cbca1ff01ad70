use crate::error::Error;
use async_trait::async_trait;
use std::{fmt::Debug, net::SocketAddr, time::Duration};
use tokio::net::TcpStream;

/// Hook run between binding the listener and invoking the consumer test.
#[async_trait]
pub trait ReadinessProbe: Debug {
    async fn wait_until_ready(&self, address: SocketAddr) -> Result<(), Error>;
}

/// The hyper listener accepts as soon as it is bound, so there is nothing to wait for.
#[derive(Debug, Default)]
pub struct NoWait;

#[async_trait]
impl ReadinessProbe for NoWait {
    async fn wait_until_ready(&self, _address: SocketAddr) -> Result<(), Error> {
        Ok(())
    }
}

/// Polls the listener with plain TCP connects.
#[derive(Debug)]
pub struct TcpConnectProbe {
    attempts: u32,
    delay: Duration,
}

impl TcpConnectProbe {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl Default for TcpConnectProbe {
    fn default() -> Self {
        Self::new(20, Duration::from_millis(50))
    }
}

#[async_trait]
impl ReadinessProbe for TcpConnectProbe {
    async fn wait_until_ready(&self, address: SocketAddr) -> Result<(), Error> {
        for attempt in 1..=self.attempts {
            match TcpStream::connect(address).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::debug!(%address, attempt, error = %e, "Mock provider not ready yet");
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        Err(Error::ServerNotReady(address))
    }
}
