use hifitime::prelude::{Duration, Epoch};

use crate::error::Error;

#[derive(Debug, Copy, Clone)]
pub struct Runtime {
    /// Epoch of deployment
    deploy_time: Epoch,
}

impl Runtime {
    pub fn new(epoch: Epoch) -> Self {
        Self { deploy_time: epoch }
    }

    /// Deploys a new [Runtime] at current system time
    pub fn deploy() -> Result<Self, Error> {
        Ok(Self::new(Self::now()?))
    }

    /// Uptime as [Duration], at given [Epoch]
    pub fn uptime(&self, epoch: Epoch) -> Duration {
        epoch - self.deploy_time
    }

    /// Time elapsed since deployment
    pub fn elapsed(&self) -> Result<Duration, Error> {
        Ok(self.uptime(Self::now()?))
    }

    fn now() -> Result<Epoch, Error> {
        Epoch::now().map_err(|e| Error::SystemTime(e.to_string()))
    }
}
