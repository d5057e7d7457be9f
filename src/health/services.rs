use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::time::{timeout_at, Instant};
use tracing::warn;

/// An external system whose reachability `/health` reports on.
#[async_trait]
pub trait Pingable: Send + Sync {
    fn name(&self) -> &str;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub dependencies: Vec<DependencyStatus>,
}

impl HealthReport {
    /// Names of unavailable dependencies, in registration order.
    pub fn failed(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .filter(|d| !d.available)
            .map(|d| d.name.clone())
            .collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.dependencies.iter().all(|d| d.available)
    }
}

pub struct HealthService {
    deps: Vec<Arc<dyn Pingable>>,
    timeout: Duration,
}

impl HealthService {
    pub fn new(deps: Vec<Arc<dyn Pingable>>, timeout: Duration) -> Self {
        Self { deps, timeout }
    }

    /// Pings every dependency concurrently against one shared deadline.
    /// A timeout counts the same as an error, and one failure never stops
    /// the others from being checked.
    pub async fn check(&self) -> HealthReport {
        let deadline = Instant::now() + self.timeout;
        let checks = self.deps.iter().map(|dep| async move {
            let available = match timeout_at(deadline, dep.ping()).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    warn!(dependency = dep.name(), error = %e, "ping failed");
                    false
                }
                Err(_) => {
                    warn!(dependency = dep.name(), "ping timed out");
                    false
                }
            };
            DependencyStatus {
                name: dep.name().to_string(),
                available,
            }
        });
        HealthReport {
            dependencies: join_all(checks).await,
        }
    }
}
