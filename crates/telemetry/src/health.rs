//! Component health for the readiness probe and `/health`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Health status for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Component health state.
#[derive(Debug)]
pub struct ComponentHealth {
    name: &'static str,
    healthy: AtomicBool,
    message: parking_lot::RwLock<Option<String>>,
}

impl ComponentHealth {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            healthy: AtomicBool::new(false),
            message: parking_lot::RwLock::new(None),
        }
    }

    pub fn set_healthy(&self) {
        self.healthy.store(true, Ordering::Relaxed);
        *self.message.write() = None;
    }

    pub fn set_unhealthy(&self, msg: impl Into<String>) {
        self.healthy.store(false, Ordering::Relaxed);
        *self.message.write() = Some(msg.into());
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> Option<String> {
        self.message.read().clone()
    }

    fn report(&self) -> ComponentHealthReport {
        ComponentHealthReport {
            name: self.name.to_string(),
            healthy: self.is_healthy(),
            message: self.message(),
        }
    }
}

/// Aggregated health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealthReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealthReport {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

/// Health of the ledger and of each external collaborator.
///
/// The ledger decides readiness; provider failures only degrade the service
/// since every provider call has a fallback.
pub struct HealthRegistry {
    pub ledger: ComponentHealth,
    pub llm: ComponentHealth,
    pub geolocation: ComponentHealth,
    pub mailer: ComponentHealth,
}

impl HealthRegistry {
    pub const fn new() -> Self {
        Self {
            ledger: ComponentHealth::new("ledger"),
            llm: ComponentHealth::new("llm"),
            geolocation: ComponentHealth::new("geolocation"),
            mailer: ComponentHealth::new("mailer"),
        }
    }

    fn components(&self) -> [&ComponentHealth; 4] {
        [&self.ledger, &self.llm, &self.geolocation, &self.mailer]
    }

    /// Ledger down is unhealthy; any provider down is degraded.
    pub fn report(&self) -> HealthReport {
        let components: Vec<ComponentHealthReport> =
            self.components().iter().map(|c| c.report()).collect();

        let status = match (self.ledger.is_healthy(), components.iter().all(|c| c.healthy)) {
            (false, _) => HealthStatus::Unhealthy,
            (true, true) => HealthStatus::Healthy,
            (true, false) => HealthStatus::Degraded,
        };

        HealthReport { status, components }
    }

    /// Traffic is accepted once the data directory is writable.
    pub fn is_ready(&self) -> bool {
        self.ledger.is_healthy()
    }

    /// Check if the service is alive.
    pub fn is_alive(&self) -> bool {
        true
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global health registry.
pub static HEALTH: std::sync::LazyLock<HealthRegistry> =
    std::sync::LazyLock::new(HealthRegistry::new);

/// Get the global health registry.
pub fn health() -> &'static HealthRegistry {
    &HEALTH
}
