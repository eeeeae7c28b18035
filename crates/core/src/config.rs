//! Process configuration, read from the environment.
//!
//! Call [`load_dotenv`] first so a local `.env` file is honored.

use std::env;
use std::time::Duration;

use crate::task::Operation;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_millis(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(key, default_ms))
}

const DEFAULT_OPERATION_MS: u64 = 1000;

/// Simulated execution time for each operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimes {
    /// Time for `+`
    pub addition: Duration,
    /// Time for `-`
    pub subtraction: Duration,
    /// Time for `*`
    pub multiplication: Duration,
    /// Time for `/`
    pub division: Duration,
}

impl Default for OperationTimes {
    fn default() -> Self {
        Self::uniform(Duration::from_millis(DEFAULT_OPERATION_MS))
    }
}

impl OperationTimes {
    /// Same duration for every operation.
    pub fn uniform(duration: Duration) -> Self {
        Self {
            addition: duration,
            subtraction: duration,
            multiplication: duration,
            division: duration,
        }
    }

    /// Read `TIME_*_MS` variables.
    pub fn from_env() -> Self {
        Self {
            addition: env_millis("TIME_ADDITION_MS", DEFAULT_OPERATION_MS),
            subtraction: env_millis("TIME_SUBTRACTION_MS", DEFAULT_OPERATION_MS),
            multiplication: env_millis("TIME_MULTIPLICATIONS_MS", DEFAULT_OPERATION_MS),
            division: env_millis("TIME_DIVISIONS_MS", DEFAULT_OPERATION_MS),
        }
    }

    /// Duration configured for `operation`.
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Add => self.addition,
            Operation::Subtract => self.subtraction,
            Operation::Multiply => self.multiplication,
            Operation::Divide => self.division,
        }
    }
}

/// HTTP bind settings for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`ORCHESTRATOR_HOST`)
    pub host: String,
    /// Listening port (`ORCHESTRATOR_PORT`)
    pub port: u16,
}

impl ServerConfig {
    /// Read `ORCHESTRATOR_HOST` and `ORCHESTRATOR_PORT`.
    pub fn from_env() -> Self {
        Self {
            host: env_or("ORCHESTRATOR_HOST", "0.0.0.0"),
            port: env_opt("ORCHESTRATOR_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        }
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dispatch lease settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseConfig {
    /// Grace period past a task's operation time before it is handed out again
    pub timeout: Duration,
    /// How often expired leases are reclaimed
    pub reap_interval: Duration,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            reap_interval: Duration::from_secs(1),
        }
    }
}

/// Worker-side settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Number of concurrently running worker loops
    pub computing_power: usize,
    /// Base URL of the orchestrator
    pub orchestrator_url: String,
    /// Delay before re-polling when no task is available
    pub poll_interval: Duration,
}

impl AgentConfig {
    /// Read `COMPUTING_POWER`, `ORCHESTRATOR_URL` and `AGENT_POLL_INTERVAL_MS`.
    pub fn from_env() -> Self {
        Self {
            computing_power: (env_u64("COMPUTING_POWER", 1) as usize).max(1),
            orchestrator_url: env_or("ORCHESTRATOR_URL", "http://127.0.0.1:8080"),
            poll_interval: env_millis("AGENT_POLL_INTERVAL_MS", 500),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Per-operation hold times stamped onto tasks
    pub operation_times: OperationTimes,
    /// Orchestrator bind address
    pub server: ServerConfig,
    /// Dispatch lease and reaper settings
    pub lease: LeaseConfig,
    /// Worker pool settings
    pub agent: AgentConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        let defaults = LeaseConfig::default();
        Self {
            operation_times: OperationTimes::from_env(),
            server: ServerConfig::from_env(),
            lease: LeaseConfig {
                timeout: env_millis("LEASE_TIMEOUT_MS", defaults.timeout.as_millis() as u64),
                reap_interval: env_millis(
                    "LEASE_REAP_INTERVAL_MS",
                    defaults.reap_interval.as_millis() as u64,
                ),
            },
            agent: AgentConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        let t = &self.operation_times;
        tracing::info!("Config loaded:");
        tracing::info!("  server:      {}", self.server.bind_addr());
        tracing::info!(
            "  operations:  +={:?} -={:?} *={:?} /={:?}",
            t.addition, t.subtraction, t.multiplication, t.division
        );
        tracing::info!(
            "  lease:       timeout={:?} reap_interval={:?}",
            self.lease.timeout, self.lease.reap_interval
        );
        tracing::info!(
            "  agent:       computing_power={} url={}",
            self.agent.computing_power, self.agent.orchestrator_url
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_operation_times() {
        let times = OperationTimes::default();
        assert_eq!(times.for_operation(Operation::Add), Duration::from_millis(1000));
        assert_eq!(times.for_operation(Operation::Divide), Duration::from_millis(1000));
    }

    #[test]
    fn test_for_operation_picks_matching_field() {
        let times = OperationTimes {
            addition: Duration::from_millis(1),
            subtraction: Duration::from_millis(2),
            multiplication: Duration::from_millis(3),
            division: Duration::from_millis(4),
        };
        assert_eq!(times.for_operation(Operation::Subtract), Duration::from_millis(2));
        assert_eq!(times.for_operation(Operation::Multiply), Duration::from_millis(3));
    }

    #[test]
    fn test_bind_addr() {
        let server = ServerConfig { host: "127.0.0.1".to_string(), port: 9000 };
        assert_eq!(server.bind_addr(), "127.0.0.1:9000");
    }
}
