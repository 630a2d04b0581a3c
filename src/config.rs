use std::net::SocketAddr;
use std::time::Duration;

/// Default cap on simultaneously running jobs. Historically this
/// varied between 0 and 1; it is pinned to 1 here, with 0 still
/// meaning unlimited.
pub const DEFAULT_CONCURRENT_JOBS: usize = 1;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Maximum simultaneously running jobs. 0 means unlimited.
    pub concurrent_jobs: usize,
    /// Command names the service will agree to run.
    pub allowed_commands: Vec<String>,
    /// How long to wait for in-flight work after a shutdown signal
    /// before the process exits anyway.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // SAFETY: This is a hardcoded valid address that will always parse
            listen_addr: "127.0.0.1:8090"
                .parse()
                .expect("default listen address is valid"),
            concurrent_jobs: DEFAULT_CONCURRENT_JOBS,
            allowed_commands: vec!["echo".to_string(), "cowsay".to_string()],
            shutdown_grace: Duration::from_secs(15),
        }
    }
}
