use std::env;
use std::time::Duration;

/// Process-startup configuration, read once before the listener binds. Distinct from the
/// per-subscribe `args` carried on the wire (§6.1), which configure one session's consumer.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Address the external acceptor should bind to before handing streams to
    /// [`crate::server::Gateway::connect`] (binding and the HTTP upgrade itself are out of
    /// scope for this crate, §1).
    pub bind_addr: String,

    /// Multiplier applied to `auto_commit_interval_ms` to get a message's release interval
    /// (§3, §9). The reference implementation fixes this at 5.
    pub release_multiplier: u32,

    /// Upper bound applied to a poll's requested `blocking_time`, in milliseconds, so that a
    /// single session can't park its worker indefinitely.
    pub max_blocking_time_ms: u64,
}

impl GatewayConfig {
    /// Load configuration from the environment, falling back to development-friendly
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let bind_addr =
            env::var("TMQ_GATEWAY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:6041".to_owned());

        let release_multiplier = env::var("TMQ_GATEWAY_RELEASE_MULTIPLIER")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(5);

        let max_blocking_time_ms = env::var("TMQ_GATEWAY_MAX_BLOCKING_TIME_MS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(60_000);

        GatewayConfig {
            bind_addr,
            release_multiplier,
            max_blocking_time_ms,
        }
    }

    /// The release interval for a session with the given `auto_commit_interval_ms`.
    pub fn release_interval(&self, auto_commit_interval_ms: u64) -> Duration {
        Duration::from_millis(
            auto_commit_interval_ms.saturating_mul(u64::from(self.release_multiplier)),
        )
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            bind_addr: "0.0.0.0:6041".to_owned(),
            release_multiplier: 5,
            max_blocking_time_ms: 60_000,
        }
    }
}
