use clap::{Parser, ValueEnum};
use std::path::PathBuf;

// How a counter decides its window is over
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    // 24 hours elapsed since the last reset
    #[default]
    Rolling,
    // UTC date changed since the last reset
    CalendarDay,
}

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "view-counter")]
#[command(about = "Profile view counter with SVG badges")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // Rate limit max increments per window, per source address
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // When counters are zeroed
    #[arg(long, env = "RESET_POLICY", value_enum, default_value_t = ResetPolicy::Rolling)]
    pub reset_policy: ResetPolicy,

    // User directory used to check that an identity exists
    #[arg(long, env = "DIRECTORY_URL", default_value = "https://api.github.com")]
    pub directory_url: String,

    // Optional token for the directory (raises its rate limit)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub directory_token: Option<String>,

    // Directory lookup timeout in milliseconds
    #[arg(long, env = "DIRECTORY_TIMEOUT_MS", default_value_t = 5000)]
    pub directory_timeout_ms: u64,

    // Static assets, index.html is served at /
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    // Reverse proxies in front of the service; 0 uses the TCP peer address.
    // N > 0 takes the N-th X-Forwarded-For entry counted from the right.
    #[arg(long, env = "TRUSTED_PROXY_HOPS", default_value_t = 0)]
    pub trusted_proxy_hops: usize,

    // e.g. sqlite:view-counter.db; counts live in memory when unset
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}
