use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of messages buffered per SSE subscriber before drops start.
pub const DEFAULT_SUBSCRIBER_QUEUE_CAPACITY: usize = 64;

/// Default upper bound for a `POST /messages` body, in bytes.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

fn parse_queue_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("subscriber queue capacity must be at least 1".to_string()),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(format!("invalid subscriber queue capacity: {e}")),
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:4000,http://127.0.0.1:4000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Number of messages buffered for each SSE subscriber. Once a subscriber's
    /// queue is full, further messages are dropped for that subscriber only.
    #[arg(long, env, default_value_t = DEFAULT_SUBSCRIBER_QUEUE_CAPACITY, value_parser = parse_queue_capacity)]
    pub subscriber_queue_capacity: usize,

    /// Largest accepted `POST /messages` body, in bytes
    #[arg(long, env, default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_message_bytes: usize,

    /// Seconds between SSE keep-alive comments on idle streams
    #[arg(long, env, default_value_t = 15)]
    pub sse_keep_alive_secs: u64,

    /// Directory holding the demo page (`sse.html`) and other static assets
    #[arg(long, env, default_value = "./static")]
    pub static_dir: PathBuf,

    /// File the `/task` background job appends to
    #[arg(long, env, default_value = "log.txt")]
    pub task_log_path: PathBuf,

    /// How long the `/task` background job waits before writing, in milliseconds
    #[arg(long, env, default_value_t = 2000)]
    pub task_delay_ms: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Address to bind the HTTP listener to, e.g. `127.0.0.1:4000`.
    pub fn socket_addr(&self) -> String {
        let interface = self.interface.as_deref().unwrap_or("127.0.0.1");
        format!("{}:{}", interface, self.port)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
