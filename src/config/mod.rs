// Configuration resolution for the commit daemon.
//
// Every setting comes from one of three layers: a command-line flag, an
// environment variable, or a built-in default. Flags win over environment
// variables, which win over defaults. An unrecognized environment value is
// ignored and the chain falls through to the default.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::askpass;


pub const ENV_LOGFORMAT: &str = "COMMITD_LOGFORMAT";
pub const ENV_LOGLEVEL: &str = "COMMITD_LOGLEVEL";
pub const ENV_LISTEN_ADDRESS: &str = "COMMITD_LISTEN_ADDRESS";
pub const ENV_METRICS_LISTEN_ADDRESS: &str = "COMMITD_METRICS_LISTEN_ADDRESS";

/// An empty listen address from any layer means "all interfaces".
pub const ALL_INTERFACES: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8086;
pub const DEFAULT_METRICS_PORT: u16 = 8087;

/// Commit daemon - applies rendered manifests to git repositories
#[derive(Parser, Debug, Default)]
#[command(name = "commitd", author, version, about, long_about = None)]
pub struct Args {
    /// Set the logging format. One of: text|json
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub logformat: Option<LogFormat>,

    /// Set the logging level. One of: debug|info|warn|error
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub loglevel: Option<LogLevel>,

    /// Listen on given address for incoming connections
    #[arg(long, value_name = "ADDRESS")]
    pub address: Option<String>,

    /// Listen on given port for incoming connections
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Listen on given address for metrics
    #[arg(long, value_name = "ADDRESS")]
    pub metrics_address: Option<String>,

    /// Start metrics server on given port
    #[arg(long, value_name = "PORT")]
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }

    fn from_env_value(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("text") {
            Some(LogFormat::Text)
        } else if value.eq_ignore_ascii_case("json") {
            Some(LogFormat::Json)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string accepted by the tracing env filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn from_env_value(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("debug") {
            Some(LogLevel::Debug)
        } else if value.eq_ignore_ascii_case("info") {
            Some(LogLevel::Info)
        } else if value.eq_ignore_ascii_case("warn") {
            Some(LogLevel::Warn)
        } else if value.eq_ignore_ascii_case("error") {
            Some(LogLevel::Error)
        } else {
            None
        }
    }
}

/// Host and port a listener binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenSpec {
    pub host: String,
    pub port: u16,
}

impl ListenSpec {
    /// Bind address in `host:port` form. The host is never empty here;
    /// resolution normalizes an empty address to [`ALL_INTERFACES`].
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    pub level: LogLevel,
}

/// Built-in fallback values, applied when neither a flag nor an
/// environment variable provides a setting.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub address: &'static str,
    pub port: u16,
    pub metrics_address: &'static str,
    pub metrics_port: u16,
    pub logformat: LogFormat,
    pub loglevel: LogLevel,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            address: ALL_INTERFACES,
            port: DEFAULT_PORT,
            metrics_address: ALL_INTERFACES,
            metrics_port: DEFAULT_METRICS_PORT,
            logformat: LogFormat::Text,
            loglevel: LogLevel::Info,
        }
    }
}

/// Fully resolved runtime settings for one daemon instance.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc: ListenSpec,
    pub metrics: ListenSpec,
    pub log: LogSettings,
    pub askpass_socket: PathBuf,
}

impl Settings {
    /// Resolves the effective settings from parsed flags, the process
    /// environment and built-in defaults.
    pub fn resolve(args: &Args, defaults: &Defaults) -> Self {
        Self::resolve_with_env(args, defaults, |key| std::env::var(key).ok())
    }

    fn resolve_with_env(
        args: &Args,
        defaults: &Defaults,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let format = args
            .logformat
            .or_else(|| env(ENV_LOGFORMAT).as_deref().and_then(LogFormat::from_env_value))
            .unwrap_or(defaults.logformat);

        let level = args
            .loglevel
            .or_else(|| env(ENV_LOGLEVEL).as_deref().and_then(LogLevel::from_env_value))
            .unwrap_or(defaults.loglevel);

        let host = resolve_host(
            args.address.as_deref(),
            env(ENV_LISTEN_ADDRESS),
            defaults.address,
        );
        let metrics_host = resolve_host(
            args.metrics_address.as_deref(),
            env(ENV_METRICS_LISTEN_ADDRESS),
            defaults.metrics_address,
        );

        // Ports have no environment fallback, only flags and defaults.
        Settings {
            rpc: ListenSpec {
                host,
                port: args.port.unwrap_or(defaults.port),
            },
            metrics: ListenSpec {
                host: metrics_host,
                port: args.metrics_port.unwrap_or(defaults.metrics_port),
            },
            log: LogSettings { format, level },
            askpass_socket: PathBuf::from(askpass::SOCKET_PATH),
        }
    }
}

fn resolve_host(flag: Option<&str>, env_value: Option<String>, default: &str) -> String {
    let host = flag
        .map(str::to_owned)
        .or(env_value)
        .unwrap_or_else(|| default.to_owned());
    if host.is_empty() {
        ALL_INTERFACES.to_owned()
    } else {
        host
    }
}
