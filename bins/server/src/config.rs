use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "net-state", about = "Live node topology of a pub/sub runtime")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the service
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml", env = "NET_STATE_CONFIG")]
    pub config: String,

    /// Override the API bind address (host:port)
    #[arg(long, env = "NET_STATE_BIND")]
    pub bind: Option<String>,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default)]
    pub mqtt: MqttSection,
    pub runtime: RuntimeSection,
}

#[derive(Debug, Deserialize)]
pub struct MqttSection {
    /// Broker address, `host:port`.
    #[serde(default = "default_server_address")]
    pub server_address: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// Bus request queue; subscribe/publish fail instead of waiting when it is full.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

#[derive(Debug, Deserialize)]
pub struct RuntimeSection {
    /// Topic subscribed at startup; runtimes announce themselves here.
    pub topic_prefix: String,
    /// Drop the `<prefix>/<runtime id>` subscription on `rt-stop`.
    #[serde(default)]
    pub unsubscribe_on_stop: bool,
}

fn default_api_host() -> String {
    "0.0.0.0".into()
}
fn default_api_port() -> u16 {
    5000
}
fn default_server_address() -> String {
    "localhost:1883".into()
}
fn default_client_id() -> String {
    "net-state".into()
}
fn default_keepalive_secs() -> u64 {
    60
}
fn default_request_capacity() -> usize {
    64
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            client_id: default_client_id(),
            keepalive_secs: default_keepalive_secs(),
            request_capacity: default_request_capacity(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

impl MqttSection {
    /// Split `server_address` into host and port.
    pub fn broker(&self) -> Result<(String, u16), ServerError> {
        let invalid = |detail: String| ServerError::Config { context: "mqtt.server_address", detail };
        let (host, port) = self
            .server_address
            .split_once(':')
            .ok_or_else(|| invalid(format!("'{}': expected host:port", self.server_address)))?;
        if host.is_empty() {
            return Err(invalid(format!("'{}': empty host", self.server_address)));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| invalid(format!("'{}': port: {e}", self.server_address)))?;
        Ok((host.to_string(), port))
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }
}
