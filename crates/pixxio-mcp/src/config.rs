use clap::{Parser, ValueEnum};
use pixxio_tools::PixxioSettings;
use pixxio_tools::config::{DEFAULT_API_PREFIX, DEFAULT_BASE_URL, default_download_dir};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Newline-delimited JSON-RPC over stdin/stdout.
    Stdio,
    /// rmcp streamable HTTP on `/mcp`, plus `/health`.
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "pixxio-mcp", version)]
#[command(about = "Expose the pixx.io DAM API as MCP tools", long_about = None)]
pub struct Cli {
    /// MCP transport to serve.
    #[arg(long, env = "MCP_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Bind address (http transport only).
    #[arg(long, env = "MCP_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Bind port (http transport only).
    #[arg(long, env = "MCP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Default pixx.io API key; tools may override it per call.
    #[arg(long, env = "PIXXIO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Default pixx.io instance URL; tools may override it per call.
    #[arg(long, env = "PIXXIO_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "PIXXIO_API_PREFIX", default_value = DEFAULT_API_PREFIX)]
    pub api_prefix: String,

    /// Where `download_asset` writes files. Defaults to `<tmp>/pixxio-mcp`.
    #[arg(long, env = "PIXXIO_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Process-wide defaults; blank values count as unset.
    #[must_use]
    pub fn settings(&self) -> PixxioSettings {
        PixxioSettings {
            api_key: non_blank(self.api_key.as_deref()),
            base_url: non_blank(Some(&self.base_url)),
            api_prefix: self.api_prefix.trim().to_string(),
            download_dir: self
                .download_dir
                .clone()
                .unwrap_or_else(default_download_dir),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_onto_settings() {
        let cli = Cli::try_parse_from([
            "pixxio-mcp",
            "--transport",
            "http",
            "--host",
            "0.0.0.0",
            "--port",
            "9100",
            "--api-key",
            "  key-0123456789 ",
            "--base-url",
            "https://acme.pixx.io",
            "--api-prefix",
            "/api/v1",
            "--download-dir",
            "/var/tmp/dam",
            "--log-format",
            "json",
        ])
        .expect("parse");

        assert_eq!(cli.transport, Transport::Http);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.bind_addr().to_string(), "0.0.0.0:9100");

        let settings = cli.settings();
        assert_eq!(settings.api_key.as_deref(), Some("key-0123456789"));
        assert_eq!(settings.base_url.as_deref(), Some("https://acme.pixx.io"));
        assert_eq!(settings.download_dir, PathBuf::from("/var/tmp/dam"));
    }

    #[test]
    fn unknown_transport_is_rejected() {
        assert!(Cli::try_parse_from(["pixxio-mcp", "--transport", "websocket"]).is_err());
    }
}
