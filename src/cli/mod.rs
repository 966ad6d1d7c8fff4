//! CLI module for the Bedrock knowledge base MCP server
//!
//! `serve` (the default) runs the MCP server over stdio.

pub mod serve;

use clap::{Args, Parser, Subcommand};

/// Bedrock knowledge base MCP server
#[derive(Parser)]
#[command(name = "bedrock-kb-mcp-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the MCP server on stdio (default)
    Serve,
}

/// Settings that take precedence over the environment and config files
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// AWS region for every client
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Log level: DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_the_default() {
        let cli = Cli::try_parse_from(["bedrock-kb-mcp-server", "--region", "eu-west-1"]).unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.overrides.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_serve_subcommand_flags() {
        let cli = Cli::try_parse_from([
            "bedrock-kb-mcp-server",
            "serve",
            "--log-level",
            "DEBUG",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.overrides.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(cli.overrides.region, None);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["bedrock-kb-mcp-server", "--port", "80"]).is_err());
    }
}
