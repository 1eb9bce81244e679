//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for calmcp
#[derive(Parser, Debug)]
#[command(name = "calmcp")]
#[command(author, version, about = "Google Calendar tools for MCP clients")]
#[command(long_about = r#"
calmcp serves Google Calendar tools (create-event, search-events) to an MCP
client over stdin/stdout.

The first tool call opens the browser-based Google authorization flow if no
usable credential is stored. Run with --authorize once to complete that flow
outside an agent session.

Configuration files are loaded from (in priority order):
1. CALMCP_* environment variables (e.g. CALMCP_CALENDAR__CALENDAR_ID)
2. --config <path>     Explicit config file
3. ./calmcp.toml       Project-level config
4. ~/.config/calmcp/config.toml   Global config

Example:
  calmcp
  calmcp --authorize
  calmcp --config ~/calmcp.toml -vv
"#)]
pub struct Cli {
    /// Authorize (or refresh the stored credential) and exit
    #[arg(long)]
    pub authorize: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the resolved configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["calmcp", "-vv", "--config", "x.toml", "--authorize"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(cli.authorize);
        assert!(!cli.show_config);
    }
}
