use clap::{Arg, ArgAction, ArgMatches, Command};

pub struct CliOptions {
    pub log_level: Option<String>,
    pub read_only: bool,
    pub version: bool,
}

impl CliOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            log_level: matches.get_one::<String>("log-level").cloned(),
            read_only: matches.get_flag("read-only"),
            version: matches.get_flag("version"),
        }
    }
}

pub fn build_cli() -> Command {
    Command::new("github-discussions-mcp")
        .about("GitHub Discussions MCP server (stdio JSON-RPC)")
        .disable_version_flag(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("read-only")
                .long("read-only")
                .help("Hide and refuse tools that create discussions or comments")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
}

pub fn init_logging(level: Option<&str>) {
    // Explicit level wins, else RUST_LOG, else info. Logs go to stderr; stdout carries the protocol.
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.target(env_logger::Target::Stderr).init();
}
