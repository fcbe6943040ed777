use github_discussions_mcp::cli;
use github_discussions_mcp::config::Settings;
use github_discussions_mcp::server::{self, Server};

#[tokio::main(flavor = "current_thread")] // one request at a time over stdio
async fn main() -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches();
    let opts = cli::CliOptions::from_matches(&matches);

    cli::init_logging(opts.log_level.as_deref());

    if opts.version {
        println!("github-discussions-mcp {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut settings = Settings::from_env();
    settings.read_only |= opts.read_only;

    server::run_stdio_server(Server::from_env(settings)).await
}
