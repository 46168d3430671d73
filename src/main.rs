use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use simple_gallery::config::GalleryConfig;
use simple_gallery::users::UserRegistry;
use simple_gallery::{check, config, observability, output, server};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-gallery")]
#[command(about = "HTTP photo gallery with on-demand previews")]
#[command(long_about = "\
HTTP photo gallery with on-demand previews

Serves a directory tree of photos and videos read-only over HTTP:

  <html_base>/<dir>       HTML listing with thumbnails
  <files_base>/<file>     original file bytes
  <previews_base>/<file>@<size>
                          JPEG/PNG/... preview fitted inside <size> pixels

With a users file configured every request needs HTTP Basic credentials,
and each user's access level (\"all\" or allow/deny lists of directory
paths) decides which directories they may list.

Settings come from stock defaults, then --config, then environment
variables (PORT_NUMBER, PHOTOS_ROOT_PATH, SAVE_PREVIEWS, ...).

Run 'simple-gallery gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Validate configuration, paths, and users file without serving
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Resolve configuration and install the tracing subscriber.
fn load_config(path: Option<&Path>) -> anyhow::Result<GalleryConfig> {
    let config = config::load_config(path, |key| std::env::var(key).ok())
        .context("loading configuration")?;
    observability::init_tracing(config.log_level);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let config = load_config(cli.config.as_deref())?;
            server::run(config).await?;
        }
        Command::Check => {
            let config = load_config(cli.config.as_deref())?;
            let users = config
                .auth
                .users_file
                .as_deref()
                .map(UserRegistry::load)
                .transpose()?;
            let report = check::inspect(&config, users.as_ref());
            output::print_check_output(&report);
            if report.has_errors() {
                bail!("configuration check failed");
            }
            println!("==> Configuration is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
