use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the catposts binary.
#[derive(Debug, Parser)]
#[command(
    name = "catposts",
    version,
    about = "Category posts widget server with a render cache"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CATPOSTS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the widget HTTP service.
    Serve(Box<ServeArgs>),
    /// Render one widget instance to stdout.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Widget instance id, e.g. `category-posts-2`.
    #[arg(value_name = "INSTANCE")]
    pub instance: String,

    /// Emit the list without the sidebar wrapper markup.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub bare: bool,

    #[command(flatten)]
    pub cache: CacheOverrides,

    #[command(flatten)]
    pub site: SiteOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheOverrides {
    /// Serve cached renders.
    #[arg(
        long = "cache-use",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub use_cache: Option<bool>,

    /// Store renders computed on a miss.
    #[arg(
        long = "cache-save",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub save_cache: Option<bool>,

    /// Override the lifetime of stored renders.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SiteOverrides {
    /// Override the scope cache keys are derived for.
    #[arg(long = "site-scope", value_name = "SCOPE")]
    pub scope: Option<String>,

    /// Override the TOML fixture seeding posts, categories and widgets.
    #[arg(long = "site-fixture", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub cache: CacheOverrides,

    #[command(flatten)]
    pub site: SiteOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}
