use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use lloggs::LoggingArgs;
use tracing::info;

use s3web::{Config, MemoryStorage, S3Storage, api, server};

/// How long in-flight requests may run once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "s3web")]
#[command(about = "Serve an S3 bucket over HTTP")]
struct Args {
    /// Configuration file (.yaml, .yml, .json or .toml)
    #[arg(long, short, default_value = "config.toml")]
    config: PathBuf,

    /// Log at debug level regardless of verbosity
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
    )]
    debug: bool,

    /// Serve from an in-memory bucket instead of S3
    #[arg(long)]
    memory: bool,

    #[command(flatten)]
    logging: LoggingArgs,
}

/// Long options that may also be written with a single dash (`-config x`).
const SINGLE_DASH_LONGS: &[&str] = &["config", "debug", "memory"];

/// Rewrite `-name` and `-name=value` into `--name` forms for the options in
/// [`SINGLE_DASH_LONGS`]. Everything else is passed through untouched.
fn long_from_single_dash(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let Some(flag) = arg.to_str().and_then(|a| a.strip_prefix('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if SINGLE_DASH_LONGS.contains(&name) {
                OsString::from(format!("--{flag}"))
            } else {
                arg
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse_from(long_from_single_dash(std::env::args_os()));
    let _guard = if args.debug {
        args.logging.setup(|_| "debug")?
    } else {
        args.logging.setup(|v| match v {
            0 => "info",
            1 => "debug",
            _ => "trace",
        })?
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "s3web starting"
    );

    let config = Config::load(&args.config)?;
    let addr = config.listen_addr()?;

    let app = if args.memory {
        info!("Serving from an in-memory bucket");
        api::router(MemoryStorage::new(), config.homepage.clone())
    } else {
        let storage = S3Storage::from_env(&config.s3bucket, &config.aws_region).await;
        info!(bucket = storage.bucket(), region = %config.aws_region, "Using S3 bucket");
        api::router(storage, config.homepage.clone())
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    server::serve(listener, app, server::shutdown_signal(), SHUTDOWN_GRACE).await?;

    Ok(())
}
