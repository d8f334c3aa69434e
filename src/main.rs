//! Oracle Assets - command line front for the image cache
//!
//! Resolves single assets, warms the cache for the shop catalog, or serves
//! cached images over HTTP.

use clap::{Parser, Subcommand};
use oracle_assets::{catalog, AssetCache, CacheConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Tiered image cache for generated shop and reading artwork
#[derive(Parser, Debug)]
#[command(name = "oracle_assets")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite asset store
    #[arg(long, env = "ORACLE_ASSETS_STORE", default_value_os_t = oracle_assets::config::default_store_path())]
    store: PathBuf,

    /// Run without the durable tier (memory and network only)
    #[arg(long, env = "ORACLE_ASSETS_NO_STORE", default_value_t = false)]
    no_store: bool,

    /// Base URL of the remote image generator
    #[arg(long, env = "ORACLE_ASSETS_REMOTE_URL", default_value = oracle_assets::config::DEFAULT_REMOTE_BASE_URL)]
    remote_base_url: String,

    /// Transport timeout for generator requests, in seconds
    #[arg(long, env = "ORACLE_ASSETS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one asset and print its image source
    Resolve {
        /// Logical asset id, e.g. amulet_Aries
        id: String,
        /// Prompt for the generator
        prompt: String,
        /// Square size in pixels
        #[arg(long, default_value_t = catalog::DETAIL_SIZE)]
        size: u32,
    },
    /// Warm the cache for every shop product
    Prefetch {
        #[arg(long, default_value_t = catalog::THUMBNAIL_SIZE)]
        size: u32,
    },
    /// Serve cached assets over HTTP
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

impl Args {
    fn config(&self) -> CacheConfig {
        CacheConfig {
            store_path: (!self.no_store).then(|| self.store.clone()),
            remote_base_url: self.remote_base_url.clone(),
            fetch_timeout: self.timeout_secs.map(Duration::from_secs),
            ..CacheConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=oracle_assets=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config();

    match &config.store_path {
        Some(path) => log::info!("Asset store path: {}", path.display()),
        None => log::info!("Durable store disabled"),
    }

    let cache = Arc::new(AssetCache::from_config(&config));

    match args.command {
        Command::Resolve { id, prompt, size } => {
            if id.is_empty() || size == 0 {
                eprintln!("Error: id must be non-empty and size positive");
                std::process::exit(1);
            }
            let locator = cache.resolve(&id, &prompt, size).await;
            cache.flush_pending().await;
            if locator.is_local() {
                println!("{} (cached, {} bytes)", locator, locator.bytes().map_or(0, |b| b.len()));
            } else {
                println!("{}", locator);
            }
        }
        Command::Prefetch { size } => {
            let report = cache.prefetch(&catalog::all(size)).await;
            cache.flush_pending().await;
            println!("{} cached locally, {} direct", report.local, report.remote);
        }
        Command::Serve { port } => {
            let server_cache = Arc::clone(&cache);
            tokio::select! {
                result = oracle_assets::web::serve(server_cache, port) => {
                    if let Err(e) = result {
                        log::error!("Web server error: {}", e);
                        eprintln!("Error: {e}");
                        std::process::exit(1);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Shutting down, waiting for pending store writes");
                }
            }
            cache.flush_pending().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_path_is_taken_verbatim() {
        let args = Args::parse_from(["oracle_assets", "--store", "/tmp/oracle/assets.db", "prefetch"]);
        assert_eq!(args.config().store_path, Some(PathBuf::from("/tmp/oracle/assets.db")));
    }

    #[test]
    fn test_store_path_defaults_to_data_dir() {
        let args = Args::parse_from(["oracle_assets", "prefetch"]);
        assert_eq!(args.store, oracle_assets::config::default_store_path());
    }

    #[test]
    fn test_no_store_disables_durable_tier() {
        let args = Args::parse_from(["oracle_assets", "--no-store", "prefetch"]);
        assert_eq!(args.config().store_path, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_store_path_survives() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"/tmp/caf\xe9/assets.db".to_vec());
        let args = Args::parse_from([
            OsString::from("oracle_assets"),
            OsString::from("--store"),
            raw.clone(),
            OsString::from("prefetch"),
        ]);
        assert_eq!(args.config().store_path, Some(PathBuf::from(raw)));
    }
}
