use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use clap::Parser;
use server::{assets::missing_precache_assets, cli::Cli, router};
use shared::*;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    load_dotenv()?;
    configure_tracing();

    let args = Cli::parse();
    debug!(?args);

    for path in missing_precache_assets(&args.assets_dir, PRECACHE_MANIFEST) {
        warn!("precached {path} is missing from {:?}, worker installs will fail", args.assets_dir);
    }
    for url in [SERVICE_WORKER_URL, SERVICE_WORKER_BINDINGS_URL] {
        if !args.assets_dir.join(url.trim_start_matches('/')).is_file() {
            warn!("{url} is missing from {:?}, the worker can't register", args.assets_dir);
        }
    }

    let socket = SocketAddr::new(IpAddr::from_str(&args.bind_addr)?, args.port);

    let listener = TcpListener::bind(socket).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(&args.assets_dir)).await?;

    Ok(())
}
