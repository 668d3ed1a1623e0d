use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[clap(name = "pwa server")]
pub struct Cli {
    /// Directory holding the app shell, sw.js and the wasm bindings under wasm/
    #[clap(long, env, default_value = "public")]
    pub assets_dir: PathBuf,
    #[clap(long, env, default_value = "8080")]
    pub port: u16,
    #[clap(long, env, default_value = "127.0.0.1")]
    pub bind_addr: String,
}
