use std::{
    env,
    fs::{create_dir_all, read, read_to_string, write},
    path::{Path, PathBuf},
    process::Command,
    time::Instant,
};

use anyhow::{bail, Context};
use base64::{display::Base64Display, engine::general_purpose::STANDARD};
use shared::SERVICE_WORKER_BINDINGS_URL;

const WORKER_PACKAGE: &str = "service-worker";
const WORKER_LIB_NAME: &str = "service_worker";
const WASM_PROFILE: &str = "wasm-release";
const WASM_TARGET: &str = "wasm32-unknown-unknown";

macro_rules! p {
    ($($tokens: tt)*) => {
        println!("cargo:warning=\r\x1b[32;1m   {}", format!($($tokens)*))
    }
}

// Runs cargo rustc to build the worker lib as wasm
fn build_wasm(target_dir: &Path) -> Result<PathBuf, anyhow::Error> {
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let mut cargo_cmd = Command::new(cargo);
    cargo_cmd.args([
        "rustc",
        "--package",
        WORKER_PACKAGE,
        "--lib",
        "--crate-type",
        "cdylib",
        "--target",
        WASM_TARGET,
        "--profile",
        WASM_PROFILE,
        "--target-dir",
    ]);
    cargo_cmd.arg(target_dir);

    let start = Instant::now();
    p!("Building {WORKER_PACKAGE} wasm");
    let status = cargo_cmd.status().context("running cargo")?;
    if !status.success() {
        bail!("cargo rustc exited with {status}");
    }
    p!(
        "Building {WORKER_PACKAGE} wasm took {:.2}s",
        start.elapsed().as_secs_f32()
    );

    let wasm_file = target_dir
        .join(WASM_TARGET)
        .join(WASM_PROFILE)
        .join(format!("{WORKER_LIB_NAME}.wasm"));
    if !wasm_file.exists() {
        bail!("Wasm file doesn't exist after running cargo rustc. Should be at {wasm_file:?}");
    }
    Ok(wasm_file)
}

// Runs bindgen on the wasm lib to create the bg wasm + the no-modules js
fn generate_bindings(input: &Path, out_dir: &Path) -> Result<(PathBuf, PathBuf), anyhow::Error> {
    let start = Instant::now();
    p!("Generating bindings for {WORKER_PACKAGE} wasm");

    let mut bg = wasm_bindgen_cli_support::Bindgen::new();
    // Module workers aren't supported everywhere yet
    bg.no_modules(true)?;
    bg.input_path(input)
        .typescript(false)
        .remove_name_section(true)
        .remove_producers_section(true)
        .omit_default_module_path(false)
        .generate(out_dir)?;

    p!(
        "Generating bindings for {WORKER_PACKAGE} wasm took: {:.2}s",
        start.elapsed().as_secs_f32()
    );

    let js_file = out_dir.join(format!("{WORKER_LIB_NAME}.js"));
    let bg_file = out_dir.join(format!("{WORKER_LIB_NAME}_bg.wasm"));
    if !js_file.exists() {
        bail!("Bindgen js file doesn't exist after running wasm-bindgen. Should be at {js_file:?}");
    }
    if !bg_file.exists() {
        bail!("Bindgen wasm file doesn't exist after running wasm-bindgen. Should be at {bg_file:?}");
    }
    Ok((bg_file, js_file))
}

fn build_worker(
    out_dir: &Path,
    register_listeners_js: &Path,
    bindings_out: &Path,
) -> Result<(), anyhow::Error> {
    let wasm_file = build_wasm(&out_dir.join("target")).context("build_wasm")?;

    let bindgen_dir = out_dir.join("bindgen");
    create_dir_all(&bindgen_dir).context("create_dir_all[bindgen_dir]")?;
    let (bg_file, js_file) =
        generate_bindings(&wasm_file, &bindgen_dir).context("generate_bindings")?;

    // Embed the wasm as base64 in the bindings so an installed worker can
    // start offline without extra cache logic in js
    let wasm_base64 = Base64Display::new(&read(&bg_file)?, &STANDARD).to_string();
    let snippet = read_to_string(register_listeners_js)?.replace("SERVICE_WORKER_BASE64", &wasm_base64);
    let bindings = read_to_string(&js_file)? + &snippet;

    if let Some(dir) = bindings_out.parent() {
        create_dir_all(dir).context("create_dir_all[bindings_out]")?;
    }
    write(bindings_out, bindings).context("write[bindings_out]")?;
    p!("Wrote {bindings_out:?}");

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let crates_dir = manifest_dir.join("..");
    let worker_dir = crates_dir.join(WORKER_PACKAGE);
    let register_listeners_js = worker_dir.join("register_listeners.js");

    println!("cargo:rerun-if-changed={}", worker_dir.display());
    println!("cargo:rerun-if-changed={}", crates_dir.join("shared").join("src").display());
    println!("cargo:rerun-if-env-changed=SKIP_WORKER_BUILD");

    if !register_listeners_js.exists() {
        bail!("register_listeners.js missing, expected path: {register_listeners_js:?}");
    }

    if env::var_os("SKIP_WORKER_BUILD").is_some() {
        p!("SKIP_WORKER_BUILD is set, leaving the worker bindings as they are");
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let bindings_out = manifest_dir
        .join("../../public")
        .join(SERVICE_WORKER_BINDINGS_URL.trim_start_matches('/'));

    // The server itself doesn't need the bindings, so a host without the
    // wasm target still builds; the server reports them missing at runtime.
    if let Err(e) = build_worker(&out_dir, &register_listeners_js, &bindings_out) {
        p!("Worker bindings weren't rebuilt: {e:#}");
    }

    p!("Done");
    Ok(())
}
