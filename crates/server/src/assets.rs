use std::path::{Path, PathBuf};

/// The file `ServeDir` answers `path` with. Directory paths get their
/// index.html.
pub fn asset_path(assets_dir: &Path, path: &str) -> PathBuf {
    let relative = path.trim_start_matches('/');
    if relative.is_empty() || relative.ends_with('/') {
        assets_dir.join(relative).join("index.html")
    } else {
        assets_dir.join(relative)
    }
}

/// Manifest paths with no file behind them. Any of these makes every worker
/// install fail, since precaching is all or nothing.
pub fn missing_precache_assets<'a>(assets_dir: &Path, manifest: &[&'a str]) -> Vec<&'a str> {
    manifest
        .iter()
        .copied()
        .filter(|path| !asset_path(assets_dir, path).is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_directories_map_to_index() {
        let dir = Path::new("public");
        assert_eq!(asset_path(dir, "/"), dir.join("index.html"));
        assert_eq!(asset_path(dir, "/docs/"), dir.join("docs/index.html"));
        assert_eq!(asset_path(dir, "/style.css"), dir.join("style.css"));
    }

    #[test]
    fn everything_is_missing_from_a_missing_dir() {
        let manifest = ["/", "/offline.html"];
        let missing = missing_precache_assets(Path::new("does/not/exist"), &manifest);
        assert_eq!(missing, manifest);
    }
}
