/// Main SnapCheck entry point for native builds
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use snapcheck::config::AppConfig;

    let config = AppConfig::load_from_default_path().unwrap_or_default();

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .init();

    match config.to_json() {
        Ok(json) => log::debug!("Effective configuration: {}", json),
        Err(e) => log::warn!("Failed to serialize configuration: {}", e),
    }

    if let Err(e) = snapcheck::native::run(config) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}
