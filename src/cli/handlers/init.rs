use std::path::Path;

use crate::backend::FileBackend;
use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::model::config::AppConfig;

/// Write a default config (unless one exists) and create an empty store.
pub fn cmd_init(
    args: InitArgs,
    config_path: &Path,
    store_override: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let wrote_config = if config_path.exists() && !args.force {
        false
    } else {
        let mut config = AppConfig::default();
        config.store.path = store_override.map(Path::to_path_buf);
        config_io::write_config(config_path, &config)?;
        true
    };

    let config = config_io::load_config(config_path);
    let store_path = match store_override {
        Some(path) => path.to_path_buf(),
        None => config_io::store_path(&config),
    };
    let created_store = FileBackend::init(&store_path)?;

    let status = |done: bool| if done { "created" } else { "exists" };
    println!("config: {} ({})", config_path.display(), status(wrote_config));
    println!("store:  {} ({})", store_path.display(), status(created_store));
    Ok(())
}
