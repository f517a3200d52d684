//! Resource pack loading from ZIP files and directories.

use super::texture::{load_texture_from_bytes, parse_mcmeta};
use super::{BlockModel, BlockstateDefinition, ResourcePack};
use crate::error::{ResolveError, Result};
use std::io::Read;
use std::path::Path;

/// Load a resource pack from a file path.
///
/// Supports both ZIP files and directories.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ResourcePack> {
    let path = path.as_ref();

    let pack = if path.is_dir() {
        load_from_directory(path)?
    } else {
        let data = std::fs::read(path)?;
        load_from_bytes(&data)?
    };

    log::info!(
        "Loaded resource pack {}: {} blockstates, {} models, {} textures",
        path.display(),
        pack.blockstate_count(),
        pack.model_count(),
        pack.texture_count()
    );
    Ok(pack)
}

/// Load a resource pack from bytes (ZIP data).
pub fn load_from_bytes(data: &[u8]) -> Result<ResourcePack> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;

    let mut pack = ResourcePack::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }

        let file_path = file.name().to_string();
        if let Some((namespace, asset_type, asset_path)) = parse_asset_path(&file_path) {
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            add_asset(&mut pack, namespace, asset_type, asset_path, &data);
        }
    }

    Ok(pack)
}

/// Load a resource pack from a directory.
fn load_from_directory(path: &Path) -> Result<ResourcePack> {
    let assets_path = path.join("assets");
    if !assets_path.is_dir() {
        return Err(ResolveError::InvalidResourcePack(format!(
            "No assets directory found in {}",
            path.display()
        )));
    }

    let mut pack = ResourcePack::new();
    let mut files = Vec::new();
    collect_files(&assets_path, &mut files)?;

    for file in files {
        let Ok(relative) = file.strip_prefix(path) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if let Some((namespace, asset_type, asset_path)) = parse_asset_path(&relative) {
            let data = std::fs::read(&file)?;
            add_asset(&mut pack, namespace, asset_type, asset_path, &data);
        }
    }

    Ok(pack)
}

fn collect_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Parse one file and add it to the pack. Unparseable files are skipped with a warning.
fn add_asset(pack: &mut ResourcePack, namespace: &str, asset_type: &str, asset_path: &str, data: &[u8]) {
    match asset_type {
        "blockstates" => {
            if let Some(block_id) = asset_path.strip_suffix(".json") {
                match serde_json::from_slice::<BlockstateDefinition>(data) {
                    Ok(def) => pack.add_blockstate(namespace, block_id, def),
                    Err(e) => log::warn!("Skipping blockstate {}:{}: {}", namespace, block_id, e),
                }
            }
        }
        "models" => {
            if let Some(model_path) = asset_path.strip_suffix(".json") {
                match serde_json::from_slice::<BlockModel>(data) {
                    Ok(model) => pack.add_model(namespace, model_path, model),
                    Err(e) => log::warn!("Skipping model {}:{}: {}", namespace, model_path, e),
                }
            }
        }
        "textures" => {
            if let Some(texture_path) = asset_path.strip_suffix(".png.mcmeta") {
                match parse_mcmeta(data) {
                    Ok(meta) => pack.add_animation(namespace, texture_path, meta),
                    Err(e) => log::warn!("Skipping mcmeta {}:{}: {}", namespace, texture_path, e),
                }
            } else if let Some(texture_path) = asset_path.strip_suffix(".png") {
                match load_texture_from_bytes(data) {
                    Ok(texture) => pack.add_texture(namespace, texture_path, texture),
                    Err(e) => log::warn!("Skipping texture {}:{}: {}", namespace, texture_path, e),
                }
            }
        }
        _ => {}
    }
}

/// Split `assets/{namespace}/{type}/{path}` into its parts.
fn parse_asset_path(file_path: &str) -> Option<(&str, &str, &str)> {
    let parts: Vec<&str> = file_path.splitn(4, '/').collect();

    if parts.len() >= 4 && parts[0] == "assets" {
        Some((parts[1], parts[2], parts[3]))
    } else {
        None
    }
}
