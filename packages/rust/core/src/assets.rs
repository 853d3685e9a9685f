//! Assets directory lifecycle and `_files` folder relocation.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use jup2jek_shared::{Jup2JekError, Result};

/// Delete the assets directory (if any) and recreate it empty.
///
/// Everything under `path` is lost, including files this tool did not put
/// there.
pub async fn reset_assets_dir(path: &Path) -> Result<()> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| Jup2JekError::io(path, e))?;

    if exists {
        debug!(path = %path.display(), "removing assets directory");
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|e| Jup2JekError::io(path, e))?;
    }

    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| Jup2JekError::io(path, e))?;

    Ok(())
}

/// Where an asset folder belongs under the assets directory: the same path
/// it has relative to the posts directory.
///
/// `_posts/category1/example4_files` maps to
/// `<assets>/category1/example4_files`.
pub fn asset_destination(
    origin: &Path,
    posts_root: &Path,
    assets_root: &Path,
) -> Result<PathBuf> {
    let rel = origin.strip_prefix(posts_root).map_err(|_| {
        Jup2JekError::validation(format!(
            "asset folder {} is not inside the posts directory {}",
            origin.display(),
            posts_root.display()
        ))
    })?;
    Ok(assets_root.join(rel))
}

/// Move an asset folder to `destination`, creating its parent first.
pub async fn relocate_asset_folder(origin: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Jup2JekError::io(parent, e))?;
    }

    tokio::fs::rename(origin, destination)
        .await
        .map_err(|e| Jup2JekError::io(origin, e))?;

    info!(from = %origin.display(), to = %destination.display(), "relocated asset folder");
    Ok(())
}

/// `dir` relative to the site root, as a `/`-separated URL path.
pub fn site_relative_url_path(dir: &Path, root: &Path) -> Result<String> {
    let rel = dir.strip_prefix(root).map_err(|_| {
        Jup2JekError::validation(format!(
            "{} is not inside the site root {}",
            dir.display(),
            root.display()
        ))
    })?;

    let segments: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();

    Ok(segments.join("/"))
}
