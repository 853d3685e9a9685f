//! Notebook discovery under the posts directory.
//!
//! Walks the posts tree and collects every `.ipynb` file. Jupyter's
//! `.ipynb_checkpoints` folders hold autosave copies of the real notebooks, so
//! those subtrees are pruned before descending into them.

use std::path::Path;

use jup2jek_shared::{CHECKPOINT_DIR, Jup2JekError, NOTEBOOK_EXTENSION, Notebook, Result};
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

/// Find all notebooks under `posts`, in lexical directory order.
///
/// A missing posts directory yields no notebooks.
#[instrument(skip_all, fields(posts = %posts.display()))]
pub fn find_notebooks(posts: &Path) -> Result<Vec<Notebook>> {
    if !posts.is_dir() {
        warn!("posts directory does not exist, nothing to convert");
        return Ok(Vec::new());
    }

    let mut notebooks = Vec::new();

    let walker = WalkDir::new(posts)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_checkpoint_dir(e));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(posts).to_path_buf();
            match e.into_io_error() {
                Some(source) => Jup2JekError::io(path, source),
                None => Jup2JekError::validation(format!(
                    "filesystem loop while walking {}",
                    path.display()
                )),
            }
        })?;

        if entry.file_type().is_file() && is_notebook(entry.path()) {
            notebooks.push(Notebook::new(entry.into_path()));
        }
    }

    info!(count = notebooks.len(), "notebooks discovered");
    Ok(notebooks)
}

/// Whether the path has the notebook extension.
pub fn is_notebook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == NOTEBOOK_EXTENSION)
        .unwrap_or(false)
}

fn is_checkpoint_dir(entry: &DirEntry) -> bool {
    let skip = entry.file_type().is_dir() && entry.file_name() == CHECKPOINT_DIR;
    if skip {
        debug!(path = %entry.path().display(), "skipping checkpoint folder");
    }
    skip
}
