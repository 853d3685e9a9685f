//! Core domain types and well-known names for jup2jek.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// File extension of Jupyter notebooks.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Folder name Jupyter uses for autosave snapshots. Never traversed.
pub const CHECKPOINT_DIR: &str = ".ipynb_checkpoints";

/// Suffix nbconvert appends to the notebook stem for its asset folder.
pub const ASSET_FOLDER_SUFFIX: &str = "_files";

/// Image embed prefix emitted by nbconvert for PNG outputs.
pub const IMAGE_EMBED_MARKER: &str = "![png](";

/// Liquid token Jekyll replaces with the deployed site's base URL.
pub const SITE_URL_PLACEHOLDER: &str = "{{ site.url }}";

// ---------------------------------------------------------------------------
// Notebook
// ---------------------------------------------------------------------------

/// A notebook found under the posts directory.
///
/// The converter's outputs sit next to it: `<stem>.md` and, when the
/// notebook has image outputs, a `<stem>_files` folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Notebook {
    path: PathBuf,
}

impl Notebook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the `.ipynb` file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without the `.ipynb` extension, lossily decoded for display.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory holding the notebook.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Where the converter writes the markdown.
    pub fn markdown_path(&self) -> PathBuf {
        self.path.with_extension("md")
    }

    /// Where the converter writes generated assets, if any.
    pub fn asset_folder_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.file_stem().unwrap_or_default());
        name.push(ASSET_FOLDER_SUFFIX);
        self.dir().join(name)
    }
}

impl std::fmt::Display for Notebook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
