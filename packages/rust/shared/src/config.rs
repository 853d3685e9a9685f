//! Site configuration for jup2jek.
//!
//! The options file lives at `<site root>/jup2jek.ini` unless another path is
//! given, and holds a single `[JUP2JEK]` section:
//!
//! ```ini
//! [JUP2JEK]
//! posts = _posts
//! assets = assets/jupyter
//! ```
//!
//! Values may also be quoted (`posts = "_posts"`). Both paths are relative to
//! the site root. The assets directory is wiped on every conversion run, so it
//! must not hold anything but notebook assets.

use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::{Jup2JekError, Result};

/// Default options file name, looked up in the site root.
pub const OPTIONS_FILE_NAME: &str = "jup2jek.ini";

/// Section holding the options.
pub const OPTIONS_SECTION: &str = "JUP2JEK";

/// Default posts directory, relative to the site root.
pub const DEFAULT_POSTS_DIR: &str = "_posts";

/// Default assets directory, relative to the site root.
pub const DEFAULT_ASSETS_DIR: &str = "assets/jupyter";

const POSTS_KEY: &str = "posts";
const ASSETS_KEY: &str = "assets";

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// The `[JUP2JEK]` section. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Posts directory (notebook sources), relative to the site root.
    pub posts: String,

    /// Assets directory (relocated `_files` folders), relative to the site root.
    pub assets: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            posts: DEFAULT_POSTS_DIR.into(),
            assets: DEFAULT_ASSETS_DIR.into(),
        }
    }
}

impl SiteConfig {
    /// Resolve the posts directory against the site root.
    pub fn posts_path(&self, root: &Path) -> PathBuf {
        root.join(&self.posts)
    }

    /// Resolve the assets directory against the site root.
    pub fn assets_path(&self, root: &Path) -> PathBuf {
        root.join(&self.assets)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Work out which options file to read.
///
/// No path means `<root>/jup2jek.ini`. A path that does not exist as given is
/// tried relative to the site root.
pub fn resolve_options_path(root: &Path, options: Option<&Path>) -> PathBuf {
    match options {
        None => root.join(OPTIONS_FILE_NAME),
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => root.join(path),
    }
}

/// Load the site config for `root`, from `options` or the default file.
pub fn load_site_config(root: &Path, options: Option<&Path>) -> Result<SiteConfig> {
    let path = resolve_options_path(root, options);

    if !path.exists() {
        return Err(Jup2JekError::config(format!(
            "configuration file {} does not exist",
            path.display()
        )));
    }

    load_config_from(&path)
}

/// Load the site config from a specific options file.
pub fn load_config_from(path: &Path) -> Result<SiteConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| Jup2JekError::io(path, e))?;

    let config = parse_options(&content)
        .map_err(|e| Jup2JekError::config(format!("failed to parse {}: {e}", path.display())))?;

    tracing::debug!(?path, posts = %config.posts, assets = %config.assets, "loaded options");
    Ok(config)
}

/// Parse options file text. Errors are plain messages, prefixed with the
/// file name by the caller.
fn parse_options(content: &str) -> std::result::Result<SiteConfig, String> {
    let ini = Ini::load_from_str(content).map_err(|e| e.to_string())?;
    let section = ini
        .section(Some(OPTIONS_SECTION))
        .ok_or_else(|| format!("missing [{OPTIONS_SECTION}] section"))?;

    if let Some((key, _)) = section
        .iter()
        .find(|(key, _)| *key != POSTS_KEY && *key != ASSETS_KEY)
    {
        return Err(format!("unknown key `{key}` in [{OPTIONS_SECTION}]"));
    }

    let value = |key: &str| {
        section
            .get(key)
            .map(str::to_string)
            .ok_or_else(|| format!("missing `{key}` in [{OPTIONS_SECTION}]"))
    };

    Ok(SiteConfig {
        posts: value(POSTS_KEY)?,
        assets: value(ASSETS_KEY)?,
    })
}

/// Render a config as options file text.
pub fn render_options(config: &SiteConfig) -> Result<String> {
    let mut ini = Ini::new();
    ini.with_section(Some(OPTIONS_SECTION))
        .set(POSTS_KEY, config.posts.as_str())
        .set(ASSETS_KEY, config.assets.as_str());

    let mut buf = Vec::new();
    ini.write_to(&mut buf)
        .map_err(|e| Jup2JekError::config(format!("failed to render options: {e}")))?;
    String::from_utf8(buf)
        .map_err(|e| Jup2JekError::config(format!("failed to render options: {e}")))
}

/// Write `<dir>/jup2jek.ini` with the default options, replacing any
/// existing file. Returns the path written.
pub fn write_default_options(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(OPTIONS_FILE_NAME);
    let content = render_options(&SiteConfig::default())?;

    std::fs::write(&path, content).map_err(|e| Jup2JekError::io(&path, e))?;
    tracing::info!(?path, "wrote default options file");

    Ok(path)
}
