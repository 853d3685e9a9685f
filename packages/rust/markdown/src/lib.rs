//! Asset link rewriting for nbconvert markdown output.
//!
//! nbconvert embeds image outputs as `![png](<stem>_files/<image>)`, relative
//! to the notebook. Once the `_files` folder has been moved into the site's
//! assets directory those links are prefixed with the site URL placeholder and
//! the folder's new location, e.g.
//! `![png]({{ site.url }}/assets/jupyter/example2_files/output_1_0.png)`.
//!
//! The rewrite is a literal substring replacement of the embed marker. Nothing
//! else in the document is parsed or touched.

use std::path::Path;

use tracing::{debug, instrument};

use jup2jek_shared::{IMAGE_EMBED_MARKER, Jup2JekError, Result, SITE_URL_PLACEHOLDER};

/// Prefix that replaces the embed marker.
///
/// `rel_assets` is the site-relative directory that now holds the `_files`
/// folder, with `/` separators.
pub fn asset_link_prefix(rel_assets: &str) -> String {
    let rel = rel_assets.trim_matches('/');
    if rel.is_empty() {
        format!("{IMAGE_EMBED_MARKER}{SITE_URL_PLACEHOLDER}/")
    } else {
        format!("{IMAGE_EMBED_MARKER}{SITE_URL_PLACEHOLDER}/{rel}/")
    }
}

/// Rewrite every image embed marker in `md` to point under `rel_assets`.
pub fn rewrite_asset_links(md: &str, rel_assets: &str) -> String {
    md.replace(IMAGE_EMBED_MARKER, &asset_link_prefix(rel_assets))
}

/// Rewrite the markdown file at `path` in place.
///
/// Returns the number of links rewritten. The file is only written back when
/// at least one marker was found.
#[instrument(skip_all, fields(path = %path.display(), rel_assets))]
pub fn rewrite_markdown_file(path: &Path, rel_assets: &str) -> Result<usize> {
    let md = std::fs::read_to_string(path).map_err(|e| Jup2JekError::io(path, e))?;

    let count = md.matches(IMAGE_EMBED_MARKER).count();
    if count == 0 {
        debug!("no image links to rewrite");
        return Ok(0);
    }

    let rewritten = rewrite_asset_links(&md, rel_assets);
    std::fs::write(path, rewritten).map_err(|e| Jup2JekError::io(path, e))?;

    debug!(count, "rewrote image links");
    Ok(count)
}
