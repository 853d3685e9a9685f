//! End-to-end conversion pass: reset assets → discover → convert → relocate → rewrite.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use jup2jek_shared::{Notebook, Result, SiteConfig};

use crate::assets;
use crate::converter::NotebookConverter;

/// Where a notebook's asset folder went and how its markdown was patched.
#[derive(Debug, Clone)]
pub struct RelocatedAssets {
    /// New location of the `_files` folder under the assets directory.
    pub destination: PathBuf,
    /// Site-relative directory holding the folder, as used in links.
    pub url_path: String,
    /// Number of image links rewritten in the markdown.
    pub links_rewritten: usize,
}

/// Outcome for one notebook.
#[derive(Debug, Clone)]
pub struct ConvertedNotebook {
    pub notebook: Notebook,
    /// The generated markdown, next to the notebook.
    pub markdown: PathBuf,
    /// Present when the converter produced an asset folder.
    pub assets: Option<RelocatedAssets>,
}

/// Result of a full conversion pass.
#[derive(Debug)]
pub struct ConversionReport {
    /// Converted notebooks, in processing order.
    pub notebooks: Vec<ConvertedNotebook>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl ConversionReport {
    /// Number of asset folders moved into the assets directory.
    pub fn relocated_count(&self) -> usize {
        self.notebooks.iter().filter(|n| n.assets.is_some()).count()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a notebook is handed to the converter.
    fn notebook_started(&self, notebook: &Notebook, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &ConversionReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn notebook_started(&self, _notebook: &Notebook, _current: usize, _total: usize) {}
    fn done(&self, _report: &ConversionReport) {}
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives conversion of every notebook under a site's posts directory.
///
/// Notebooks are processed one at a time. The first failure aborts the pass;
/// notebooks already handled stay converted and the rest are left untouched.
/// Two passes must never run against the same site root at once, since each
/// starts by wiping the assets directory.
#[derive(Debug)]
pub struct Orchestrator<C> {
    root: PathBuf,
    config: SiteConfig,
    converter: C,
}

impl<C: NotebookConverter> Orchestrator<C> {
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig, converter: C) -> Self {
        Self {
            root: root.into(),
            config,
            converter,
        }
    }

    /// The site root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn posts_path(&self) -> PathBuf {
        self.config.posts_path(&self.root)
    }

    pub fn assets_path(&self) -> PathBuf {
        self.config.assets_path(&self.root)
    }

    /// Notebooks that a conversion pass would process.
    pub fn notebooks(&self) -> Result<Vec<Notebook>> {
        jup2jek_discovery::find_notebooks(&self.posts_path())
    }

    /// Run the full conversion pass.
    ///
    /// 1. Wipe and recreate the assets directory
    /// 2. Discover notebooks under the posts directory
    /// 3. For each notebook: convert, then relocate its `_files` folder and
    ///    rewrite the markdown's image links
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub async fn convert_all(&self, progress: &dyn ProgressReporter) -> Result<ConversionReport> {
        let start = Instant::now();
        let posts = self.posts_path();
        let assets_dir = self.assets_path();

        progress.phase("Resetting assets directory");
        assets::reset_assets_dir(&assets_dir).await?;

        progress.phase("Discovering notebooks");
        let notebooks = jup2jek_discovery::find_notebooks(&posts)?;
        let total = notebooks.len();

        progress.phase("Converting notebooks");
        let mut converted = Vec::with_capacity(total);
        for (i, notebook) in notebooks.into_iter().enumerate() {
            progress.notebook_started(&notebook, i + 1, total);
            converted.push(self.convert_notebook(notebook, &posts, &assets_dir).await?);
        }

        let report = ConversionReport {
            notebooks: converted,
            elapsed: start.elapsed(),
        };
        progress.done(&report);

        info!(
            notebooks = report.notebooks.len(),
            relocated = report.relocated_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "conversion pass complete"
        );

        Ok(report)
    }

    /// Convert one notebook and move its assets, if it produced any.
    #[instrument(skip_all, fields(notebook = %notebook))]
    async fn convert_notebook(
        &self,
        notebook: Notebook,
        posts: &Path,
        assets_dir: &Path,
    ) -> Result<ConvertedNotebook> {
        self.converter.convert(&notebook).await?;

        let markdown = notebook.markdown_path();
        let origin = notebook.asset_folder_path();

        if !origin.is_dir() {
            debug!("no asset folder generated");
            info!(markdown = %markdown.display(), "converted notebook");
            return Ok(ConvertedNotebook {
                notebook,
                markdown,
                assets: None,
            });
        }

        // Resolve the link prefix before anything moves.
        let destination = assets::asset_destination(&origin, posts, assets_dir)?;
        // Links are `<stem>_files/<image>`, so the prefix is the folder's parent.
        let parent = destination.parent().unwrap_or(assets_dir);
        let url_path = assets::site_relative_url_path(parent, &self.root)?;

        assets::relocate_asset_folder(&origin, &destination).await?;
        let links_rewritten = jup2jek_markdown::rewrite_markdown_file(&markdown, &url_path)?;

        info!(
            markdown = %markdown.display(),
            assets = %destination.display(),
            links_rewritten,
            "converted notebook"
        );

        Ok(ConvertedNotebook {
            notebook,
            markdown,
            assets: Some(RelocatedAssets {
                destination,
                url_path,
                links_rewritten,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use jup2jek_shared::{Jup2JekError, write_default_options};
    use uuid::Uuid;

    /// In-process stand-in for nbconvert.
    ///
    /// Writes `<stem>.md` and, for stems with images, a `<stem>_files` folder
    /// holding them plus matching `![png](...)` links.
    #[derive(Default)]
    struct ScriptedConverter {
        images: HashMap<String, Vec<String>>,
        fail_on: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedConverter {
        fn with_images(mut self, stem: &str, images: &[&str]) -> Self {
            self.images
                .insert(stem.into(), images.iter().map(|s| s.to_string()).collect());
            self
        }

        fn failing_on(mut self, stem: &str) -> Self {
            self.fail_on = Some(stem.into());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl NotebookConverter for ScriptedConverter {
        async fn convert(&self, notebook: &Notebook) -> Result<()> {
            let stem = notebook.stem();
            self.calls.lock().unwrap().push(stem.clone());

            if self.fail_on.as_deref() == Some(stem.as_str()) {
                return Err(Jup2JekError::conversion(notebook.path(), "exit status: 1"));
            }

            let mut md = format!("# {stem}\n\nSome text.\n");
            if let Some(images) = self.images.get(&stem) {
                let folder = notebook.asset_folder_path();
                std::fs::create_dir_all(&folder).unwrap();
                for image in images {
                    std::fs::write(folder.join(image), b"png").unwrap();
                    md.push_str(&format!("\n![png]({stem}_files/{image})\n"));
                }
            }
            std::fs::write(notebook.markdown_path(), md).unwrap();
            Ok(())
        }
    }

    fn site_with(notebooks: &[&str]) -> PathBuf {
        let root = std::env::temp_dir().join(format!("j2j-site-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&root).unwrap();
        write_default_options(&root).unwrap();
        for nb in notebooks {
            let path = root.join("_posts").join(nb);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "{}").unwrap();
        }
        root
    }

    fn orchestrator(root: &Path, converter: ScriptedConverter) -> Orchestrator<ScriptedConverter> {
        let config = jup2jek_shared::load_site_config(root, None).unwrap();
        Orchestrator::new(root, config, converter)
    }

    #[tokio::test]
    async fn test_notebook_without_assets() {
        let root = site_with(&["example1.ipynb"]);
        let orch = orchestrator(&root, ScriptedConverter::default());

        let report = orch.convert_all(&SilentProgress).await.unwrap();

        assert_eq!(report.notebooks.len(), 1);
        assert_eq!(report.relocated_count(), 0);
        assert!(root.join("_posts/example1.md").is_file());
        let assets = root.join("assets/jupyter");
        assert!(assets.is_dir());
        assert_eq!(std::fs::read_dir(&assets).unwrap().count(), 0);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_assets_relocated_and_links_rewritten() {
        let root = site_with(&["example2.ipynb"]);
        let converter = ScriptedConverter::default().with_images("example2", &["img1.png"]);
        let orch = orchestrator(&root, converter);

        let report = orch.convert_all(&SilentProgress).await.unwrap();

        assert!(!root.join("_posts/example2_files").exists());
        assert!(root.join("assets/jupyter/example2_files/img1.png").is_file());

        let md = std::fs::read_to_string(root.join("_posts/example2.md")).unwrap();
        assert!(md.contains("![png]({{ site.url }}/assets/jupyter/example2_files/img1.png)"));
        assert!(!md.contains("](example2_files/"));

        let relocated = report.notebooks[0].assets.as_ref().unwrap();
        assert_eq!(relocated.url_path, "assets/jupyter");
        assert_eq!(relocated.links_rewritten, 1);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_category_subpath_preserved() {
        let root = site_with(&["category1/example4.ipynb"]);
        let converter =
            ScriptedConverter::default().with_images("example4", &["a.png", "b.png"]);
        let orch = orchestrator(&root, converter);

        orch.convert_all(&SilentProgress).await.unwrap();

        let dest = root.join("assets/jupyter/category1/example4_files");
        assert!(dest.join("a.png").is_file());
        assert!(dest.join("b.png").is_file());
        assert!(!root.join("_posts/category1/example4_files").exists());

        let md = std::fs::read_to_string(root.join("_posts/category1/example4.md")).unwrap();
        assert!(md.contains(
            "![png]({{ site.url }}/assets/jupyter/category1/example4_files/a.png)"
        ));
        assert!(md.contains(
            "![png]({{ site.url }}/assets/jupyter/category1/example4_files/b.png)"
        ));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_notebooks() {
        let root = site_with(&["example1.ipynb", "example2.ipynb", "example3.ipynb"]);
        let converter = ScriptedConverter::default()
            .with_images("example1", &["img1.png"])
            .failing_on("example2");
        let orch = orchestrator(&root, converter);

        let err = orch.convert_all(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, Jup2JekError::Conversion { .. }));

        // Notebooks before the failure are fully processed.
        assert!(root.join("_posts/example1.md").is_file());
        assert!(root.join("assets/jupyter/example1_files/img1.png").is_file());
        // Nothing after it is touched.
        assert!(!root.join("_posts/example3.md").exists());
        assert_eq!(orch.converter.calls(), vec!["example1", "example2"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_checkpoints_are_not_converted() {
        let root = site_with(&[
            "example1.ipynb",
            ".ipynb_checkpoints/example1-checkpoint.ipynb",
        ]);
        let orch = orchestrator(&root, ScriptedConverter::default());
        assert_eq!(orch.notebooks().unwrap().len(), 1);

        let report = orch.convert_all(&SilentProgress).await.unwrap();

        assert_eq!(report.notebooks.len(), 1);
        assert_eq!(orch.converter.calls(), vec!["example1"]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_rerun_clears_stale_assets() {
        let root = site_with(&["example2.ipynb"]);
        let stale = root.join("assets/jupyter/stale_files");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("old.png"), b"png").unwrap();

        let converter = ScriptedConverter::default().with_images("example2", &["img1.png"]);
        let orch = orchestrator(&root, converter);
        orch.convert_all(&SilentProgress).await.unwrap();

        assert!(!stale.exists());
        assert!(root.join("assets/jupyter/example2_files/img1.png").is_file());

        // A second pass reconverts and relocates again from scratch.
        orch.convert_all(&SilentProgress).await.unwrap();
        assert!(root.join("assets/jupyter/example2_files/img1.png").is_file());
        let md = std::fs::read_to_string(root.join("_posts/example2.md")).unwrap();
        assert_eq!(md.matches("{{ site.url }}").count(), 1);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_assets_outside_site_root_leave_folder_in_place() {
        let root = site_with(&["example2.ipynb"]);
        let outside = std::env::temp_dir().join(format!("j2j-outside-{}", Uuid::now_v7()));
        let config = SiteConfig {
            assets: outside.to_string_lossy().into_owned(),
            ..SiteConfig::default()
        };
        let converter = ScriptedConverter::default().with_images("example2", &["img1.png"]);
        let orch = Orchestrator::new(&root, config, converter);

        let err = orch.convert_all(&SilentProgress).await.unwrap_err();
        assert!(matches!(err, Jup2JekError::Validation { .. }), "got {err}");

        // Nothing moved, so the untouched links still point at the folder.
        assert!(root.join("_posts/example2_files/img1.png").is_file());
        assert!(!outside.join("example2_files").exists());
        let md = std::fs::read_to_string(root.join("_posts/example2.md")).unwrap();
        assert!(md.contains("![png](example2_files/img1.png)"));

        let _ = std::fs::remove_dir_all(&root);
        let _ = std::fs::remove_dir_all(&outside);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_end_to_end_with_subprocess_converter() {
        use crate::converter::NbConvert;

        let root = site_with(&["category1/example4.ipynb"]);
        // Mimics nbconvert: markdown plus a `_files` folder with one image.
        let script = r#"
            base="${1%.ipynb}"
            stem="$(basename "$base")"
            mkdir -p "${base}_files"
            : > "${base}_files/output_1_0.png"
            printf '![png](%s_files/output_1_0.png)\n' "$stem" > "$base.md"
        "#;
        let config = jup2jek_shared::load_site_config(&root, None).unwrap();
        let orch = Orchestrator::new(&root, config, NbConvert::new("sh", ["-c", script, "sh"]));

        let report = orch.convert_all(&SilentProgress).await.unwrap();
        assert_eq!(report.relocated_count(), 1);

        let md = std::fs::read_to_string(root.join("_posts/category1/example4.md")).unwrap();
        assert_eq!(
            md.trim(),
            "![png]({{ site.url }}/assets/jupyter/category1/example4_files/output_1_0.png)"
        );

        let _ = std::fs::remove_dir_all(&root);
    }
}
