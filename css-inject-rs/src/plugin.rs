use log::{debug, info};

use crate::aggregate::aggregate_css;
use crate::artifact::{Artifact, ArtifactSet};
use crate::classify::classify;
use crate::codegen::build_css_injection_code;
use crate::error::{CssInjectError, Result};
use crate::html::remove_link_stylesheets;
use crate::inject::{inject_into_chunks, select_target_chunks};
use crate::options::InjectionOptions;

/// What kind of build an artifact set came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildMode {
    /// Server-side builds are left untouched.
    pub ssr: bool,
}

/// State shared by the stages of a single build.
///
/// Builds that emit several bundles (for instance a legacy and a modern one)
/// run one pass per bundle. Only the first of those passes sees the
/// stylesheets, so the CSS it extracted is kept here and injected by the
/// later passes as well. Use a fresh context, or [`BuildContext::reset`],
/// for every new build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    css_to_inject: String,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// CSS captured by the most recent stage that found any.
    pub fn css_to_inject(&self) -> &str {
        &self.css_to_inject
    }

    pub fn reset(&mut self) {
        self.css_to_inject.clear();
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// The pass did nothing because the build was server-side.
    pub skipped: bool,
    pub removed_stylesheets: Vec<String>,
    pub rewritten_documents: Vec<String>,
    pub injected_chunks: Vec<String>,
}

impl PassReport {
    pub fn is_noop(&self) -> bool {
        self.removed_stylesheets.is_empty()
            && self.rewritten_documents.is_empty()
            && self.injected_chunks.is_empty()
    }
}

/// Moves the CSS of a bundle into its JavaScript.
///
/// # Examples
/// ```
/// use css_inject_rs::{Artifact, ArtifactSet, BuildContext, BuildMode, CssInjectionPlugin};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), css_inject_rs::CssInjectError> {
/// let mut bundle = ArtifactSet::new();
/// bundle.insert("main.js", Artifact::chunk("main.js", "main();"));
/// bundle.insert("main.css", Artifact::asset("main.css", "body{margin:0}"));
///
/// let plugin = CssInjectionPlugin::default();
/// let mut ctx = BuildContext::new();
/// let report = plugin
///     .generate_bundle(&mut ctx, &mut bundle, BuildMode::default())
///     .await?;
///
/// assert_eq!(report.removed_stylesheets, vec!["main.css"]);
/// assert!(!bundle.contains("main.css"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CssInjectionPlugin {
    options: InjectionOptions,
}

impl CssInjectionPlugin {
    pub fn new(options: InjectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InjectionOptions {
        &self.options
    }

    /// Run one pass over `artifacts`: remove every stylesheet, drop the
    /// `<link>` tags pointing at them, and inject their CSS into the selected
    /// chunks.
    ///
    /// An error leaves `artifacts` partially transformed; the build it
    /// belongs to must be abandoned.
    pub async fn generate_bundle(
        &self,
        ctx: &mut BuildContext,
        artifacts: &mut ArtifactSet,
        mode: BuildMode,
    ) -> Result<PassReport> {
        if mode.ssr {
            info!("Server-side build, leaving CSS assets in place");
            return Ok(PassReport {
                skipped: true,
                ..Default::default()
            });
        }

        let classification = classify(artifacts);
        debug!(
            "Found {} stylesheet(s), {} script chunk(s), {} document(s)",
            classification.css.len(),
            classification.js.len(),
            classification.html.len()
        );

        let css = aggregate_css(artifacts, &classification.css)?;
        if !css.is_empty() {
            ctx.css_to_inject = css;
        }

        let mut rewritten_documents = Vec::new();
        for name in &classification.html {
            if strip_document(artifacts, name, &classification.css)? {
                rewritten_documents.push(name.clone());
            }
        }

        let targets =
            select_target_chunks(&classification.js, self.options.should_inject_into.as_ref());
        let fragment = build_css_injection_code(&ctx.css_to_inject, &self.options.style_id).await?;
        let injected_chunks = inject_into_chunks(
            artifacts,
            &targets,
            fragment.as_ref(),
            self.options.top_execution_priority,
        )?;

        if fragment.is_some() && targets.is_empty() {
            info!("No chunk selected for CSS injection");
        }
        if !injected_chunks.is_empty() {
            info!(
                "Injected {} byte(s) of CSS into {} chunk(s)",
                ctx.css_to_inject.len(),
                injected_chunks.len()
            );
        }

        Ok(PassReport {
            skipped: false,
            removed_stylesheets: classification.css,
            rewritten_documents,
            injected_chunks,
        })
    }
}

/// Remove links to `css_names` from the document `name`. Returns whether the
/// document changed.
fn strip_document(artifacts: &mut ArtifactSet, name: &str, css_names: &[String]) -> Result<bool> {
    let source = match artifacts.get_mut(name) {
        Some(Artifact::Asset { source, .. }) => source,
        Some(Artifact::Chunk { .. }) => {
            return Err(CssInjectError::malformed(
                name,
                "expected an HTML asset, found a chunk",
            ))
        }
        None => return Ok(false),
    };

    let original = source
        .text()
        .map_err(|err| {
            CssInjectError::malformed(name, format!("document is not valid UTF-8: {err}"))
        })?
        .into_owned();
    let html = css_names.iter().fold(original.clone(), |html, css_name| {
        remove_link_stylesheets(&html, css_name)
    });

    if html == original {
        return Ok(false);
    }
    debug!("Removed stylesheet links from {name}");
    *source = html.into();
    Ok(true)
}
