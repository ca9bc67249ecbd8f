use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use css_inject_rs::dist::{apply_changes, diff, load_dir};
use css_inject_rs::{
    ArtifactSet, BuildContext, BuildMode, CssInjectionPlugin, InjectionConfig, PassReport,
};
use itertools::Itertools;
use log::info;

/// css-inject: A utility for moving the CSS of a build output into its JavaScript chunks
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Build output directories (or JSON manifests with --manifest). Several
    /// inputs are treated as the stages of one build, so CSS found in an
    /// earlier one is also injected into later ones
    #[clap(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Path to a JSON config file (topExecutionPriority, styleId, injectInto)
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Id of the injected style element, also used to avoid inserting it twice
    #[clap(short, long)]
    pub style_id: Option<String>,

    /// Regular expression selecting the chunks to inject into. May be repeated.
    /// Defaults to the first chunk only
    #[clap(short = 'j', long = "inject-into")]
    pub inject_into: Vec<String>,

    /// Run the injected code after the chunk's own code instead of before it
    #[clap(short, long, conflicts_with = "top")]
    pub bottom: bool,

    /// Run the injected code before the chunk's own code (the default). Overrides
    /// `topExecutionPriority` from the config file
    #[clap(short, long)]
    pub top: bool,

    /// Treat the inputs as a server-side build and leave them unchanged
    #[clap(long)]
    pub ssr: bool,

    /// Inputs are JSON artifact manifests, rewritten in place
    #[clap(short, long)]
    pub manifest: bool,

    /// Report what would change without writing anything
    #[clap(short = 'n', long)]
    pub dry_run: bool,

    /// Log each step
    #[clap(short, long)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args: Args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "info" } else { "warn" }),
    )
    .init();

    // Flags take precedence over the config file
    let file_config = match &args.config {
        Some(path) => InjectionConfig::from_path(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => InjectionConfig::default(),
    };
    let flag_config = InjectionConfig {
        top_execution_priority: match (args.top, args.bottom) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
        style_id: args.style_id.clone(),
        inject_into: args.inject_into.clone(),
    };
    let options = file_config.merge(flag_config).into_options()?;
    info!("Using {options:?}");

    let plugin = CssInjectionPlugin::new(options);
    let mode = BuildMode { ssr: args.ssr };
    let mut ctx = BuildContext::new();

    for input in &args.inputs {
        if args.manifest {
            process_manifest(&plugin, &mut ctx, mode, input, args.dry_run).await?;
        } else {
            process_dir(&plugin, &mut ctx, mode, input, args.dry_run).await?;
        }
    }
    Ok(())
}

async fn process_dir(
    plugin: &CssInjectionPlugin,
    ctx: &mut BuildContext,
    mode: BuildMode,
    dir: &Path,
    dry_run: bool,
) -> Result<(), anyhow::Error> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    let before = load_dir(dir)
        .with_context(|| format!("Failed to read build output {}", dir.display()))?;
    let mut artifacts = before.clone();
    let report = plugin
        .generate_bundle(ctx, &mut artifacts, mode)
        .await
        .with_context(|| format!("CSS injection failed for {}", dir.display()))?;

    let changes = diff(&before, &artifacts);
    if !dry_run {
        apply_changes(dir, &artifacts, &changes)
            .with_context(|| format!("Failed to write build output {}", dir.display()))?;
    }
    print_report(dir, &report, dry_run);
    Ok(())
}

async fn process_manifest(
    plugin: &CssInjectionPlugin,
    ctx: &mut BuildContext,
    mode: BuildMode,
    path: &Path,
    dry_run: bool,
) -> Result<(), anyhow::Error> {
    let manifest = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let mut artifacts = ArtifactSet::from_json(&manifest)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
    let report = plugin
        .generate_bundle(ctx, &mut artifacts, mode)
        .await
        .with_context(|| format!("CSS injection failed for {}", path.display()))?;

    if !dry_run && !report.is_noop() {
        std::fs::write(path, artifacts.to_json(true)?)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
    }
    print_report(path, &report, dry_run);
    Ok(())
}

fn print_report(input: &Path, report: &PassReport, dry_run: bool) {
    if report.skipped {
        println!("{}: server-side build, skipped", input.display());
        return;
    }
    if report.is_noop() {
        println!("{}: nothing to do", input.display());
        return;
    }

    let prefix = if dry_run { "would " } else { "" };
    println!("{}:", input.display());
    if !report.removed_stylesheets.is_empty() {
        println!(
            "  {prefix}remove stylesheets: {}",
            report.removed_stylesheets.iter().join(", ")
        );
    }
    if !report.rewritten_documents.is_empty() {
        println!(
            "  {prefix}remove links from: {}",
            report.rewritten_documents.iter().join(", ")
        );
    }
    if !report.injected_chunks.is_empty() {
        println!(
            "  {prefix}inject CSS into: {}",
            report.injected_chunks.iter().join(", ")
        );
    }
}
