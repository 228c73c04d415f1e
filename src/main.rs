use anyhow::{Context, Result};
use asset_pipeline::compiler::{Compilation, Compiler};
use asset_pipeline::models::PluginOptions;
use asset_pipeline::plugins::{AssetUploader, SourceMapCleaner};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "asset-pipeline")]
#[command(about = "Publish build assets to object storage and strip source maps")]
struct CliArgs {
    /// Build output directory. Falls back to DIST_PATH, then `dist`.
    #[arg(value_name = "DIST")]
    dist: Option<PathBuf>,

    /// Log what would happen without uploading or deleting anything.
    #[arg(long)]
    dry_run: bool,

    /// Do not upload assets even when storage is configured.
    #[arg(long)]
    skip_upload: bool,

    /// Leave `.js.map` files in the output directory.
    #[arg(long)]
    keep_source_maps: bool,
}

fn resolve_options(args: &CliArgs, mut options: PluginOptions) -> PluginOptions {
    if let Some(dist) = &args.dist {
        options.dist_path = Some(dist.clone());
    }
    if options.dist_path.is_none() {
        options.dist_path = Some(PathBuf::from("dist"));
    }
    options.dry_run |= args.dry_run;
    options
}

async fn build_compiler(args: &CliArgs, options: &PluginOptions, dist: PathBuf) -> Result<Compiler> {
    let mut compiler = Compiler::for_existing_output(dist);

    if args.skip_upload {
        info!("Uploads disabled by --skip-upload");
    } else if options.storage.is_some() {
        compiler.apply(Arc::new(AssetUploader::from_options(options).await?));
    } else {
        info!("OSS_REGION not set, skipping asset upload");
    }

    if !args.keep_source_maps {
        compiler.apply(Arc::new(SourceMapCleaner::new(options)?));
    }

    Ok(compiler)
}

async fn run(args: CliArgs) -> Result<()> {
    let options = resolve_options(&args, PluginOptions::from_env()?);
    let dist = options
        .dist_path
        .clone()
        .context("output directory not configured")?;

    let compilation = Compilation::from_output_dir(&dist)
        .with_context(|| format!("Failed to read build output at {}", dist.display()))?;
    info!("Found {} assets in {}", compilation.len(), dist.display());

    let compiler = build_compiler(&args, &options, dist).await?;
    compiler.run(&compilation).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting asset-pipeline");

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => {
            info!("Asset pipeline completed");
            Ok(())
        }
        Err(e) => {
            error!("Asset pipeline failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
