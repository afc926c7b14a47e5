mod options;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use uorfs_client::{AttributeQuery, Matcher, OciLayoutClient, PartialAttributeMatcher};
use uorfs_fuse::{UorFileSystem, UorfsConfig};

use crate::options::{Cli, Command, MountOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => UorfsConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => UorfsConfig::default(),
    };
    if let Some(level) = cli.loglevel {
        config.log = config.log.with_level(level);
    }

    match cli.command {
        Command::Version => {
            println!("uorfs {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Mount(opts) => {
            let _guard = uorfs_logging::init_logging(&config.log)?;
            mount(opts, config).await
        }
    }
}

async fn mount(opts: MountOptions, config: UorfsConfig) -> anyhow::Result<()> {
    let mountpoint = opts.validate()?;

    tracing::info!(reference = %opts.source, "resolving artifacts");
    let matcher: Option<PartialAttributeMatcher> = match &opts.attributes {
        Some(path) => Some(
            AttributeQuery::from_file(path)
                .and_then(AttributeQuery::into_matcher)
                .with_context(|| format!("reading attribute query {}", path.display()))?,
        ),
        None => None,
    };

    if !opts.configs.is_empty() || opts.insecure || opts.plain_http {
        tracing::info!(
            configs = opts.configs.len(),
            insecure = opts.insecure,
            plain_http = opts.plain_http,
            "registry transport flags only apply to remote registries, ignoring"
        );
    }
    if !opts.no_verify {
        tracing::info!(reference = %opts.source, "checking collection signature");
    }

    let fs = UorFileSystem::load(
        Arc::new(OciLayoutClient::new()),
        opts.source.clone(),
        matcher.as_ref().map(|m| m as &dyn Matcher),
        config,
    )
    .await
    .with_context(|| format!("loading collection {}", opts.source))?;

    serve(Arc::new(fs), &mountpoint).await
}

#[cfg(feature = "fuse")]
async fn serve(fs: Arc<UorFileSystem>, mountpoint: &std::path::Path) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Handle::current();
    let session = uorfs_fuse::mount::spawn_mount(fs, mountpoint, runtime)
        .with_context(|| format!("mounting at {}", mountpoint.display()))?;
    tracing::info!(mountpoint = %mountpoint.display(), "mounted collection");

    wait_for_shutdown_signal().await?;
    tracing::info!("unmounting");
    // Joining the session thread blocks, so keep it off the runtime workers.
    tokio::task::spawn_blocking(move || session.join())
        .await
        .context("unmount task failed")?;
    Ok(())
}

#[cfg(not(feature = "fuse"))]
async fn serve(_fs: Arc<UorFileSystem>, _mountpoint: &std::path::Path) -> anyhow::Result<()> {
    anyhow::bail!("uorfs was built without the `fuse` feature")
}

#[cfg(feature = "fuse")]
async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).context("registering SIGTERM handler")?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("listening for CTRL+C")?;
            tracing::info!("received CTRL+C");
        }
        _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
    }
    Ok(())
}
