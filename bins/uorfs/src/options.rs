use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};

/// UOR FUSE driver
#[derive(Parser, Debug)]
#[command(name = "uorfs", version, about)]
pub struct Cli {
    /// Log level: debug, info, warn, error
    #[arg(short = 'l', long, global = true)]
    pub loglevel: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, env = "UORFS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mount a UOR collection based on content or attribute address
    Mount(MountOptions),
    /// Print the version and exit
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct MountOptions {
    /// Collection reference, e.g. `./layout:latest` or `./layout@sha256:...`
    #[arg(value_name = "SRC")]
    pub source: String,

    /// Directory to mount the collection on
    #[arg(value_name = "MOUNTPOINT")]
    pub mountpoint: Option<PathBuf>,

    /// Auth config paths when contacting registries
    #[arg(short = 'c', long = "configs")]
    pub configs: Vec<PathBuf>,

    /// Allow connections to SSL registries without certs
    #[arg(short = 'i', long)]
    pub insecure: bool,

    /// Use plain http and not https when contacting registries
    #[arg(long)]
    pub plain_http: bool,

    /// Output location for artifacts
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Attribute query config path
    #[arg(long)]
    pub attributes: Option<PathBuf>,

    /// Skip collection signature verification
    #[arg(long)]
    pub no_verify: bool,
}

impl MountOptions {
    /// Mount point to use. The positional argument wins over `--output`.
    pub fn target(&self) -> Option<&PathBuf> {
        self.mountpoint.as_ref().or(self.output.as_ref())
    }

    /// Checks that the mount point exists and is a directory.
    pub fn validate(&self) -> anyhow::Result<PathBuf> {
        let Some(target) = self.target() else {
            bail!("a mount point is required");
        };
        let meta = std::fs::metadata(target)
            .with_context(|| format!("cannot stat mount point {}", target.display()))?;
        if !meta.is_dir() {
            bail!("mount point must be a directory: {}", target.display());
        }
        Ok(target.clone())
    }
}
