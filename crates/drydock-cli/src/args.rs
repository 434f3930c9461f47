use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "drydock", version, about = "Load, migrate and upgrade ship-design documents")]
pub struct Cli {
    /// Engine configuration (JSON). Built-in defaults when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log pipeline stages and migration steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Catalog sources: a base file plus content-pack overlays in priority order.
#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Game-data catalog (JSON).
    #[arg(long)]
    pub catalog: PathBuf,

    /// Content-pack overlay, merged by id. Repeatable; later overlays win.
    #[arg(long = "overlay")]
    pub overlays: Vec<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load a design and print the outcome as JSON.
    Load {
        /// Design document path.
        doc: PathBuf,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Load a design and save it in the current schema.
    Upgrade {
        /// Design document path.
        doc: PathBuf,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run parse, version gate and migration only; print the migrated document.
    Migrate {
        /// Design document path.
        doc: PathBuf,
    },

    /// List the migration chain in execution order.
    Steps,
}
