//! Trinket record inspector.
//!
//! Usage:
//!   trinket show trinket-data/equipment/<owner>.dat
//!   trinket verify --root trinket-data --owner <owner>
//!   trinket recover --root trinket-data --owner <owner>
//!   trinket layouts config/layouts

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use trinket_host::report;
use trinket_model::LayoutLoader;
use trinket_storage::{codec, DurableStore, FileStatus, StoreConfig};
use trinket_types::OwnerId;

#[derive(Parser, Debug)]
#[command(name = "trinket")]
#[command(about = "Inspect and repair Trinket equipment records")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a single record file
    Show { file: PathBuf },
    /// List an owner's file set with digests and parse status
    Verify(OwnerArgs),
    /// Run the load path, including crash recovery and backup fallback
    Recover(OwnerArgs),
    /// Validate a directory of layout definitions
    Layouts { dir: PathBuf },
}

#[derive(ClapArgs, Debug)]
struct OwnerArgs {
    /// Data root directory
    #[arg(long, default_value = "trinket-data")]
    root: PathBuf,

    /// Record kind (subdirectory under the root)
    #[arg(long, default_value = "equipment")]
    kind: String,

    /// Owner UUID
    #[arg(long)]
    owner: OwnerId,
}

impl OwnerArgs {
    fn store(&self) -> DurableStore {
        DurableStore::new(StoreConfig::new(&self.root, self.kind.as_str()))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match args.command {
        Command::Show { file } => {
            let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let record = codec::decode(&file, &bytes)?;
            print!("{}", report::render_record(&record));
        }
        Command::Verify(owner) => {
            let store = owner.store();
            debug!("Inspecting {}", store.dir().display());
            let reports = store
                .inspect(owner.owner)
                .context("inspecting record files")?;
            print!("{}", report::render_reports(&reports));
            let corrupt = reports
                .iter()
                .filter(|r| matches!(r.status, FileStatus::Corrupt { .. }))
                .count();
            if corrupt > 0 {
                bail!("{corrupt} corrupt file(s)");
            }
        }
        Command::Recover(owner) => {
            let outcome = owner
                .store()
                .load(owner.owner)
                .context("loading record")?;
            print!("{}", report::render_load(&outcome));
        }
        Command::Layouts { dir } => {
            let loaded = LayoutLoader::load_dir(&dir)
                .with_context(|| format!("reading layouts from {}", dir.display()))?;
            print!("{}", report::render_layouts(&loaded));
            if !loaded.failures.is_empty() {
                bail!("{} layout(s) failed to parse", loaded.failures.len());
            }
        }
    }
    Ok(())
}
