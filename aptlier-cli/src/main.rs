//! aptlier: snapshot, merge and publish Debian repositories with aptly.
//!
//! # Usage
//!
//! ```text
//! aptlier [GLOBAL FLAGS] init
//! aptlier add-key KEY [GPG ARGS...]
//! aptlier add-mirror NAME [ARGS...]
//! aptlier update [NAME...]
//! aptlier add REPO FILE...
//! aptlier list [--json]
//! aptlier publish
//! aptlier aptly ARGS...
//! aptlier gpg ARGS...
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};

use aptlier_core::Settings;
use commands::{
    add::AddArgs,
    init::InitArgs,
    key::AddKeyArgs,
    list::ListArgs,
    mirror::AddMirrorArgs,
    passthrough::PassthroughArgs,
    publish::PublishArgs,
    update::UpdateArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "aptlier",
    version,
    about = "Snapshot, merge and publish Debian repositories with aptly",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the trusted keyring and clean up the aptly database.
    Init(InitArgs),

    /// Import a signing key into the trusted keyring.
    #[command(alias = "add_key")]
    AddKey(AddKeyArgs),

    /// Create a mirror, fetch it and take its first snapshot.
    #[command(alias = "add_mirror")]
    AddMirror(AddMirrorArgs),

    /// Fetch mirrors and snapshot the ones that changed.
    #[command(aliases = ["update_mirror", "update-mirror"])]
    Update(UpdateArgs),

    /// Add package files to a local repo and snapshot it.
    #[command(aliases = ["add_package", "add-package"])]
    Add(AddArgs),

    /// List mirrors and repos with their recorded snapshots.
    List(ListArgs),

    /// Merge the latest snapshots and publish (or switch) the result.
    Publish(PublishArgs),

    /// Run aptly with this work directory's configuration.
    Aptly(PassthroughArgs),

    /// Run gpg against this work directory's keyring.
    Gpg(PassthroughArgs),

    /// Print usage.
    #[command(hide = true)]
    Usage,
}

// ---------------------------------------------------------------------------
// Global flags, layered over the settings file
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Directory holding aptly state, keys, settings and the snapshot file.
    #[arg(long, global = true, default_value = ".")]
    work_dir: PathBuf,

    /// aptly executable.
    #[arg(long, global = true, value_name = "COMMAND")]
    aptly_command: Option<String>,

    /// gpg executable (default: gpg1, then gpg, on PATH).
    #[arg(long, global = true, value_name = "COMMAND")]
    gpg_command: Option<String>,

    /// Distributor id used in PPA and packagecloud URLs.
    #[arg(long, global = true)]
    distributor: Option<String>,

    /// Default release, also the publish distribution.
    #[arg(long, global = true)]
    release: Option<String>,

    /// Publish target name.
    #[arg(long, global = true)]
    publish_name: Option<String>,

    /// Snapshot file, relative to the work directory.
    #[arg(long, global = true, value_name = "PATH")]
    snapshots_file: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(long, short, global = true)]
    quiet: bool,
}

impl GlobalArgs {
    fn settings(self) -> Result<Settings> {
        let mut settings = Settings::load_at(&self.work_dir).with_context(|| {
            format!("failed to load settings for '{}'", self.work_dir.display())
        })?;

        if let Some(command) = self.aptly_command {
            settings.aptly_command = command;
        }
        if self.gpg_command.is_some() {
            settings.gpg_command = self.gpg_command;
        }
        if let Some(distributor) = self.distributor {
            settings.distributor = distributor;
        }
        if let Some(release) = self.release {
            settings.release = release;
        }
        if let Some(publish_name) = self.publish_name {
            settings.publish_name = publish_name;
        }
        if let Some(snapshots_file) = self.snapshots_file {
            settings.snapshots_file = snapshots_file;
        }
        if self.quiet {
            settings.verbose = false;
        }
        Ok(settings)
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.global.settings()?;
    init_tracing(settings.verbose);

    match cli.command {
        Commands::Init(args) => args.run(settings),
        Commands::AddKey(args) => args.run(settings),
        Commands::AddMirror(args) => args.run(settings),
        Commands::Update(args) => args.run(settings),
        Commands::Add(args) => args.run(settings),
        Commands::List(args) => args.run(settings),
        Commands::Publish(args) => args.run(settings),
        Commands::Aptly(args) => args.run_aptly(settings),
        Commands::Gpg(args) => args.run_gpg(settings),
        Commands::Usage => {
            Cli::command()
                .print_long_help()
                .context("failed to print usage")?;
            Ok(())
        }
    }
}
