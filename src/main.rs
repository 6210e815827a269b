use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use dokuwiki2git::config::Settings;
use dokuwiki2git::{convert, logger, VerbosityLevel};

#[derive(Parser)]
#[command(name = "dokuwiki2git")]
#[command(about = "Convert a DokuWiki data directory into a git repository with full page history", long_about = None)]
#[command(version)]
struct Cli {
    /// DokuWiki data directory (the one containing `_dummy`, `meta/`, `attic/`)
    datadir: PathBuf,

    /// Directory to create the repository in [default: gitdir]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only show warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show every step
    #[arg(short, long)]
    verbose: bool,

    /// Extension appended to page files [default: .txt]
    #[arg(short, long)]
    extension: Option<String>,

    /// Convert pages to this pandoc output format (failures keep the wiki text)
    #[arg(short, long, value_name = "FORMAT")]
    convert: Option<String>,

    /// User directory file [default: <DATADIR>/../conf/users.auth.php]
    #[arg(long)]
    users: Option<PathBuf>,

    /// Settings file [default: config.toml in the config directory]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the planned steps as JSON instead of converting
    #[arg(long)]
    dry_run: bool,

    /// Run `git gc` after the conversion
    #[arg(long)]
    gc: bool,
}

impl Cli {
    /// Apply command-line overrides on top of file settings
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(extension) = &self.extension {
            settings.extension = extension.clone();
        }
        if let Some(format) = &self.convert {
            settings.convert_format = Some(format.clone());
        }
        if let Some(users) = &self.users {
            settings.users_file = Some(users.clone());
        }
        if self.gc {
            settings.gc = true;
        }
        settings
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = VerbosityLevel::from_flags(cli.quiet, cli.verbose);

    logger::rotate_log_if_needed()?;
    logger::init_logger(verbosity.level_filter())?;

    let settings = cli.apply(Settings::load(cli.config.as_deref())?);
    log::debug!("Effective settings: {settings:?}");

    convert::run(&cli.datadir, &settings, cli.dry_run, verbosity)
}
