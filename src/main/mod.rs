use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::{warn, LevelFilter};
use rankdb::{
    commands::{
        open_database, rankdb_features, rankdb_genes, rankdb_info, rankdb_load,
        DEFAULT_NOMENCLATURE,
    },
    prelude::RankDbError,
};

const INFO: &str = "\
rankdb: read whole-genome ranking databases
usage: rankdb [--help] <subcommand>

Subcommands:

  info: summarize a ranking database.
  features: list the features ranked in a database.
  genes: list the genes ranked in a database.
  load: write the ranking matrix, optionally for a gene signature only.

";

#[derive(Parser)]
#[clap(name = "rankdb")]
#[clap(about = INFO)]
struct Cli {
    /// increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct DatabaseArgs {
    /// the ranking database file
    #[arg(required = true)]
    database: PathBuf,

    /// a name for the database (defaults to the file name without extension)
    #[arg(long)]
    name: Option<String>,

    /// the gene nomenclature of the database
    #[arg(long, default_value = DEFAULT_NOMENCLATURE)]
    nomenclature: String,

    /// an optional output file (standard output will be used if not specified)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    Info {
        #[command(flatten)]
        db: DatabaseArgs,
    },
    Features {
        #[command(flatten)]
        db: DatabaseArgs,
    },
    Genes {
        #[command(flatten)]
        db: DatabaseArgs,
    },
    Load {
        #[command(flatten)]
        db: DatabaseArgs,

        /// a gene signature file (one gene per line, optional tab-separated
        /// weight); only these genes are loaded
        #[arg(long)]
        signature: Option<PathBuf>,

        /// also write the rankings to this .npy file (requires the 'npy' feature)
        #[arg(long)]
        npy: Option<PathBuf>,
    },
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run() -> Result<(), RankDbError> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let open = |args: &DatabaseArgs| {
        open_database(&args.database, args.name.as_deref(), &args.nomenclature)
    };

    let result = match &cli.command {
        Some(Commands::Info { db }) => rankdb_info(&open(db)?, db.output.as_ref()),
        Some(Commands::Features { db }) => rankdb_features(&open(db)?, db.output.as_ref()),
        Some(Commands::Genes { db }) => rankdb_genes(&open(db)?, db.output.as_ref()),
        Some(Commands::Load { db, signature, npy }) => rankdb_load(
            &open(db)?,
            signature.as_ref(),
            db.output.as_ref(),
            npy.as_ref(),
        ),
        None => {
            println!("{}\n", INFO);
            std::process::exit(1);
        }
    };
    let output = result?;
    for issue in output.report().issues() {
        warn!("{}", issue);
    }
    Ok(())
}

fn main() {
    match run() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
