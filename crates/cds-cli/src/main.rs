use std::error::Error;

use cds_cli::commands::{
    check::{self, CheckArgs},
    plan::{self, PlanArgs},
    run::{self, RunArgs},
    summarize::{self, SummarizeArgs},
};
use cds_cli::logging;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cds-survey", about = "Crossover clinical-decision survey")]
struct Cli {
    /// Log at debug level unless CDS_LOG is set.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run interactive survey sessions in the terminal.
    Run(RunArgs),
    /// Preview the trial sequence for a group.
    Plan(PlanArgs),
    /// Validate the question bank against the follow-up vocabulary.
    Check(CheckArgs),
    /// Summary statistics of a saved export or registry.
    Summarize(SummarizeArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Plan(args) => plan::run(&args),
        Command::Check(args) => check::run(&args),
        Command::Summarize(args) => summarize::run(&args),
    }
}
