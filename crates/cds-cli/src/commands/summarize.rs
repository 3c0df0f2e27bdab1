use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use cds_core::to_canonical_json_bytes;
use cds_report::{read_results, summarize};
use clap::Args;

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Export or registry CSV.
    #[arg(long)]
    pub input: PathBuf,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &SummarizeArgs) -> Result<(), Box<dyn Error>> {
    let records = read_results(&args.input)?;
    let report = summarize(&records);
    let mut stdout = io::stdout();
    if args.json {
        stdout.write_all(&to_canonical_json_bytes(&report)?)?;
    } else {
        write!(stdout, "{report}")?;
    }
    Ok(())
}
