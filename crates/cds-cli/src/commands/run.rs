use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use cds_bank::{BankStore, QuestionBank};
use cds_core::errors::SurveyError;
use cds_core::RngHandle;
use cds_report::{append_registry, export_results, sanitize_name, unused_path, RESULTS_PREFIX};
use cds_trial::{plan_session, Clock, MonotonicClock, Session, SessionManifest, SessionSnapshot};
use clap::Args;
use tracing::{info, warn};

use super::resolve_config;
use crate::config::SurveyConfig;
use crate::frontend::{SessionOutcome, Terminal};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// YAML survey configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Question bank (CSV or JSON); overrides the configured path.
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Output directory for exports and manifests.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Master seed for reproducible assignment.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Continue a saved session snapshot instead of starting a new one.
    #[arg(long)]
    pub resume: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(args, stdin.lock(), stdout.lock())?;
    Ok(())
}

/// Runs sessions against the given terminal streams and returns the paths of
/// the exports written.
pub fn run_with<R: BufRead, W: Write>(
    args: &RunArgs,
    input: R,
    output: W,
) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut config = resolve_config(args.config.as_deref(), args.data.as_ref())?;
    if let Some(out) = &args.out {
        config.output_dir = out.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    let mut terminal = Terminal::new(input, output);
    let store = BankStore::new(config.data_path()?);
    let bank = match store.get_or_load() {
        Ok(bank) => bank,
        Err(err) => {
            terminal.say(format!("! {}", err.info().message))?;
            return Err(Box::new(err));
        }
    };
    let fingerprint = bank.fingerprint()?;
    let mut exports = Vec::new();

    if let Some(snapshot_path) = &args.resume {
        let snapshot = SessionSnapshot::load(snapshot_path)?;
        let resumed = Session::resume(snapshot, MonotonicClock::new());
        if let Some(err) = &resumed.recovered {
            terminal.say(format!("! {}", err.info().message))?;
        }
        let mut session = resumed.session;
        let mut snapshot_file = Some(snapshot_path.clone());
        let outcome = terminal.drive(&mut session, |session| {
            checkpoint(&config, session, &mut snapshot_file)
        })?;
        exports.extend(finish(&mut terminal, &config, &session, outcome, &fingerprint)?);
        return Ok(exports);
    }

    let mut participant_idx: u64 = 0;
    loop {
        let mut rng = match config.seed {
            Some(seed) => RngHandle::for_session(seed, participant_idx),
            None => RngHandle::from_entropy(),
        };
        let mut session = new_session(&bank, &config, &mut rng, &mut terminal)?;
        let mut snapshot_file = None;
        let outcome = terminal.drive(&mut session, |session| {
            checkpoint(&config, session, &mut snapshot_file)
        })?;
        exports.extend(finish(&mut terminal, &config, &session, outcome, &fingerprint)?);
        if outcome != SessionOutcome::Completed
            || !terminal.confirm("Start another participant? [y/N]")?
        {
            break;
        }
        participant_idx += 1;
    }
    Ok(exports)
}

fn new_session<R: BufRead, W: Write>(
    bank: &QuestionBank,
    config: &SurveyConfig,
    rng: &mut RngHandle,
    terminal: &mut Terminal<R, W>,
) -> Result<Session<MonotonicClock>, Box<dyn Error>> {
    let assignment = plan_session(bank.questions(), &config.design, rng);
    if let Some(warning) = assignment.warning() {
        terminal.say(format!("! {}", warning.info().message))?;
    }
    info!(
        group = %assignment.group,
        split = ?assignment.split,
        items = assignment.len(),
        "new session"
    );
    Ok(Session::new(assignment, config.protocol(), MonotonicClock::new()))
}

/// Saves the session snapshot. The file is picked on the first save and
/// reused for the rest of the session, so two participants with the same
/// name keep separate snapshots.
fn checkpoint<C: Clock>(
    config: &SurveyConfig,
    session: &Session<C>,
    target: &mut Option<PathBuf>,
) -> Result<(), SurveyError> {
    let (Some(dir), Some(participant)) = (&config.snapshot_dir, session.participant()) else {
        return Ok(());
    };
    let path = target.get_or_insert_with(|| {
        unused_path(dir, &format!("session_{}", sanitize_name(&participant.name)), "json")
    });
    session.snapshot().save(path)
}

/// `session_manifest_<tail>.json`, where `<tail>` is the export's name after
/// the results prefix, so the manifest pairs with its export.
fn manifest_path(dir: &Path, export: &Path, participant: &str) -> PathBuf {
    let tail = export
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.strip_prefix(RESULTS_PREFIX))
        .map(str::to_string)
        .unwrap_or_else(|| sanitize_name(participant));
    unused_path(dir, &format!("session_manifest_{tail}"), "json")
}

/// Writes the export, manifest and registry rows for a finished pass.
fn finish<C: Clock, R: BufRead, W: Write>(
    terminal: &mut Terminal<R, W>,
    config: &SurveyConfig,
    session: &Session<C>,
    outcome: SessionOutcome,
    fingerprint: &str,
) -> Result<Option<PathBuf>, Box<dyn Error>> {
    if outcome == SessionOutcome::Halted {
        return match session.halt_error() {
            Some(err) => Err(Box::new(err.clone())),
            None => Ok(None),
        };
    }
    let Some(participant) = session.participant() else {
        return Ok(None);
    };
    let responses = session.responses();
    if responses.is_empty() {
        warn!(participant = %participant.name, "session ended without responses");
        return Ok(None);
    }
    let path = export_results(&config.output_dir, &participant.name, responses)?;
    let manifest =
        SessionManifest::from_session(session, Some(fingerprint.to_string()), config.seed)?;
    manifest.write(&manifest_path(&config.output_dir, &path, &participant.name))?;
    if let Some(registry) = &config.registry_path {
        append_registry(registry, responses)?;
    }
    match outcome {
        SessionOutcome::Completed => {
            terminal.say("Thank you! You have completed all questions.")?;
            terminal.say(format!("Your responses have been saved to {}", path.display()))?;
        }
        _ => {
            terminal.say(format!(
                "Session ended early; {} of {} responses saved to {}",
                responses.len(),
                session.len(),
                path.display()
            ))?;
        }
    }
    Ok(Some(path))
}
