use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use cds_bank::load_questions;
use cds_core::errors::SurveyError;
use cds_core::{to_canonical_json_bytes, Group, Phase, RngHandle, SetLabel};
use cds_trial::{assign, SplitKind};
use clap::Args;
use serde::Serialize;

use super::resolve_config;

#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Group to preview; drawn at random when omitted.
    #[arg(long)]
    pub group: Option<Group>,
    /// Seed for the split and group draw.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Question bank (CSV or JSON).
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// YAML survey configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanPreview {
    pub group: Group,
    pub split: SplitKind,
    pub set_a_len: usize,
    pub set_b_len: usize,
    pub bank_fingerprint: String,
    pub plan_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub items: Vec<PlanRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanRow {
    pub position: usize,
    pub question_id: String,
    pub phase: Phase,
    pub set: SetLabel,
    pub llm_assisted: bool,
}

pub fn run(args: &PlanArgs) -> Result<(), Box<dyn Error>> {
    let preview = build_preview(args)?;
    let bytes = to_canonical_json_bytes(&preview)?;
    io::stdout().write_all(&bytes)?;
    Ok(())
}

pub fn build_preview(args: &PlanArgs) -> Result<PlanPreview, SurveyError> {
    let config = resolve_config(args.config.as_deref(), args.data.as_ref())?;
    config.validate()?;
    let bank = load_questions(&config.data_path()?)?;
    let mut rng = match args.seed.or(config.seed) {
        Some(seed) => RngHandle::from_seed(seed),
        None => RngHandle::from_entropy(),
    };
    let group = match args.group {
        Some(group) => group,
        None => Group::draw(&mut rng),
    };
    let assignment = assign(bank.questions(), group, &config.design, &mut rng);
    let items = assignment
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| PlanRow {
            position: idx + 1,
            question_id: item.question_id().to_string(),
            phase: item.phase,
            set: item.set_label,
            llm_assisted: item.show_assistance,
        })
        .collect();
    Ok(PlanPreview {
        group,
        split: assignment.split,
        set_a_len: assignment.set_a_len,
        set_b_len: assignment.set_b_len,
        bank_fingerprint: bank.fingerprint()?,
        plan_hash: assignment.plan_hash()?,
        warning: assignment.warning().map(|warning| warning.info().message.clone()),
        items,
    })
}
