use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cds_core::{Phase, ResponseRecord};
use serde::{Deserialize, Serialize};

/// Accuracy and timing for one condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub llm_assisted: bool,
    pub responses: usize,
    pub correct: usize,
    /// Percentage of correct answers, rounded to two decimals.
    pub accuracy: f64,
    /// Mean response time in seconds.
    pub average_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub participants: usize,
    pub responses: usize,
    /// All responses grouped by condition.
    pub overall: Vec<ConditionSummary>,
    /// Phase 1 only: the between-subject comparison free of carry-over.
    pub phase_one: Vec<ConditionSummary>,
}

/// Groups responses by `llm_assisted`, unassisted first. Conditions with no
/// responses are omitted.
pub fn summarize_by_condition<'a, I>(records: I) -> Vec<ConditionSummary>
where
    I: IntoIterator<Item = &'a ResponseRecord>,
{
    let mut groups: BTreeMap<bool, (usize, usize, f64)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(record.assistance_shown).or_default();
        entry.0 += 1;
        entry.1 += usize::from(record.is_correct);
        entry.2 += record.elapsed_seconds;
    }
    groups
        .into_iter()
        .map(|(llm_assisted, (responses, correct, total_time))| {
            let n = responses as f64;
            ConditionSummary {
                llm_assisted,
                responses,
                correct,
                accuracy: round2(correct as f64 / n * 100.0),
                average_time: total_time / n,
            }
        })
        .collect()
}

/// Summary of a response log. Partial logs from abandoned sessions are fine.
pub fn summarize(records: &[ResponseRecord]) -> SummaryReport {
    let participants = records
        .iter()
        .map(|record| record.name.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    SummaryReport {
        participants,
        responses: records.len(),
        overall: summarize_by_condition(records),
        phase_one: summarize_by_condition(
            records.iter().filter(|record| record.phase == Phase::One),
        ),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn write_table(f: &mut fmt::Formatter<'_>, rows: &[ConditionSummary]) -> fmt::Result {
    writeln!(f, "{:<14}{:>10}{:>12}{:>14}", "llm_assisted", "n", "accuracy", "average_time")?;
    for row in rows {
        writeln!(
            f,
            "{:<14}{:>10}{:>11.2}%{:>13.2}s",
            row.llm_assisted, row.responses, row.accuracy, row.average_time
        )?;
    }
    Ok(())
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} responses from {} participant(s)",
            self.responses, self.participants
        )?;
        writeln!(f)?;
        writeln!(f, "Accuracy and time by LLM assistance (all questions)")?;
        write_table(f, &self.overall)?;
        if !self.phase_one.is_empty() {
            writeln!(f)?;
            writeln!(f, "Phase 1 only")?;
            write_table(f, &self.phase_one)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cds_core::{FollowUpCode, Group, SetLabel};

    fn record(phase: Phase, assisted: bool, correct: bool, secs: f64) -> ResponseRecord {
        ResponseRecord {
            name: "p1".into(),
            background: "Non-Gastroenterologist".into(),
            practice_years: 0,
            group: Group::G1,
            phase,
            set_label: if assisted { SetLabel::B } else { SetLabel::A },
            question_id: "Q".into(),
            sequence_index: 1,
            assistance_shown: assisted,
            selected_answer: FollowUpCode::new("3y"),
            correct_answer: FollowUpCode::new(if correct { "3y" } else { "5y" }),
            is_correct: correct,
            elapsed_seconds: secs,
        }
    }

    #[test]
    fn accuracy_is_rounded_percentage() {
        let records = vec![
            record(Phase::One, false, true, 2.0),
            record(Phase::One, false, false, 4.0),
            record(Phase::One, false, false, 6.0),
            record(Phase::Two, true, true, 1.0),
        ];
        let report = summarize(&records);
        assert_eq!(report.overall.len(), 2);
        let unassisted = &report.overall[0];
        assert!(!unassisted.llm_assisted);
        assert_eq!(unassisted.accuracy, 33.33);
        assert!((unassisted.average_time - 4.0).abs() < 1e-12);
        assert_eq!(report.overall[1].accuracy, 100.0);
        assert_eq!(report.phase_one.len(), 1);
        assert_eq!(report.participants, 1);
    }

    #[test]
    fn empty_log_has_no_rows() {
        let report = summarize(&[]);
        assert!(report.overall.is_empty());
        assert!(report.phase_one.is_empty());
        assert!(report.to_string().contains("0 responses"));
    }
}
