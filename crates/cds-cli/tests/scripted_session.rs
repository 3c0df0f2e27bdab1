use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use cds_cli::commands::check::{self, CheckArgs};
use cds_cli::commands::plan::{build_preview, PlanArgs};
use cds_cli::commands::run::{run_with, RunArgs};
use cds_core::{Group, Phase};
use cds_report::{read_results, summarize};
use tempfile::tempdir;

fn write_bank(dir: &Path, n: usize) -> PathBuf {
    let path = dir.join("questions.csv");
    let mut text =
        String::from("id,endoscopy_report,pathology_report,llm_suggestion,correct_answer\n");
    for idx in 0..n {
        text.push_str(&format!(
            "Q{idx},\"Colonoscopy {idx}, cecum reached\",Tubular adenoma,Repeat in 3 years,3y\n"
        ));
    }
    fs::write(&path, text).expect("write bank");
    path
}

fn run_args(dir: &Path, data: PathBuf) -> RunArgs {
    RunArgs {
        data: Some(data),
        out: Some(dir.join("results")),
        seed: Some(7),
        ..RunArgs::default()
    }
}

#[test]
fn scripted_participant_completes_and_exports() {
    let dir = tempdir().expect("tmp");
    let data = write_bank(dir.path(), 6);
    // name, background, years, then one blank answer followed by six answers.
    let script = "Dr Wu\n2\n4\n\n2\n2\n1\n2\n2\n2\nn\n";
    let mut output = Vec::new();
    let exports = run_with(&run_args(dir.path(), data), Cursor::new(script), &mut output)
        .expect("run");
    assert_eq!(exports.len(), 1);
    assert!(exports[0].ends_with("study_results_Dr_Wu.csv"));

    let transcript = String::from_utf8(output).expect("utf8");
    assert!(transcript.contains("Please select an option!"));
    assert!(transcript.contains("Question 6 of 6"));
    assert!(transcript.contains("Thank you!"));

    let records = read_results(&exports[0]).expect("read export");
    assert_eq!(records.len(), 6);
    assert_eq!(records.iter().filter(|r| r.is_correct).count(), 5);
    let group = records[0].group;
    for record in &records {
        let phase_one = record.phase == Phase::One;
        let expected = match group {
            Group::G1 => !phase_one,
            Group::G2 => phase_one,
        };
        assert_eq!(record.assistance_shown, expected);
        assert_eq!(record.background, "Junior Gastroenterologist (Attending <= 5 years)");
    }
    let indices: Vec<usize> = records.iter().map(|r| r.sequence_index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);

    let manifest = fs::read_to_string(dir.path().join("results/session_manifest_Dr_Wu.json"))
        .expect("manifest");
    assert!(manifest.contains("\"complete\": true"));
    assert!(manifest.contains("\"seed\": 7"));
}

#[test]
fn invalid_login_is_reprompted() {
    let dir = tempdir().expect("tmp");
    let data = write_bank(dir.path(), 2);
    let script = "\n1\n3\nDr Ng\n9\n0\nDr Ng\n3\n0\n1\n2\n";
    let mut output = Vec::new();
    let exports = run_with(&run_args(dir.path(), data), Cursor::new(script), &mut output)
        .expect("run");
    let transcript = String::from_utf8(output).expect("utf8");
    assert!(transcript.contains("Please enter your name or ID"));
    assert!(transcript.contains("Please select your background"));
    assert_eq!(exports.len(), 1);
    // Input ends before the "another participant" prompt is answered.
    assert_eq!(read_results(&exports[0]).expect("read").len(), 2);
}

#[test]
fn abandoned_session_keeps_partial_log_and_registry() {
    let dir = tempdir().expect("tmp");
    let data = write_bank(dir.path(), 8);
    let config_path = dir.path().join("survey.yaml");
    fs::write(
        &config_path,
        format!(
            "registry_path: {}\nsnapshot_dir: {}\n",
            dir.path().join("registry.csv").display(),
            dir.path().join("snapshots").display()
        ),
    )
    .expect("config");
    let args = RunArgs {
        config: Some(config_path),
        ..run_args(dir.path(), data.clone())
    };
    let mut output = Vec::new();
    let exports =
        run_with(&args, Cursor::new("Dr Ko\n1\n12\n2\n5\n"), &mut output).expect("run");
    assert_eq!(read_results(&exports[0]).expect("read").len(), 2);
    let registry = read_results(&dir.path().join("registry.csv")).expect("registry");
    let report = summarize(&registry);
    assert_eq!(report.responses, 2);
    assert_eq!(report.phase_one.len(), 1);

    let snapshot = dir.path().join("snapshots/session_Dr_Ko.json");
    assert!(snapshot.exists());
    let resume = RunArgs {
        resume: Some(snapshot),
        ..run_args(dir.path(), data)
    };
    let mut output = Vec::new();
    let exports = run_with(&resume, Cursor::new("2\n2\n2\n2\n2\n2\n"), &mut output)
        .expect("resume");
    let records = read_results(&exports[0]).expect("read");
    assert_eq!(records.len(), 8);
    assert_eq!(records[2].sequence_index, 3);
}

#[test]
fn missing_bank_stops_the_run() {
    let dir = tempdir().expect("tmp");
    let mut output = Vec::new();
    let args = run_args(dir.path(), dir.path().join("absent.csv"));
    assert!(run_with(&args, Cursor::new(""), &mut output).is_err());
    let transcript = String::from_utf8(output).expect("utf8");
    assert!(transcript.starts_with("! "));
}

#[test]
fn plan_preview_is_seeded() {
    let dir = tempdir().expect("tmp");
    let data = write_bank(dir.path(), 60);
    let args = PlanArgs {
        group: Some(Group::G2),
        seed: Some(3),
        data: Some(data),
        config: None,
    };
    let first = build_preview(&args).expect("preview");
    let second = build_preview(&args).expect("preview");
    assert_eq!(first.plan_hash, second.plan_hash);
    assert_eq!((first.set_a_len, first.set_b_len), (25, 35));
    assert!(first.warning.is_none());
    assert!(first.items[..35].iter().all(|row| row.llm_assisted));
}

#[test]
fn check_reports_unknown_codes() {
    let dir = tempdir().expect("tmp");
    let path = dir.path().join("bank.csv");
    fs::write(
        &path,
        "id,endoscopy_report,pathology_report,llm_suggestion,correct_answer\n1,e,p,s,2y\n2,e,p,s,3y\n",
    )
    .expect("write");
    let report = check::validate(&CheckArgs {
        data: Some(path),
        config: None,
    })
    .expect("validate");
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].question_id, "1");
}

fn answers(n: usize) -> String {
    "2\n".repeat(n)
}

#[test]
fn second_participant_keeps_separate_files() {
    let dir = tempdir().expect("tmp");
    let data = write_bank(dir.path(), 4);
    let script = format!("王醫師\n2\n4\n{}y\n李醫師\n1\n12\n{}n\n", answers(4), answers(4));
    let mut output = Vec::new();
    let exports = run_with(&run_args(dir.path(), data), Cursor::new(script), &mut output)
        .expect("run");
    assert_eq!(exports.len(), 2);
    assert!(exports[0].ends_with("study_results_王醫師.csv"));
    assert!(exports[1].ends_with("study_results_李醫師.csv"));

    let first = read_results(&exports[0]).expect("first");
    let second = read_results(&exports[1]).expect("second");
    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 4);
    assert!(first.iter().all(|r| r.name == "王醫師" && r.practice_years == 4));
    assert!(second.iter().all(|r| r.name == "李醫師" && r.practice_years == 12));
    assert!(dir.path().join("results/session_manifest_王醫師.json").exists());
    assert!(dir.path().join("results/session_manifest_李醫師.json").exists());
}

#[test]
fn reused_name_never_overwrites_earlier_files() {
    let dir = tempdir().expect("tmp");
    let data = write_bank(dir.path(), 3);
    let config_path = dir.path().join("survey.yaml");
    fs::write(
        &config_path,
        format!("snapshot_dir: {}\n", dir.path().join("snapshots").display()),
    )
    .expect("config");
    let args = RunArgs {
        config: Some(config_path),
        ..run_args(dir.path(), data)
    };
    let script = format!("Dr Wu\n2\n4\n{}y\nDr Wu\n1\n7\n{}n\n", answers(3), answers(3));
    let mut output = Vec::new();
    let exports = run_with(&args, Cursor::new(script), &mut output).expect("run");
    assert_eq!(exports.len(), 2);
    assert!(exports[0].ends_with("study_results_Dr_Wu.csv"));
    assert!(exports[1].ends_with("study_results_Dr_Wu_2.csv"));
    assert_eq!(read_results(&exports[0]).expect("first")[0].practice_years, 4);
    assert_eq!(read_results(&exports[1]).expect("second")[0].practice_years, 7);

    let results = dir.path().join("results");
    assert!(results.join("session_manifest_Dr_Wu.json").exists());
    assert!(results.join("session_manifest_Dr_Wu_2.json").exists());
    let snapshots = dir.path().join("snapshots");
    assert!(snapshots.join("session_Dr_Wu.json").exists());
    assert!(snapshots.join("session_Dr_Wu_2.json").exists());
}

#[test]
fn unwritable_snapshot_dir_still_exports() {
    let dir = tempdir().expect("tmp");
    let data = write_bank(dir.path(), 3);
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").expect("blocker");
    let config_path = dir.path().join("survey.yaml");
    fs::write(
        &config_path,
        format!("snapshot_dir: {}\n", blocker.join("snapshots").display()),
    )
    .expect("config");
    let args = RunArgs {
        config: Some(config_path),
        ..run_args(dir.path(), data)
    };
    let mut output = Vec::new();
    let script = format!("Dr Ho\n2\n4\n{}n\n", answers(3));
    let exports = run_with(&args, Cursor::new(script), &mut output).expect("run");
    assert_eq!(exports.len(), 1);
    assert_eq!(read_results(&exports[0]).expect("read").len(), 3);

    let transcript = String::from_utf8(output).expect("utf8");
    assert!(transcript.contains("! could not save progress"));
    assert!(transcript.contains("Thank you!"));
}
