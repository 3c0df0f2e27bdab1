use std::time::Duration;

use cds_core::errors::SurveyError;
use cds_core::{BackgroundCategory, FollowUpCode, Group, QuestionRecord, RngHandle};
use cds_trial::{
    assign, DesignParams, ManualClock, ParticipantForm, Session, SessionManifest, SessionSnapshot,
    SessionState, SurveyProtocol,
};
use tempfile::tempdir;

const ANSWERS: [&str; 6] = ["3y", "5y", "10y", "1y", "other", "3-5y"];

fn bank(n: usize) -> Vec<QuestionRecord> {
    (0..n)
        .map(|idx| QuestionRecord {
            id: format!("R{idx}"),
            endoscopy_report: format!("Colonoscopy {idx}: two tubular adenomas"),
            pathology_report: format!("Pathology {idx}: low-grade dysplasia"),
            llm_suggestion: format!("Repeat colonoscopy in {}", ANSWERS[idx % ANSWERS.len()]),
            correct_answer: FollowUpCode::new(ANSWERS[idx % ANSWERS.len()]),
        })
        .collect()
}

fn form(name: &str) -> ParticipantForm {
    ParticipantForm {
        name: name.into(),
        background: Some(BackgroundCategory::NonGastroenterologist),
        practice_years: 0,
    }
}

fn started(n: usize, group: Group, clock: &ManualClock) -> Session<&ManualClock> {
    let mut rng = RngHandle::from_seed(2024);
    let assignment = assign(&bank(n), group, &DesignParams::default(), &mut rng);
    let mut session = Session::new(assignment, SurveyProtocol::default(), clock);
    session.submit_participant(form("Dr Tester")).expect("login");
    session
}

#[test]
fn matching_answer_is_correct_and_timed() {
    let clock = ManualClock::new();
    let mut session = started(4, Group::G1, &clock);
    let correct = session.current().expect("first item").item.question.correct_answer.clone();
    clock.advance(Duration::from_millis(1500));
    let record = session.submit_answer(Some(correct.as_str())).expect("answer");
    assert!(record.is_correct);
    assert!(record.elapsed_seconds > 0.0);
    assert_eq!(record.name, "Dr Tester");
}

#[test]
fn empty_submission_changes_nothing() {
    let clock = ManualClock::new();
    let mut session = started(4, Group::G1, &clock);
    clock.advance(Duration::from_secs(3));
    let err = session.submit_answer(None).expect_err("no option");
    assert!(matches!(err, SurveyError::InvalidSubmission(_)));
    assert_eq!(err.info().message, "Please select an option!");
    assert!(err.is_recoverable());
    assert!(session.responses().is_empty());
    assert_eq!(session.current_question_index(), 0);

    // The timer keeps running from the original start.
    clock.advance(Duration::from_secs(2));
    let record = session.submit_answer(Some("1y")).expect("answer");
    assert!((record.elapsed_seconds - 5.0).abs() < 1e-9);
}

#[test]
fn full_pass_completes_with_one_record_per_item() {
    for group in Group::ALL {
        let clock = ManualClock::new();
        let mut session = started(9, group, &clock);
        let mut indices = Vec::new();
        while let Some(view) = session.current() {
            indices.push(view.position);
            clock.advance_secs_f64(0.5);
            session.submit_answer(Some("other")).expect("answer");
        }
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.responses().len(), session.len());
        assert_eq!(indices, (1..=9).collect::<Vec<_>>());
        let expected_first = matches!(group, Group::G2);
        for (record, item) in session.responses().iter().zip(session.items()) {
            assert_eq!(record.assistance_shown, item.show_assistance);
            assert_eq!(record.question_id, item.question.id);
            let phase_one = record.phase.number() == 1;
            assert_eq!(record.assistance_shown, phase_one == expected_first);
        }
    }
}

#[test]
fn snapshot_round_trips_through_disk() {
    let dir = tempdir().expect("tmp");
    let path = dir.path().join("snapshots").join("session.json");
    let clock = ManualClock::new();
    let mut session = started(6, Group::G2, &clock);
    session.submit_answer(Some("3y")).expect("answer");
    session.submit_answer(Some("5y")).expect("answer");
    session.snapshot().save(&path).expect("save");

    let snapshot = SessionSnapshot::load(&path).expect("load");
    assert_eq!(snapshot, session.snapshot());
    let resumed_clock = ManualClock::new();
    let resumed = Session::resume(snapshot, &resumed_clock);
    assert!(resumed.recovered.is_none());
    let mut session = resumed.session;
    assert_eq!(session.current_question_index(), 2);
    assert_eq!(session.current().expect("third item").position, 3);
}

#[test]
fn out_of_range_index_is_recovered_on_resume() {
    let clock = ManualClock::new();
    let mut session = started(4, Group::G1, &clock);
    session.submit_answer(Some("3y")).expect("answer");
    let mut snapshot = session.snapshot();
    snapshot.index = 17;

    let resumed = Session::resume(snapshot, &clock);
    let err = resumed.recovered.expect("recovered error");
    assert!(matches!(err, SurveyError::IndexOutOfRange(_)));
    assert_eq!(err.info().context.get("reset_to").map(String::as_str), Some("1"));
    let mut session = resumed.session;
    assert_eq!(session.state(), SessionState::InProgress);
    assert_eq!(session.current().expect("item").position, 2);
}

#[test]
fn manifest_reflects_progress() {
    let dir = tempdir().expect("tmp");
    let clock = ManualClock::new();
    let mut session = started(10, Group::G1, &clock);
    session.submit_answer(Some("3y")).expect("answer");
    let manifest =
        SessionManifest::from_session(&session, Some("abc".into()), Some(7)).expect("manifest");
    assert_eq!((manifest.set_a_len, manifest.set_b_len), (5, 5));
    assert_eq!((manifest.answered, manifest.total), (1, 10));
    assert!(!manifest.complete);
    let path = dir.path().join("manifest.json");
    manifest.write(&path).expect("write");
    let text = std::fs::read_to_string(&path).expect("read");
    assert!(text.contains("\"plan_hash\""));
    assert!(text.contains("\"split\": \"degraded\""));
}
