use cds_core::{
    from_json_slice, stable_hash_string, to_canonical_json_bytes, FollowUpCode,
    FollowUpVocabulary, Group, Phase, QuestionRecord, ResponseRecord, SetLabel, TrialItem,
};

fn sample_question() -> QuestionRecord {
    QuestionRecord {
        id: "Q17".into(),
        endoscopy_report: "Two 4 mm sessile polyps in the sigmoid colon.".into(),
        pathology_report: "Tubular adenoma, low grade.".into(),
        llm_suggestion: "Repeat colonoscopy in 7-10 years.".into(),
        correct_answer: FollowUpCode::new("7-10y"),
    }
}

#[test]
fn trial_item_round_trip_json() {
    let item = TrialItem {
        question: sample_question(),
        show_assistance: true,
        phase: Phase::Two,
        set_label: SetLabel::B,
    };
    let bytes = to_canonical_json_bytes(&item).expect("serialize");
    let text = String::from_utf8(bytes.clone()).expect("utf8");
    assert!(text.contains("\"phase\": 2"));
    let decoded: TrialItem = from_json_slice(&bytes).expect("deserialize");
    assert_eq!(decoded, item);
    assert_eq!(decoded.visible_suggestion(), Some("Repeat colonoscopy in 7-10 years."));
}

#[test]
fn response_uses_export_column_names() {
    let record = ResponseRecord {
        name: "User01".into(),
        background: "Junior Gastroenterologist (Attending <= 5 years)".into(),
        practice_years: 3,
        group: Group::G2,
        phase: Phase::One,
        set_label: SetLabel::B,
        question_id: "Q17".into(),
        sequence_index: 1,
        assistance_shown: true,
        selected_answer: FollowUpCode::new("7-10y"),
        correct_answer: FollowUpCode::new("7-10y"),
        is_correct: true,
        elapsed_seconds: 12.5,
    };
    let value = serde_json::to_value(&record).expect("serialize");
    for column in [
        "user_name",
        "participant_group",
        "question_set",
        "question_index_session",
        "llm_assisted",
        "time_taken_seconds",
    ] {
        assert!(value.get(column).is_some(), "missing column {column}");
    }
    assert_eq!(value["participant_group"], "G2");
    let decoded: ResponseRecord = serde_json::from_value(value).expect("deserialize");
    assert_eq!(decoded, record);
}

#[test]
fn missing_text_fields_default_to_empty() {
    let question: QuestionRecord =
        serde_json::from_str(r#"{"id": "Q1", "correct_answer": "3y"}"#).expect("deserialize");
    assert_eq!(question.endoscopy_report, "");
    assert_eq!(question.pathology_report, "");
    assert_eq!(question.llm_suggestion, "");
}

#[test]
fn stable_hash_tracks_content() {
    let a = stable_hash_string(&sample_question()).expect("hash");
    let b = stable_hash_string(&sample_question()).expect("hash");
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    let mut changed = sample_question();
    changed.correct_answer = FollowUpCode::new("5y");
    assert_ne!(a, stable_hash_string(&changed).expect("hash"));
}

#[test]
fn default_vocabulary_has_urgent_code() {
    let vocab = FollowUpVocabulary::default();
    assert_eq!(vocab.len(), 8);
    assert!(vocab.contains(&FollowUpCode::new("malignancy")));
    assert_eq!(vocab.label(&FollowUpCode::new("3y")), Some("3 Years Follow-up"));
    assert!(vocab.duplicate_codes().is_empty());
}
