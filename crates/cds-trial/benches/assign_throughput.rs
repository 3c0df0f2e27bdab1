use cds_core::{FollowUpCode, Group, QuestionRecord, RngHandle};
use cds_trial::{assign, plan_session, DesignParams};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sample_bank(n: usize) -> Vec<QuestionRecord> {
    (0..n)
        .map(|idx| QuestionRecord {
            id: format!("Q{idx:04}"),
            endoscopy_report: "Colonoscopy to cecum, 2 tubular adenomas < 10 mm".into(),
            pathology_report: "Tubular adenoma, low-grade dysplasia".into(),
            llm_suggestion: "Repeat colonoscopy in 7-10 years".into(),
            correct_answer: FollowUpCode::new("7-10y"),
        })
        .collect()
}

fn bench_assign(c: &mut Criterion) {
    let bank = sample_bank(200);
    let params = DesignParams::default();
    c.bench_function("assign_g1_200", |b| {
        let mut rng = RngHandle::from_seed(17);
        b.iter(|| {
            let assignment = assign(black_box(&bank), Group::G1, &params, &mut rng);
            black_box(assignment.len());
        });
    });
    c.bench_function("plan_session_200_with_hash", |b| {
        let mut rng = RngHandle::from_seed(29);
        b.iter(|| {
            let assignment = plan_session(black_box(&bank), &params, &mut rng);
            black_box(assignment.plan_hash().ok());
        });
    });
}

criterion_group!(benches, bench_assign);
criterion_main!(benches);
