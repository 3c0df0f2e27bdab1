use cds_core::rng::{derive_substream_seed, RngHandle};
use cds_core::Group;
use rand::RngCore;

#[test]
fn rng_emits_reproducible_sequence() {
    let mut rng_a = RngHandle::from_seed(1234);
    let mut rng_b = RngHandle::from_seed(1234);

    let seq_a: Vec<u64> = (0..100).map(|_| rng_a.next_u64()).collect();
    let seq_b: Vec<u64> = (0..100).map(|_| rng_b.next_u64()).collect();

    assert_eq!(seq_a, seq_b);
}

#[test]
fn session_substreams_differ() {
    assert_eq!(derive_substream_seed(7, 0), derive_substream_seed(7, 0));
    assert_ne!(derive_substream_seed(7, 0), derive_substream_seed(7, 1));

    let mut first = RngHandle::for_session(7, 0);
    let mut second = RngHandle::for_session(7, 1);
    assert_ne!(first.next_u64(), second.next_u64());
}

#[test]
fn group_draw_reaches_both_groups() {
    let mut rng = RngHandle::from_seed(99);
    let draws: Vec<Group> = (0..64).map(|_| Group::draw(&mut rng)).collect();
    assert!(draws.contains(&Group::G1));
    assert!(draws.contains(&Group::G2));
}

#[test]
fn participant_stream_replays_from_study_seed() {
    let mut derived = RngHandle::from_seed(derive_substream_seed(2024, 3));
    let mut session = RngHandle::for_session(2024, 3);
    let expected: Vec<u64> = (0..16).map(|_| derived.next_u64()).collect();
    let actual: Vec<u64> = (0..16).map(|_| session.next_u64()).collect();
    assert_eq!(actual, expected);
}
