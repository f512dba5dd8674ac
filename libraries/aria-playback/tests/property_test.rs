//! Property-based tests for queue navigation and the play queue store

use aria_core::Track;
use aria_playback::{Direction, PlayMode, Queue};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

// ===== Helpers =====

fn arbitrary_track() -> impl Strategy<Value = Track> {
    ("[a-f0-9]{1,4}", "[A-Za-z ]{1,20}", "[A-Za-z ]{1,12}")
        .prop_map(|(hash, name, artist)| Track::new(hash, name, artist, ""))
}

fn arbitrary_tracks() -> impl Strategy<Value = Vec<Track>> {
    prop::collection::vec(arbitrary_track(), 0..40)
}

fn arbitrary_mode() -> impl Strategy<Value = PlayMode> {
    prop_oneof![
        Just(PlayMode::Sequential),
        Just(PlayMode::SingleRepeat),
        Just(PlayMode::Shuffle),
    ]
}

// ===== Property Tests =====

proptest! {
    /// Hashes in the queue are always unique, whatever is pushed
    #[test]
    fn queue_never_holds_duplicates(tracks in arbitrary_tracks()) {
        let mut queue = Queue::new();
        for track in tracks.clone() {
            queue.push_unique(track);
        }

        let unique: HashSet<_> = tracks.iter().map(|t| t.hash.clone()).collect();
        prop_assert_eq!(queue.len(), unique.len());

        let mut seen = HashSet::new();
        for track in queue.tracks() {
            prop_assert!(seen.insert(track.hash.clone()));
        }
    }

    /// Replacing keeps first occurrences in their original order
    #[test]
    fn replace_keeps_first_occurrence_order(tracks in arbitrary_tracks()) {
        let mut queue = Queue::new();
        queue.replace(tracks.clone());

        let mut expected = Vec::new();
        let mut seen = HashSet::new();
        for track in &tracks {
            if seen.insert(track.hash.clone()) {
                expected.push(track.name.clone());
            }
        }
        let actual: Vec<String> = queue.tracks().iter().map(|t| t.name.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Navigation always lands inside the queue
    #[test]
    fn target_index_in_bounds(
        len in 1usize..50,
        current_seed in any::<usize>(),
        mode in arbitrary_mode(),
        forward in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let queue = Queue::from_tracks((0..len).map(|i| Track::new(format!("h{i}"), "n", "a", "")));
        let current = current_seed % len;
        let direction = if forward { Direction::Next } else { Direction::Previous };
        let mut rng = StdRng::seed_from_u64(seed);

        let target = queue.target_index(current, direction, mode, &mut rng);
        prop_assert!(matches!(target, Some(i) if i < len));
    }

    /// Sequential next is (i + 1) mod N
    #[test]
    fn sequential_next_wraps(len in 1usize..50, current_seed in any::<usize>()) {
        let queue = Queue::from_tracks((0..len).map(|i| Track::new(format!("h{i}"), "n", "a", "")));
        let current = current_seed % len;
        let mut rng = StdRng::seed_from_u64(0);

        let target = queue.target_index(current, Direction::Next, PlayMode::Sequential, &mut rng);
        prop_assert_eq!(target, Some((current + 1) % len));
    }

    /// Shuffle never repeats the current track when there is a choice
    #[test]
    fn shuffle_avoids_current(
        len in 2usize..50,
        current_seed in any::<usize>(),
        seed in any::<u64>(),
    ) {
        let queue = Queue::from_tracks((0..len).map(|i| Track::new(format!("h{i}"), "n", "a", "")));
        let current = current_seed % len;
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..10 {
            let target = queue.target_index(current, Direction::Next, PlayMode::Shuffle, &mut rng);
            prop_assert_ne!(target, Some(current));
        }
    }

    /// Cycling the play mode three times is the identity
    #[test]
    fn play_mode_cycle_has_period_three(mode in arbitrary_mode()) {
        prop_assert_eq!(mode.cycle().cycle().cycle(), mode);
        prop_assert_ne!(mode.cycle(), mode);
    }
}
