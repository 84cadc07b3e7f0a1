//! Mailbox username generation
//!
//! Usernames look like `quietfalcon482`: an adjective, a noun and a
//! three digit suffix. The generator remembers the most recent names it
//! handed out so it does not propose them again; older names are
//! forgotten and upstream rejects any address that is already taken.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Mutex;

const ADJECTIVES: &[&str] = &[
    "amber", "brave", "calm", "clever", "crisp", "daring", "eager", "fancy", "gentle", "happy",
    "hidden", "jolly", "keen", "lively", "lucky", "mellow", "misty", "noble", "proud", "quick",
    "quiet", "rapid", "rustic", "silent", "snowy", "sunny", "swift", "tidy", "vivid", "witty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "breeze", "canyon", "comet", "falcon", "forest", "garnet", "harbor",
    "heron", "island", "lantern", "maple", "meadow", "otter", "panda", "pebble", "pine", "raven",
    "river", "rocket", "sparrow", "summit", "thistle", "tiger", "valley", "willow", "wolf",
];

/// Most names remembered before the memory is reset.
const ISSUED_LIMIT: usize = 4096;

/// Hands out usernames, avoiding the last [`ISSUED_LIMIT`] it issued.
#[derive(Debug, Default)]
pub struct UsernameGenerator {
    issued: Mutex<HashSet<String>>,
}

impl UsernameGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a username not among the recently issued ones.
    pub fn next_username(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if issued.len() >= ISSUED_LIMIT {
            issued.clear();
        }

        let mut digits = 3;
        loop {
            for _ in 0..16 {
                let candidate = candidate(&mut rng, digits);
                if issued.insert(candidate.clone()) {
                    return candidate;
                }
            }
            // Every short form we tried is taken, widen the suffix.
            digits += 1;
        }
    }
}

fn candidate(rng: &mut impl Rng, digits: u32) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("temp");
    let noun = NOUNS.choose(rng).copied().unwrap_or("mail");
    let suffix = rng.gen_range(0..10u64.pow(digits));
    format!("{adjective}{noun}{suffix:0width$}", width = digits as usize)
}
