use crate::types::Question;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

/// Source of ordering randomness for question pools and answer options.
///
/// Production uses [`RandomShuffle`]; tests inject [`SeededShuffle`] or
/// [`NoShuffle`] so assembled sets are reproducible.
pub trait Shuffler: Send + Sync {
    fn shuffle_questions(&self, questions: &mut [Question]);

    fn shuffle_options(&self, options: &mut [String]);
}

/// Thread-local RNG, different order every call
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShuffle;

impl Shuffler for RandomShuffle {
    fn shuffle_questions(&self, questions: &mut [Question]) {
        questions.shuffle(&mut rand::rng());
    }

    fn shuffle_options(&self, options: &mut [String]) {
        options.shuffle(&mut rand::rng());
    }
}

/// Deterministic sequence of permutations derived from a seed
#[derive(Debug)]
pub struct SeededShuffle {
    rng: Mutex<StdRng>,
}

impl SeededShuffle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng(&self, f: impl FnOnce(&mut StdRng)) {
        // A poisoned lock only means another shuffle panicked; the RNG is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng);
    }
}

impl Shuffler for SeededShuffle {
    fn shuffle_questions(&self, questions: &mut [Question]) {
        self.with_rng(|rng| questions.shuffle(rng));
    }

    fn shuffle_options(&self, options: &mut [String]) {
        self.with_rng(|rng| options.shuffle(rng));
    }
}

/// Leaves everything in source order
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShuffle;

impl Shuffler for NoShuffle {
    fn shuffle_questions(&self, _questions: &mut [Question]) {}

    fn shuffle_options(&self, _options: &mut [String]) {}
}
