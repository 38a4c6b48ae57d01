//! Anonymous encouragement decorator.
//!
//! Runs on the result of a successful check-in, after the uniqueness-checked
//! insert, and may attach one canned phrase. Purely cosmetic.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use crate::checkin::{CheckInPatch, CheckInRecord};
use crate::storage::{CheckInStore, EncouragementConfig};

const PHRASES: &[&str] = &[
    "Someone out there is cheering for you today.",
    "Small steps count. You just took one.",
    "Showing up is the hardest part, and you did it.",
    "A quiet stranger is proud of you.",
    "One more day of keeping your promise to yourself.",
    "Tiny habits grow into big changes.",
    "You are doing better than you think.",
    "Keep going, the streak believes in you.",
];

/// The built-in phrase list.
pub fn default_phrases() -> Vec<String> {
    PHRASES.iter().map(|p| p.to_string()).collect()
}

pub struct Encourager {
    phrases: Vec<String>,
    probability: f64,
    rng: Mcg128Xsl64,
}

impl Encourager {
    /// Built-in phrases, probability 0.7, entropy-seeded.
    pub fn new() -> Self {
        Self::from_config(&EncouragementConfig::default())
    }

    /// A disabled config (or an empty phrase list) never attaches anything.
    pub fn from_config(config: &EncouragementConfig) -> Self {
        let probability = if config.enabled && config.probability.is_finite() {
            config.probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let rng = match config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            phrases: config.phrases.clone(),
            probability,
            rng,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mcg128Xsl64::seed_from_u64(seed);
        self
    }

    /// Roll for a phrase: `Some` with the configured probability, chosen uniformly.
    pub fn draw(&mut self) -> Option<String> {
        if self.phrases.is_empty() || !self.rng.gen_bool(self.probability) {
            return None;
        }
        self.phrases.choose(&mut self.rng).cloned()
    }

    /// Attach a phrase to a freshly created record. Returns the phrase, if any.
    ///
    /// Records that already carry one are left alone.
    pub fn decorate(&mut self, record: &mut CheckInRecord) -> Option<String> {
        if record.anonymous_encouragement.is_some() {
            return None;
        }
        let phrase = self.draw()?;
        record.anonymous_encouragement = Some(phrase.clone());
        Some(phrase)
    }

    /// Decorate a stored record and write the phrase back.
    ///
    /// The phrase is cosmetic: if the write fails the check-in stands and the
    /// undecorated record is returned.
    pub fn persist<S: CheckInStore>(&mut self, store: &S, record: CheckInRecord) -> CheckInRecord {
        if record.anonymous_encouragement.is_some() {
            return record;
        }
        let Some(phrase) = self.draw() else {
            return record;
        };
        let patch = CheckInPatch {
            anonymous_encouragement: Some(phrase),
            ..Default::default()
        };
        match store.update(record.id, &patch) {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(id = %record.id, "encouragement not saved: {e}");
                record
            }
        }
    }
}

impl Default for Encourager {
    fn default() -> Self {
        Self::new()
    }
}
