//! Studio reputation: per-segment fans, loyalty, and expectations, plus the
//! social chatter generated when a game ships.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::ReferenceData;
use crate::numbers::{cents_to_dollars, floor_f64_to_u64};

const DEFAULT_GENRE_MATCH: f64 = 0.5;
const FANS_PER_CHANGE_POINT: f64 = 100.0;
const LOYALTY_STEP: f64 = 0.1;
const EXPECTATION_STEP: f64 = 10.0;
const PRESENCE_STEP: f64 = 0.1;
const PRESENCE_BUDGET_SCALE: f64 = 10_000.0;
const MENTION_POSITIVE_THRESHOLD: i32 = 80;
const MENTION_NEUTRAL_THRESHOLD: i32 = 50;
const MENTION_HISTORY_LIMIT: usize = 20;

/// The audience segments that react to a release.
pub const REACTING_SEGMENTS: [&str; 3] = ["casual", "hardcore", "critics"];

/// One audience segment's relationship with the studio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SegmentReputation {
    pub fans: u64,
    /// 0 to 1.
    pub loyalty: f64,
    /// 0 to 100; raised by every success, never lowered.
    pub expectations: f64,
}

/// Studio-wide reputation across audience segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Reputation {
    #[serde(default)]
    pub segments: HashMap<String, SegmentReputation>,
    /// How visible the studio is in the market, 0 to 1. Starts at zero and
    /// grows with every release.
    #[serde(default)]
    pub market_presence: f64,
    /// Most recent social mentions, newest first.
    #[serde(default)]
    pub last_mentions: Vec<String>,
}

impl Reputation {
    #[must_use]
    pub fn segment(&self, id: &str) -> SegmentReputation {
        self.segments.get(id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_fans(&self) -> u64 {
        self.segments.values().map(|s| s.fans).sum()
    }

    /// Mean loyalty across the reacting segments, 0 to 1.
    #[must_use]
    pub fn average_loyalty(&self) -> f64 {
        let sum: f64 = REACTING_SEGMENTS
            .iter()
            .map(|id| self.segment(id).loyalty)
            .sum();
        sum / REACTING_SEGMENTS.len() as f64
    }

    /// Fold a release into reputation. The match factor comes from how well
    /// the genre suits the audience the release was aimed at; each segment
    /// then gains fans at its own loyalty gain rate. Marketing spend
    /// amplifies the market-presence gain.
    pub fn apply_release(
        &mut self,
        data: &ReferenceData,
        genre: &str,
        target_audience: &str,
        success_score: f64,
        marketing_budget_cents: i64,
    ) {
        let quality_factor = (success_score / 100.0).clamp(0.0, 1.0);
        let match_factor = data
            .genre_preference(target_audience, genre)
            .unwrap_or(DEFAULT_GENRE_MATCH);
        for id in REACTING_SEGMENTS {
            let loyalty_gain = data
                .audiences
                .segments
                .get(id)
                .map_or(1.0, |s| s.loyalty_gain);
            let change = quality_factor * match_factor * loyalty_gain;

            let segment = self.segments.entry(id.to_string()).or_default();
            segment.fans += floor_f64_to_u64(change * FANS_PER_CHANGE_POINT);
            segment.loyalty = (segment.loyalty + change * LOYALTY_STEP).min(1.0);
            segment.expectations =
                (segment.expectations + quality_factor * EXPECTATION_STEP).min(100.0);
        }

        let budget_dollars = cents_to_dollars(marketing_budget_cents);
        self.market_presence = (self.market_presence
            + quality_factor * (1.0 + budget_dollars / PRESENCE_BUDGET_SCALE) * PRESENCE_STEP)
            .min(1.0);
    }

    /// Record fresh social mentions, newest first, bounded.
    pub fn record_mentions(&mut self, mentions: &[String]) {
        for mention in mentions.iter().rev() {
            self.last_mentions.insert(0, mention.clone());
        }
        self.last_mentions.truncate(MENTION_HISTORY_LIMIT);
    }
}

fn mention_pool(data: &ReferenceData, score: i32) -> &Vec<String> {
    let templates = &data.audiences.mentions;
    if score >= MENTION_POSITIVE_THRESHOLD {
        &templates.positive
    } else if score >= MENTION_NEUTRAL_THRESHOLD {
        &templates.neutral
    } else {
        &templates.negative
    }
}

/// Generate one social mention per reacting segment. All mentions share the
/// tone of the overall success score; the release either landed or it did
/// not, whatever an individual segment thought of it.
pub fn social_mentions(
    rng: &mut ChaCha20Rng,
    data: &ReferenceData,
    company: &str,
    genre: &str,
    success_score: i32,
) -> Vec<String> {
    let genre_name = data
        .genres
        .genres
        .get(genre)
        .map_or(genre, |g| g.name.as_str());
    let pool = mention_pool(data, success_score);
    if pool.is_empty() {
        return Vec::new();
    }
    REACTING_SEGMENTS
        .iter()
        .map(|_| {
            let template = &pool[rng.random_range(0..pool.len())];
            template
                .replace("{company}", company)
                .replace("{genre}", genre_name)
        })
        .collect()
}
