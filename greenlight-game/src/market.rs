//! Market simulation: per-genre popularity trends and boom/bust cycles,
//! plus the competitor release calendar.
//!
//! Weekly updates draw from dedicated RNG streams keyed by campaign seed
//! and week, so market history is reproducible independently of how much
//! randomness the rest of the simulation consumed.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::events::{MarketEffect, MarketEffectKind};
use crate::numbers::round_f64_to_i32;
use crate::rngs::{stream_rng, STREAM_COMPETITORS, STREAM_MARKET};
use crate::state::GameState;

pub(crate) const WEEKS_PER_MONTH: u32 = 4;
const POPULARITY_MIN: f64 = 0.1;
const POPULARITY_MAX: f64 = 2.0;
const GROWTH_MIN: f64 = -0.2;
const GROWTH_MAX: f64 = 0.3;
const SATURATION_DRIFT: f64 = 0.05;
const TREND_HISTORY_LIMIT: usize = 52;
const COMPETITOR_HORIZON_MONTHS: u32 = 12;
const NOVEL_GENRE_BONUS: f64 = 1.15;
const REPEAT_GENRE_STEP: f64 = 0.05;
const REPEAT_GENRE_CAP: f64 = 0.25;

const COMPANY_PREFIXES: [&str; 8] = [
    "Mega", "Super", "Ultra", "Epic", "Digital", "Crystal", "Pixel", "Cyber",
];
const COMPANY_SUFFIXES: [&str; 7] = [
    "Games",
    "Studios",
    "Interactive",
    "Entertainment",
    "Digital",
    "Arts",
    "Media",
];

/// Cycle phase a genre moves through. Transitions run the natural sequence
/// seventy percent of the time and jump randomly otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketCycle {
    Boom,
    #[default]
    Stable,
    Decline,
    Recovery,
}

impl MarketCycle {
    pub const ALL: [Self; 4] = [Self::Boom, Self::Stable, Self::Decline, Self::Recovery];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boom => "boom",
            Self::Stable => "stable",
            Self::Decline => "decline",
            Self::Recovery => "recovery",
        }
    }

    /// Weekly growth applied to a genre while it rides this cycle.
    #[must_use]
    pub const fn growth_rate(self) -> f64 {
        match self {
            Self::Boom => 0.2,
            Self::Stable => 0.05,
            Self::Decline => -0.1,
            Self::Recovery => 0.1,
        }
    }

    /// Inclusive duration range in weeks.
    #[must_use]
    pub const fn duration_range(self) -> (u32, u32) {
        match self {
            Self::Boom => (8, 12),
            Self::Stable => (12, 24),
            Self::Decline => (4, 8),
            Self::Recovery => (6, 10),
        }
    }

    #[must_use]
    pub const fn natural_next(self) -> Self {
        match self {
            Self::Boom => Self::Stable,
            Self::Stable => Self::Decline,
            Self::Decline => Self::Recovery,
            Self::Recovery => Self::Boom,
        }
    }
}

impl fmt::Display for MarketCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One genre's market numbers, including where it sits in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenreTrend {
    /// Demand multiplier, clamped to [0.1, 2.0].
    pub popularity: f64,
    /// Event-driven growth residual on top of the cycle rate, clamped to
    /// [-0.2, 0.3].
    pub growth: f64,
    /// How crowded the genre is, 0 to 1.
    pub saturation: f64,
    #[serde(default)]
    pub cycle: MarketCycle,
    #[serde(default)]
    pub cycle_week: u32,
    #[serde(default = "default_cycle_duration")]
    pub cycle_duration: u32,
}

fn default_cycle_duration() -> u32 {
    12
}

impl Default for GenreTrend {
    fn default() -> Self {
        Self {
            popularity: 1.0,
            growth: 0.05,
            saturation: 0.0,
            cycle: MarketCycle::Stable,
            cycle_week: 0,
            cycle_duration: default_cycle_duration(),
        }
    }
}

/// An upcoming rival release on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorRelease {
    pub company: String,
    pub genre: String,
    /// Absolute month number, 1-based.
    pub month: u32,
    /// Hype level 0-100.
    pub anticipation: u32,
}

/// One week's popularity snapshot for the trends chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub week: u32,
    pub popularity: HashMap<String, f64>,
}

/// The whole market picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MarketState {
    #[serde(default)]
    pub genres: HashMap<String, GenreTrend>,
    #[serde(default)]
    pub competitors: Vec<CompetitorRelease>,
    #[serde(default)]
    pub trends: Vec<TrendSnapshot>,
}

pub(crate) fn month_of_week(week: u32) -> u32 {
    (week.saturating_sub(1)) / WEEKS_PER_MONTH + 1
}

fn sorted_genre_ids(state: &GameState) -> Vec<String> {
    let mut ids: Vec<String> = state
        .data
        .as_ref()
        .map(|d| d.genres.genres.keys().cloned().collect())
        .unwrap_or_default();
    ids.sort();
    ids
}

fn generate_competitors_for_month(
    seed: u64,
    month: u32,
    genre_ids: &[String],
) -> Vec<CompetitorRelease> {
    let mut rng = stream_rng(seed, STREAM_COMPETITORS, u64::from(month));
    let mut releases = Vec::new();
    for genre in genre_ids {
        let count = rng.random_range(0..=2);
        for _ in 0..count {
            let prefix = COMPANY_PREFIXES[rng.random_range(0..COMPANY_PREFIXES.len())];
            let suffix = COMPANY_SUFFIXES[rng.random_range(0..COMPANY_SUFFIXES.len())];
            let anticipation =
                u32::try_from(round_f64_to_i32(rng.random::<f64>() * 100.0).max(0)).unwrap_or(0);
            releases.push(CompetitorRelease {
                company: format!("{prefix} {suffix}"),
                genre: genre.clone(),
                month,
                anticipation,
            });
        }
    }
    releases
}

fn tick_genre(trend: &mut GenreTrend, rng: &mut ChaCha20Rng) {
    trend.cycle_week += 1;
    if trend.cycle_week >= trend.cycle_duration {
        let next = if rng.random_bool(0.7) {
            trend.cycle.natural_next()
        } else {
            MarketCycle::ALL[rng.random_range(0..MarketCycle::ALL.len())]
        };
        let (lo, hi) = next.duration_range();
        trend.cycle = next;
        trend.cycle_week = 0;
        trend.cycle_duration = rng.random_range(lo..=hi);
    }

    let noise = rng.random_range(0.75..1.25);
    let effective = (trend.cycle.growth_rate() + trend.growth).clamp(GROWTH_MIN, GROWTH_MAX);
    trend.popularity =
        (trend.popularity * (1.0 + effective * noise)).clamp(POPULARITY_MIN, POPULARITY_MAX);
    trend.saturation = (trend.saturation + rng.random_range(-SATURATION_DRIFT..SATURATION_DRIFT))
        .clamp(0.0, 1.0);
}

impl MarketState {
    /// Seed the market for a new campaign: randomized per-genre baselines, a
    /// stable opening cycle, and a year of competitor releases.
    #[must_use]
    pub fn initialize(state: &GameState) -> Self {
        let genre_ids = sorted_genre_ids(state);
        let mut rng = stream_rng(state.seed, STREAM_MARKET, 0);

        let mut genres = HashMap::new();
        for id in &genre_ids {
            genres.insert(
                id.clone(),
                GenreTrend {
                    popularity: 0.5 + rng.random::<f64>() * 0.5,
                    growth: 0.05 + rng.random::<f64>() * 0.1,
                    saturation: rng.random::<f64>() * 0.3,
                    cycle: MarketCycle::Stable,
                    cycle_week: 0,
                    cycle_duration: default_cycle_duration(),
                },
            );
        }

        // A few genres open the campaign hot.
        if !genre_ids.is_empty() {
            let boosted = rng.random_range(1..=3usize.min(genre_ids.len()));
            for i in 0..boosted {
                let pick = genre_ids[rng.random_range(0..genre_ids.len())].clone();
                if let Some(trend) = genres.get_mut(&pick) {
                    let factor = if i == 0 { 1.5 } else { 1.2 };
                    trend.popularity = (trend.popularity * factor).min(POPULARITY_MAX);
                }
            }
        }

        let mut competitors = Vec::new();
        for month in 1..=COMPETITOR_HORIZON_MONTHS {
            competitors.extend(generate_competitors_for_month(state.seed, month, &genre_ids));
        }

        Self {
            genres,
            competitors,
            trends: Vec::new(),
        }
    }

    /// Apply a market-wide shift from a weekly event to every tracked genre.
    pub fn apply_effect(&mut self, effect: &MarketEffect) {
        for trend in self.genres.values_mut() {
            match effect.kind {
                MarketEffectKind::Boost => {
                    trend.growth = (trend.growth + effect.amount).clamp(GROWTH_MIN, GROWTH_MAX);
                    trend.popularity = (trend.popularity * (1.0 + effect.amount))
                        .clamp(POPULARITY_MIN, POPULARITY_MAX);
                }
                MarketEffectKind::Decline => {
                    trend.growth = (trend.growth - effect.amount).clamp(GROWTH_MIN, GROWTH_MAX);
                    trend.popularity = (trend.popularity * (1.0 - effect.amount))
                        .clamp(POPULARITY_MIN, POPULARITY_MAX);
                }
            }
        }
    }

    /// Weekly market drift, run by the clock. Each genre walks its own
    /// cycle; the competitor calendar is pruned of past months and topped
    /// up to a rolling one-year horizon.
    pub fn tick_week(&mut self, seed: u64, week: u32, genre_ids: &[String]) {
        let mut rng = stream_rng(seed, STREAM_MARKET, u64::from(week));

        let mut snapshot = HashMap::new();
        for id in genre_ids {
            let trend = self.genres.entry(id.clone()).or_default();
            tick_genre(trend, &mut rng);
            snapshot.insert(id.clone(), trend.popularity);
        }

        self.trends.push(TrendSnapshot {
            week,
            popularity: snapshot,
        });
        if self.trends.len() > TREND_HISTORY_LIMIT {
            let excess = self.trends.len() - TREND_HISTORY_LIMIT;
            self.trends.drain(..excess);
        }

        let month = month_of_week(week);
        self.competitors.retain(|c| c.month >= month);
        let horizon = month + COMPETITOR_HORIZON_MONTHS;
        if !self.competitors.iter().any(|c| c.month == horizon) {
            self.competitors
                .extend(generate_competitors_for_month(seed, horizon, genre_ids));
        }
    }

    /// How favorably the market receives a release in `genre`, given how
    /// many games the studio has shipped there before. A first entry in a
    /// genre gets a novelty bonus; repeats earn a smaller familiarity bonus.
    /// Genre growth helps; saturation hurts.
    #[must_use]
    pub fn entry_modifier(&self, genre: &str, prior_releases: usize) -> f64 {
        let novelty = if prior_releases == 0 {
            NOVEL_GENRE_BONUS
        } else {
            1.0 + (REPEAT_GENRE_STEP * prior_releases as f64).min(REPEAT_GENRE_CAP)
        };
        let trend = self.genres.get(genre).copied().unwrap_or_default();
        (novelty * (1.0 + trend.growth.max(0.0)) * (1.0 - trend.saturation * 0.3)).clamp(0.5, 1.5)
    }

    /// Current demand multiplier for a genre.
    #[must_use]
    pub fn popularity(&self, genre: &str) -> f64 {
        self.genres.get(genre).map_or(1.0, |t| t.popularity)
    }

    /// Current growth rate for a genre, cycle included.
    #[must_use]
    pub fn growth(&self, genre: &str) -> f64 {
        self.genres
            .get(genre)
            .map_or(0.0, |t| (t.cycle.growth_rate() + t.growth).clamp(GROWTH_MIN, GROWTH_MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferenceData;

    fn seeded_state() -> GameState {
        GameState::new("Moon Frog", 1234, ReferenceData::default_config())
    }

    fn genre_ids(state: &GameState) -> Vec<String> {
        sorted_genre_ids(state)
    }

    #[test]
    fn initialization_covers_every_genre_within_bands() {
        let state = seeded_state();
        let market = MarketState::initialize(&state);
        assert_eq!(market.genres.len(), 10);
        for trend in market.genres.values() {
            assert!((POPULARITY_MIN..=POPULARITY_MAX).contains(&trend.popularity));
            assert!((0.05..=0.15).contains(&trend.growth));
            assert!((0.0..=0.3).contains(&trend.saturation));
            assert_eq!(trend.cycle, MarketCycle::Stable);
        }
    }

    #[test]
    fn initialization_is_deterministic_per_seed() {
        let a = MarketState::initialize(&seeded_state());
        let b = MarketState::initialize(&seeded_state());
        assert_eq!(a, b);

        let other = GameState::new("Moon Frog", 99, ReferenceData::default_config());
        let c = MarketState::initialize(&other);
        assert_ne!(a.competitors, c.competitors);
    }

    #[test]
    fn competitor_calendar_spans_a_year() {
        let state = seeded_state();
        let market = MarketState::initialize(&state);
        assert!(!market.competitors.is_empty());
        for c in &market.competitors {
            assert!((1..=COMPETITOR_HORIZON_MONTHS).contains(&c.month));
            assert!(c.anticipation <= 100);
            assert!(c.company.contains(' '));
        }
    }

    #[test]
    fn weekly_ticks_respect_clamps_and_trim_history() {
        let state = seeded_state();
        let ids = genre_ids(&state);
        let mut market = MarketState::initialize(&state);
        for week in 1..=80 {
            market.tick_week(state.seed, week, &ids);
        }
        for trend in market.genres.values() {
            assert!((POPULARITY_MIN..=POPULARITY_MAX).contains(&trend.popularity));
            assert!((GROWTH_MIN..=GROWTH_MAX).contains(&trend.growth));
            assert!((0.0..=1.0).contains(&trend.saturation));
            assert!(trend.cycle_week < trend.cycle_duration);
        }
        assert_eq!(market.trends.len(), TREND_HISTORY_LIMIT);
        assert!(market.competitors.iter().all(|c| c.month >= month_of_week(80)));
    }

    #[test]
    fn genres_cycle_independently() {
        let state = seeded_state();
        let ids = genre_ids(&state);
        let mut market = MarketState::initialize(&state);
        for week in 1..=120 {
            market.tick_week(state.seed, week, &ids);
        }
        let cycles: std::collections::HashSet<MarketCycle> =
            market.genres.values().map(|t| t.cycle).collect();
        assert!(cycles.len() >= 2, "all genres stuck in the same cycle");
    }

    #[test]
    fn boost_and_decline_effects_move_every_genre() {
        let state = seeded_state();
        let mut market = MarketState::initialize(&state);
        let before: HashMap<String, f64> = market
            .genres
            .iter()
            .map(|(id, t)| (id.clone(), t.popularity))
            .collect();
        market.apply_effect(&MarketEffect {
            kind: MarketEffectKind::Boost,
            amount: 0.08,
        });
        for (id, trend) in &market.genres {
            assert!(trend.popularity > before[id], "{id} did not rise");
        }

        let boosted = market.popularity("rpg");
        market.apply_effect(&MarketEffect {
            kind: MarketEffectKind::Decline,
            amount: 0.08,
        });
        assert!(market.popularity("rpg") < boosted);
    }

    #[test]
    fn entry_modifier_rewards_novelty_over_repeats() {
        let state = seeded_state();
        let market = MarketState::initialize(&state);
        let novel = market.entry_modifier("rpg", 0);
        let second = market.entry_modifier("rpg", 1);
        let sixth = market.entry_modifier("rpg", 6);
        assert!(novel > second);
        // repeat bonus caps at +25%
        assert!((sixth - market.entry_modifier("rpg", 5)).abs() < f64::EPSILON);
        assert!((0.5..=1.5).contains(&novel));
    }

    #[test]
    fn months_are_four_weeks() {
        assert_eq!(month_of_week(1), 1);
        assert_eq!(month_of_week(4), 1);
        assert_eq!(month_of_week(5), 2);
        assert_eq!(month_of_week(48), 12);
        assert_eq!(month_of_week(49), 13);
    }
}
