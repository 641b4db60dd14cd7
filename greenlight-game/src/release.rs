//! Release scoring: final quality, commercial success, revenue, audience
//! reception, and the press cycle. Shipping clears the active project and
//! folds the result into history and reputation.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::OnceLock;

use crate::data::{ReferenceData, ReviewerProfile};
use crate::numbers::{cents_to_dollars, dollars_to_cents, round_f64_to_i32, u32_to_f64};
use crate::project::{DevPhase, LaunchWindow, MarketingStrategy, Priority};
use crate::reputation::social_mentions;
use crate::rngs::{stream_rng, STREAM_RESUME};
use crate::state::{CommandError, GameState, ReceptionScores, ReleasedGame};

pub(crate) const LOG_GAME_RELEASED_PREFIX: &str = "log.release.";

/// Tunable scoring knobs, shared by every release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleasePolicy {
    /// Revenue as a multiple of budget at a perfect score.
    pub revenue_scale: f64,
    /// Bonus multiplier on a studio's first ever release.
    pub first_release_bonus: f64,
    /// Marketing can add at most this fraction to the success score.
    pub marketing_bonus_cap: f64,
    /// Dollars of marketing spend per full effectiveness unit.
    pub marketing_budget_scale: f64,
    /// Revenue bonus per prior release, and its cap.
    pub experience_step: f64,
    pub experience_cap: f64,
    /// Cap on the fan-loyalty revenue bonus.
    pub loyalty_revenue_cap: f64,
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        Self {
            revenue_scale: 2.0,
            first_release_bonus: 1.1,
            marketing_bonus_cap: 0.5,
            marketing_budget_scale: 10_000.0,
            experience_step: 0.1,
            experience_cap: 0.5,
            loyalty_revenue_cap: 0.3,
        }
    }
}

impl ReleasePolicy {
    /// The shared default policy.
    pub fn default_policy() -> &'static Self {
        static POLICY: OnceLock<ReleasePolicy> = OnceLock::new();
        POLICY.get_or_init(Self::default)
    }
}

/// One critic's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub outlet: String,
    pub score: i32,
    pub quote: String,
    /// One of the persona's declared focus areas.
    pub focus: String,
}

/// Everything produced by shipping a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseOutcome {
    pub game: ReleasedGame,
    pub reviews: Vec<Review>,
    pub mentions: Vec<String>,
}

/// Success-score bonus from marketing spend, scaled by market presence and
/// clamped to a sane band.
#[must_use]
pub fn marketing_effectiveness(
    policy: &ReleasePolicy,
    budget_dollars: f64,
    market_presence: f64,
) -> f64 {
    let bonus = (budget_dollars / policy.marketing_budget_scale * (0.5 + market_presence))
        .min(policy.marketing_bonus_cap);
    (1.0 + bonus).clamp(0.9, 1.5)
}

/// Timing multiplier for the chosen launch window. An optimal window rides
/// the genre's current growth.
#[must_use]
pub fn timing_impact(window: LaunchWindow, genre_growth: f64) -> f64 {
    let factor = match window {
        LaunchWindow::Immediate => 0.95,
        LaunchWindow::Delayed => 1.02,
        LaunchWindow::Optimal => 1.05 + genre_growth.max(0.0).min(0.1),
    };
    factor.clamp(0.9, 1.5)
}

const fn rush_penalty(tests_completed: u32) -> f64 {
    match tests_completed {
        0 => 0.5,
        1 => 0.7,
        2 => 0.85,
        _ => 1.0,
    }
}

fn bug_score_penalty(critical: u32, major: u32, minor: u32) -> f64 {
    (u32_to_f64(critical) * 5.0 + u32_to_f64(major) * 2.0 + u32_to_f64(minor) * 0.5).min(50.0)
}

fn bug_revenue_loss(critical: u32, major: u32, minor: u32) -> f64 {
    (u32_to_f64(critical) * 0.05 + u32_to_f64(major) * 0.02 + u32_to_f64(minor) * 0.01).min(0.75)
}

/// Per-segment multipliers for a marketing strategy: (casual, hardcore,
/// critics).
const fn strategy_multipliers(strategy: MarketingStrategy) -> (f64, f64, f64) {
    match strategy {
        MarketingStrategy::Casual => (1.2, 0.8, 0.9),
        MarketingStrategy::Hardcore => (0.8, 1.2, 1.1),
        MarketingStrategy::Balanced => (1.0, 1.0, 1.0),
    }
}

/// How strongly the finished game expresses the abstract metrics reviewer
/// biases refer to, each 0 to 1. Captured before the press cycle so review
/// scoring does not need the project itself.
#[derive(Debug, Clone, Copy)]
struct MetricProfile {
    performance: f64,
    usability: f64,
    stability: f64,
    visual: f64,
}

impl MetricProfile {
    fn expression(&self, metric: &str) -> f64 {
        match metric {
            "technical_quality" => self.performance,
            "user_experience" => self.usability,
            "polish" => self.stability,
            "visual_quality" | "visual_style" => self.visual,
            // unknown metrics read as indifferent
            _ => 0.5,
        }
    }
}

fn reviewer_score(profile: MetricProfile, reviewer: &ReviewerProfile, base: f64) -> i32 {
    let mut multiplier = 1.0;
    for (metric, bias) in &reviewer.biases {
        multiplier *= 1.0 + (bias - 1.0) * profile.expression(metric);
    }
    round_f64_to_i32((base * multiplier).clamp(0.0, 100.0))
}

fn pick_quote(rng: &mut ChaCha20Rng, reviewer: &ReviewerProfile, score: i32) -> String {
    let pool = if score >= 80 {
        &reviewer.quotes.positive
    } else if score >= 50 {
        &reviewer.quotes.neutral
    } else {
        &reviewer.quotes.negative
    };
    if pool.is_empty() {
        return String::new();
    }
    pool[rng.random_range(0..pool.len())].clone()
}

fn write_reviews(
    rng: &mut ChaCha20Rng,
    data: &ReferenceData,
    base: f64,
    profile: MetricProfile,
) -> Vec<Review> {
    let personas = &data.reviewers.reviewers;
    if personas.is_empty() {
        return Vec::new();
    }
    let count = rng.random_range(3..=5).min(personas.len());
    let mut picked: SmallVec<[usize; 5]> = SmallVec::new();
    while picked.len() < count {
        let index = rng.random_range(0..personas.len());
        if !picked.contains(&index) {
            picked.push(index);
        }
    }
    picked
        .into_iter()
        .map(|index| {
            let persona = &personas[index];
            let score = reviewer_score(profile, persona, base);
            let focus = if persona.focuses.is_empty() {
                String::new()
            } else {
                persona.focuses[rng.random_range(0..persona.focuses.len())].clone()
            };
            Review {
                reviewer_id: persona.id.clone(),
                reviewer_name: persona.name.clone(),
                outlet: persona.title.clone(),
                score,
                quote: pick_quote(rng, persona, score),
                focus,
            }
        })
        .collect()
}

/// Ship the active project.
///
/// The pipeline: final quality from development state, commercial success
/// from quality and market position, revenue from success and budget, then
/// audience reception and press. The project is cleared, history and
/// reputation updated, and revenue credited.
///
/// # Errors
///
/// Fails when no project is active, the project is not in the release
/// phase, or any of the three release decisions is missing.
pub fn release_game(state: &mut GameState) -> Result<ReleaseOutcome, CommandError> {
    release_game_with_policy(state, ReleasePolicy::default_policy())
}

#[allow(clippy::too_many_lines)]
pub fn release_game_with_policy(
    state: &mut GameState,
    policy: &ReleasePolicy,
) -> Result<ReleaseOutcome, CommandError> {
    state.normalize();
    if state.rng.is_none() {
        state.rng = Some(stream_rng(state.seed, STREAM_RESUME, u64::from(state.week)));
    }
    let team_efficiency = state.team_efficiency();

    // Gate: active release-phase project with all three decisions made.
    {
        let project = state.project.as_ref().ok_or(CommandError::NoActiveProject)?;
        if project.phase != DevPhase::Release {
            return Err(CommandError::Lifecycle(
                crate::project::LifecycleError::WrongPhase {
                    operation: "release",
                    phase: project.phase,
                },
            ));
        }
        let missing = project.missing_release_decisions();
        if !missing.is_empty() {
            return Err(CommandError::ProjectNotReady { missing });
        }
    }

    let (game, reviews, mentions, marketing_budget_cents, target_audience) = {
        let data = state.data.as_ref().ok_or_else(|| {
            CommandError::InvalidSelection("reference data not loaded".to_string())
        })?;
        let project = state
            .project
            .as_ref()
            .ok_or(CommandError::NoActiveProject)?;
        let priority = project.priority.unwrap_or(Priority::Balanced);
        let strategy = project
            .marketing_strategy
            .unwrap_or(MarketingStrategy::Balanced);
        let window = project.launch_window.unwrap_or(LaunchWindow::Immediate);
        let bugs = project.bugs;

        // Final quality.
        let mut quality = project.quality;
        quality *= priority.quality_factor();
        quality *= 0.8 + team_efficiency * 0.4;
        quality *= state.modifiers.quality;
        let severity_factor = 1.0
            - (u32_to_f64(bugs.critical) * 0.4
                + u32_to_f64(bugs.major) * 0.2
                + u32_to_f64(bugs.minor) * 0.1);
        quality *= severity_factor.max(0.1);
        quality *= rush_penalty(project.tests_run.completed());
        quality *= (1.0 - (u32_to_f64(bugs.total) * 0.02).min(0.5)).max(0.0);
        let final_quality = round_f64_to_i32(quality.clamp(0.0, 100.0));

        // Commercial success, before any bug deductions.
        let budget_dollars = cents_to_dollars(project.marketing_budget_cents);
        let mut success = f64::from(final_quality);
        success *= marketing_effectiveness(policy, budget_dollars, state.reputation.market_presence);
        success *= timing_impact(window, state.market.growth(&project.genre));
        if state.history.is_empty() {
            success *= policy.first_release_bonus;
        }
        success *= state
            .market
            .entry_modifier(&project.genre, state.releases_in_genre(&project.genre));
        let market_success = success.clamp(0.0, 100.0);

        // Revenue derives from the pre-deduction score. The loyalty bonus
        // keys off the genre the studio is known for, not the one it just
        // shipped.
        let fan_loyalty = state
            .most_released_genre()
            .and_then(|genre| data.genres.genres.get(genre))
            .map_or(0.0, |g| g.fan_loyalty);
        let experience_bonus =
            (policy.experience_step * state.history.len() as f64).min(policy.experience_cap);
        let loyalty_bonus =
            (state.reputation.average_loyalty() * fan_loyalty).min(policy.loyalty_revenue_cap);
        let revenue_multiplier =
            1.0 + state.reputation.market_presence + experience_bonus + loyalty_bonus;
        let mut revenue = market_success / 100.0
            * cents_to_dollars(project.initial_budget_cents)
            * policy.revenue_scale
            * revenue_multiplier;

        // Bug impact lands last: the open bug pool dents the headline score
        // and shaves revenue, each on its own scale.
        let success_score = round_f64_to_i32(
            (market_success - bug_score_penalty(bugs.critical, bugs.major, bugs.minor))
                .clamp(0.0, 100.0),
        );
        revenue *= 1.0 - bug_revenue_loss(bugs.critical, bugs.major, bugs.minor);
        let revenue_cents = dollars_to_cents(revenue).max(0);

        // Reception per audience segment.
        let reception_base = f64::from(success_score) * 0.8;
        let (mult_casual, mult_hardcore, mult_critics) = strategy_multipliers(strategy);
        let segment_score = |segment: &str, multiplier: f64| {
            let preference = data.genre_preference(segment, &project.genre).unwrap_or(1.0);
            let loyalty = state.reputation.segment(segment).loyalty;
            round_f64_to_i32(
                (reception_base * multiplier * preference * (0.9 + loyalty * 0.2))
                    .clamp(0.0, 100.0),
            )
        };
        let reception = ReceptionScores {
            casual: segment_score("casual", mult_casual),
            hardcore: segment_score("hardcore", mult_hardcore),
            critics: segment_score("critics", mult_critics),
        };

        let game = ReleasedGame {
            name: project.name.clone(),
            genre: project.genre.clone(),
            subgenre: project.subgenre.clone(),
            quality: final_quality,
            success_score,
            revenue_cents,
            reception,
            bugs_at_release: bugs.total,
            development_weeks: project.weeks_elapsed,
            released_week: state.week,
        };
        let marketing_budget_cents = project.marketing_budget_cents;
        let target_audience = project.target_audience;

        let profile = MetricProfile {
            performance: project.quality_metrics.performance / 100.0,
            usability: project.quality_metrics.usability / 100.0,
            stability: project.quality_metrics.stability / 100.0,
            visual: (state.modifiers.visual_quality / 1.5).min(1.0),
        };
        let company = state.company_name.clone();
        let genre = project.genre.clone();
        let rng = state
            .rng
            .as_mut()
            .ok_or_else(|| CommandError::InvalidSelection("rng not available".to_string()))?;
        let reviews = write_reviews(rng, data, f64::from(success_score), profile);
        let mentions = social_mentions(rng, data, &company, &genre, success_score);
        (game, reviews, mentions, marketing_budget_cents, target_audience)
    };

    // Fold the result into studio state.
    state.credit(game.revenue_cents);
    if let Some(data) = state.data.as_ref() {
        state.reputation.apply_release(
            data,
            &game.genre,
            target_audience.as_str(),
            f64::from(game.success_score),
            marketing_budget_cents,
        );
    }
    state.reputation.record_mentions(&mentions);
    state
        .logs
        .push(format!("{LOG_GAME_RELEASED_PREFIX}{}", game.name));
    state.history.push(game.clone());
    state.project = None;

    Ok(ReleaseOutcome {
        game,
        reviews,
        mentions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferenceData;
    use crate::project::{OptimizationFocus, Project, TestsRun};
    use rand::SeedableRng;

    fn ready_state(quality: f64) -> GameState {
        let mut state = GameState::default();
        state.company_name = "Moon Frog".to_string();
        state.seed = 7;
        state.rng = Some(ChaCha20Rng::seed_from_u64(7));
        state.data = Some(ReferenceData::default_config());
        let mut project = Project::sample("puzzle", "match3");
        project.phase = DevPhase::Release;
        project.quality = quality;
        project.tests_run = TestsRun {
            unit: true,
            integration: true,
            playtest: true,
        };
        project.marketing_strategy = Some(MarketingStrategy::Balanced);
        project.launch_window = Some(LaunchWindow::Immediate);
        project.optimization_focus = Some(OptimizationFocus::Balance);
        state.project = Some(project);
        state
    }

    #[test]
    fn missing_decisions_block_the_release() {
        let mut state = ready_state(80.0);
        state.project.as_mut().unwrap().marketing_strategy = None;
        let err = release_game(&mut state).unwrap_err();
        match err {
            CommandError::ProjectNotReady { missing } => {
                assert_eq!(missing, vec!["marketing_strategy".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(state.project.is_some(), "failed release must not consume the project");
    }

    #[test]
    fn release_outside_phase_is_rejected() {
        let mut state = ready_state(80.0);
        state.project.as_mut().unwrap().phase = DevPhase::Testing;
        assert!(release_game(&mut state).is_err());
    }

    #[test]
    fn clean_first_release_maxes_out() {
        // solo team: final quality 80 * 1.2 teamwork factor = 96; the first
        // release and novelty bonuses push success past the clamp.
        let mut state = ready_state(80.0);
        let money_before = state.money_cents;
        let outcome = release_game(&mut state).unwrap();
        assert_eq!(outcome.game.quality, 96);
        assert_eq!(outcome.game.success_score, 100);
        // revenue = 1.0 * $1,000 * 2; a debut has no presence, experience,
        // or loyalty bonus yet
        assert_eq!(outcome.game.revenue_cents, 200_000);
        assert_eq!(state.money_cents - money_before, 200_000);
        assert!(state.project.is_none());
        assert_eq!(state.history.len(), 1);
        assert!(state
            .logs
            .iter()
            .any(|l| l.starts_with(LOG_GAME_RELEASED_PREFIX)));
    }

    #[test]
    fn bugs_drag_quality_and_revenue() {
        let mut clean = ready_state(80.0);
        let clean_outcome = release_game(&mut clean).unwrap();

        let mut buggy = ready_state(80.0);
        buggy.project.as_mut().unwrap().bugs.add(2, 3, 5);
        let buggy_outcome = release_game(&mut buggy).unwrap();

        assert!(buggy_outcome.game.quality < clean_outcome.game.quality);
        assert!(buggy_outcome.game.success_score < clean_outcome.game.success_score);
        assert!(buggy_outcome.game.revenue_cents < clean_outcome.game.revenue_cents);
    }

    #[test]
    fn bug_deduction_zeroes_the_score_without_zeroing_revenue() {
        // revenue comes off the market score; the bug deduction only dents
        // the displayed score, so a flopped headline can still sell
        let mut state = ready_state(100.0);
        state.project.as_mut().unwrap().bugs.add(2, 3, 5);
        let outcome = release_game(&mut state).unwrap();
        assert_eq!(outcome.game.success_score, 0);
        assert!(outcome.game.revenue_cents > 0);
    }

    #[test]
    fn loyalty_bonus_keys_off_the_staple_genre() {
        fn shipped(genre: &str) -> ReleasedGame {
            ReleasedGame {
                name: "Back Catalog".to_string(),
                genre: genre.to_string(),
                subgenre: String::new(),
                quality: 70,
                success_score: 70,
                revenue_cents: 0,
                reception: ReceptionScores::default(),
                bugs_at_release: 0,
                development_weeks: 10,
                released_week: 10,
            }
        }

        // a debut studio has no staple genre, so perfect loyalty pays nothing
        let mut debut = ready_state(80.0);
        for id in crate::reputation::REACTING_SEGMENTS {
            debut
                .reputation
                .segments
                .entry(id.to_string())
                .or_default()
                .loyalty = 1.0;
        }
        assert_eq!(release_game(&mut debut).unwrap().game.revenue_cents, 200_000);

        // a puzzle studio shipping an rpg earns loyalty at the puzzle rate
        // (0.8), not the rpg rate (1.5)
        let mut veteran = ready_state(80.0);
        veteran.history.push(shipped("puzzle"));
        veteran.history.push(shipped("puzzle"));
        for id in crate::reputation::REACTING_SEGMENTS {
            veteran
                .reputation
                .segments
                .entry(id.to_string())
                .or_default()
                .loyalty = 0.25;
        }
        veteran.project.as_mut().unwrap().genre = "rpg".to_string();
        let outcome = release_game(&mut veteran).unwrap();
        // revenue = 1.0 * $1,000 * 2 * (1 + 0.2 experience + 0.25 * 0.8)
        assert_eq!(outcome.game.revenue_cents, 280_000);
    }

    #[test]
    fn skipping_tests_rushes_the_launch() {
        let mut tested = ready_state(80.0);
        let tested_quality = release_game(&mut tested).unwrap().game.quality;

        let mut rushed = ready_state(80.0);
        rushed.project.as_mut().unwrap().tests_run = TestsRun::default();
        let rushed_quality = release_game(&mut rushed).unwrap().game.quality;

        // 0 tests run halves the quality factor
        assert!(f64::from(rushed_quality) <= f64::from(tested_quality) * 0.5 + 1.0);
    }

    #[test]
    fn press_cycle_produces_reviews_and_mentions() {
        let mut state = ready_state(70.0);
        let outcome = release_game(&mut state).unwrap();
        assert!((3..=5).contains(&outcome.reviews.len()));
        let mut seen = std::collections::HashSet::new();
        for review in &outcome.reviews {
            assert!((0..=100).contains(&review.score));
            assert!(!review.quote.is_empty());
            assert!(seen.insert(review.reviewer_id.clone()), "duplicate reviewer");
        }
        assert_eq!(outcome.mentions.len(), 3);
    }

    #[test]
    fn casual_strategy_skews_reception() {
        let mut state = ready_state(80.0);
        state.project.as_mut().unwrap().marketing_strategy = Some(MarketingStrategy::Hardcore);
        // shooter skews hardcore in the preference tables
        let project = state.project.as_mut().unwrap();
        project.genre = "shooter".to_string();
        let outcome = release_game(&mut state).unwrap();
        assert!(outcome.game.reception.hardcore >= outcome.game.reception.casual);
    }

    #[test]
    fn marketing_effectiveness_is_banded() {
        let policy = ReleasePolicy::default_policy();
        assert!((marketing_effectiveness(policy, 0.0, 0.5) - 1.0).abs() < f64::EPSILON);
        assert!(marketing_effectiveness(policy, 1_000_000.0, 1.0) <= 1.5);
    }

    #[test]
    fn timing_rides_genre_growth() {
        assert!((timing_impact(LaunchWindow::Immediate, 0.2) - 0.95).abs() < f64::EPSILON);
        assert!((timing_impact(LaunchWindow::Delayed, 0.2) - 1.02).abs() < f64::EPSILON);
        assert!((timing_impact(LaunchWindow::Optimal, 0.2) - 1.15).abs() < f64::EPSILON);
        // negative growth never penalizes an optimal window below its base
        assert!((timing_impact(LaunchWindow::Optimal, -0.2) - 1.05).abs() < f64::EPSILON);
    }
}
