//! The weekly tick: events, costs, development progress, milestones, and
//! the slow-moving systems (market, staff, research) that ride along.

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::events::{self, WeeklyEvent};
use crate::numbers::dollars_to_cents;
use crate::project::{DevPhase, Milestone, BASE_WEEKLY_COST_DOLLARS, LOG_PHASE_PREFIX};
use crate::state::{GameState, AUTOSAVE_INTERVAL_WEEKS, LOG_AUTOSAVE_DUE};
use crate::{staff, tech};

const SOLO_WEEKLY_PROGRESS: f64 = 5.0;
const TEAM_WEEKLY_PROGRESS: f64 = 10.0;
const RISK_EVENT_CHANCE: f64 = 0.25;
const MILESTONE_MORALE_BOOST: i32 = 10;
const BETA_BUG_CULL: f64 = 0.8;

const LOG_MILESTONE_PREFIX: &str = "log.milestone.";
const LOG_RISK_TECH_DEBT: &str = "log.risk.tech_debt";
const LOG_RISK_SCOPE_CREEP: &str = "log.risk.scope_creep";
const LOG_RISK_BREAKTHROUGH: &str = "log.risk.breakthrough";

/// Everything that happened during one call to [`advance_week`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    /// The week that just elapsed.
    pub week: u32,
    pub event: WeeklyEvent,
    /// Operating costs deducted, salaries included.
    pub costs_cents: i64,
    /// Development progress gained this week, zero outside development.
    pub progress_delta: f64,
    pub milestones: SmallVec<[Milestone; 4]>,
    /// Set when the project auto-advanced into a new phase.
    pub phase_changed: Option<DevPhase>,
    pub research_completed: Option<String>,
    pub autosave_due: bool,
}

/// A development risk event rolled during the weekly progress step. The
/// impact percentage scales that week's progress gain.
fn risk_impact(roll: f64) -> (f64, &'static str) {
    if roll < 0.375 {
        (-5.0, LOG_RISK_TECH_DEBT)
    } else if roll < 0.75 {
        (-10.0, LOG_RISK_SCOPE_CREEP)
    } else {
        (15.0, LOG_RISK_BREAKTHROUGH)
    }
}

fn milestone_crossings(
    previous: f64,
    current: f64,
    fired: &[Milestone],
) -> SmallVec<[Milestone; 4]> {
    Milestone::ALL
        .iter()
        .copied()
        .filter(|m| !fired.contains(m) && previous < m.threshold() && current >= m.threshold())
        .collect()
}

fn apply_milestone(state: &mut GameState, milestone: Milestone) {
    match milestone {
        Milestone::DesignReview => state.modifiers.development_speed *= 1.1,
        Milestone::FeatureComplete => state.modifiers.bug_rate *= 0.9,
        Milestone::Alpha => state.modifiers.quality *= 1.1,
        Milestone::Beta => {
            if let Some(project) = state.project.as_mut() {
                project.bugs.scale(BETA_BUG_CULL);
            }
        }
    }
    if let Some(project) = state.project.as_mut() {
        if !project.milestones_fired.contains(&milestone) {
            project.milestones_fired.push(milestone);
        }
        project.add_morale(MILESTONE_MORALE_BOOST);
    }
    state
        .logs
        .push(format!("{LOG_MILESTONE_PREFIX}{}", milestone.key()));
}

/// Advance the simulation by one week.
///
/// The order is fixed: event draw, market side effect, operating costs,
/// project step (auto-advances included), staff processing, research tick,
/// market drift, then the calendar itself. A project whose priority was
/// chosen moves from planning into development and gains its first week of
/// progress in the same tick.
pub fn advance_week(state: &mut GameState) -> WeeklyReport {
    state.normalize();
    let week = state.week;

    // Without an RNG (a save that was never rehydrated) the week is quiet:
    // no event, no risk rolls, deterministic progress.
    let event = state
        .rng
        .as_mut()
        .map_or_else(WeeklyEvent::uneventful, events::draw_weekly_event);
    state.logs.push(event.key.clone());
    if let Some(effect) = &event.market_effect {
        state.market.apply_effect(effect);
    }

    let operating = dollars_to_cents(BASE_WEEKLY_COST_DOLLARS * event.money_effect);
    let salaries = staff::process_week(state);
    let costs = operating + salaries;
    state.deduct_costs(costs);
    if let Some(project) = state.project.as_mut() {
        project.spent_cents += costs;
        project.add_morale(event.morale_effect);
    }

    let mut phase_changed = None;
    let mut progress_delta = 0.0;
    let mut milestones = SmallVec::new();

    // Planning completes on its own once the priority decision is made; the
    // manual transition stays available for impatient players. Development
    // work starts the same week.
    if state
        .project
        .as_ref()
        .is_some_and(|p| p.phase == DevPhase::Planning && p.priority.is_some())
    {
        let bug_rate = state.modifiers.bug_rate;
        if let Some(project) = state.project.as_mut() {
            project.enter_phase(DevPhase::Development, week, bug_rate);
        }
        state
            .logs
            .push(format!("{LOG_PHASE_PREFIX}{}", DevPhase::Development));
        phase_changed = Some(DevPhase::Development);
    }

    if state
        .project
        .as_ref()
        .is_some_and(|p| p.phase == DevPhase::Development)
    {
        let team_efficiency = state.team_efficiency();
        let speed = state.project.as_ref().map_or(1.0, |p| p.dev_speed);
        let base = if state.staff.is_empty() {
            SOLO_WEEKLY_PROGRESS
        } else {
            TEAM_WEEKLY_PROGRESS * team_efficiency
        };
        let mut gain = base * speed;

        if let Some(rng) = state.rng.as_mut() {
            if rng.random_bool(RISK_EVENT_CHANCE) {
                let (impact, key) = risk_impact(rng.random());
                gain *= 1.0 + impact / 100.0;
                state.logs.push(key.to_string());
            }
        }

        let (previous, current) = state.project.as_mut().map_or((0.0, 0.0), |project| {
            let previous = project.progress;
            project.progress = (project.progress + gain).min(100.0);
            project.phase_progress = (project.phase_progress + gain).min(100.0);
            (previous, project.progress)
        });
        progress_delta = current - previous;

        let fired = state
            .project
            .as_ref()
            .map(|p| p.milestones_fired.clone())
            .unwrap_or_default();
        milestones = milestone_crossings(previous, current, &fired);
        for milestone in milestones.clone() {
            apply_milestone(state, milestone);
        }

        if current >= 100.0 {
            let bug_rate = state.modifiers.bug_rate;
            if let Some(project) = state.project.as_mut() {
                project.enter_phase(DevPhase::Testing, week, bug_rate);
            }
            state
                .logs
                .push(format!("{LOG_PHASE_PREFIX}{}", DevPhase::Testing));
            phase_changed = Some(DevPhase::Testing);
        }
    }

    if let Some(project) = state.project.as_mut() {
        project.weeks_elapsed += 1;
    }

    let research_completed = tech::tick_research(state);

    let genre_ids: Vec<String> = {
        let mut ids: Vec<String> = state
            .data
            .as_ref()
            .map(|d| d.genres.genres.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    };
    state.market.tick_week(state.seed, week, &genre_ids);

    state.week += 1;
    let autosave_due = state.week % AUTOSAVE_INTERVAL_WEEKS == 0;
    state.autosave_due = autosave_due;
    if autosave_due {
        state.logs.push(LOG_AUTOSAVE_DUE.to_string());
    }

    WeeklyReport {
        week,
        event,
        costs_cents: costs,
        progress_delta,
        milestones,
        phase_changed,
        research_completed,
        autosave_due,
    }
}
