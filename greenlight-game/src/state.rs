use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::ReferenceData;
use crate::market::MarketState;
use crate::project::{LifecycleError, Project, ProjectDraft};
use crate::reputation::Reputation;
use crate::rngs::{self, STREAM_RESUME};
use crate::staff::{Candidate, StaffMember};

pub(crate) const STARTING_MONEY_CENTS: i64 = 1_000_000; // $10,000.00
pub(crate) const AUTOSAVE_INTERVAL_WEEKS: u32 = 4;
pub(crate) const DEFAULT_WORKSPACE: &str = "home_office";
pub(crate) const LOG_DRAFT_DISCARDED: &str = "log.draft.discarded";
pub(crate) const LOG_AUTOSAVE_DUE: &str = "log.autosave.due";
pub(crate) const LOG_RESEARCH_COMPLETE_PREFIX: &str = "log.research.complete.";
pub(crate) const LOG_WORKSPACE_UPGRADED_PREFIX: &str = "log.workspace.upgraded.";
pub(crate) const LOG_STAFF_HIRED_PREFIX: &str = "log.staff.hired.";
pub(crate) const LOG_STAFF_FIRED_PREFIX: &str = "log.staff.fired.";

/// Company-wide multiplicative modifiers. All start at 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default = "default_mult")]
    pub development_speed: f64,
    #[serde(default = "default_mult")]
    pub development_cost: f64,
    #[serde(default = "default_mult")]
    pub bug_rate: f64,
    #[serde(default = "default_mult")]
    pub testing_effectiveness: f64,
    #[serde(default = "default_mult")]
    pub bug_detection: f64,
    #[serde(default = "default_mult")]
    pub quality: f64,
    #[serde(default = "default_mult")]
    pub visual_quality: f64,
    #[serde(default = "default_mult")]
    pub optimization: f64,
    #[serde(default = "default_mult")]
    pub polish: f64,
    #[serde(default = "default_mult")]
    pub team_effectiveness: f64,
}

fn default_mult() -> f64 {
    1.0
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            development_speed: 1.0,
            development_cost: 1.0,
            bug_rate: 1.0,
            testing_effectiveness: 1.0,
            bug_detection: 1.0,
            quality: 1.0,
            visual_quality: 1.0,
            optimization: 1.0,
            polish: 1.0,
            team_effectiveness: 1.0,
        }
    }
}

impl Modifiers {
    /// Apply a named multiplier, as technology effects reference modifiers
    /// by name in the reference tables.
    pub fn apply_named(&mut self, name: &str, mult: f64) {
        match name {
            "development_speed" => self.development_speed *= mult,
            "development_cost" => self.development_cost *= mult,
            "bug_rate" => self.bug_rate *= mult,
            "testing_effectiveness" => self.testing_effectiveness *= mult,
            "bug_detection" => self.bug_detection *= mult,
            "quality" => self.quality *= mult,
            "visual_quality" => self.visual_quality *= mult,
            "optimization" => self.optimization *= mult,
            "polish" => self.polish *= mult,
            "team_effectiveness" => self.team_effectiveness *= mult,
            other => log::warn!("ignoring unknown modifier effect: {other}"),
        }
    }
}

/// A technology research project in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Research {
    pub tech_id: String,
    pub weeks_remaining: u32,
}

/// Immutable snapshot of a completed release, appended to game history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleasedGame {
    pub name: String,
    pub genre: String,
    pub subgenre: String,
    pub quality: i32,
    pub success_score: i32,
    pub revenue_cents: i64,
    pub reception: ReceptionScores,
    pub bugs_at_release: u32,
    pub development_weeks: u32,
    pub released_week: u32,
}

/// Per-segment reception scores on the 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ReceptionScores {
    pub casual: i32,
    pub hardcore: i32,
    pub critics: i32,
}

/// Errors produced by player-facing command operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("a project is already active")]
    ProjectAlreadyActive,
    #[error("no active project")]
    NoActiveProject,
    #[error("insufficient funds: need {needed_cents} cents, have {available_cents}")]
    InsufficientFunds {
        needed_cents: i64,
        available_cents: i64,
    },
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("project is not ready for release: missing {missing:?}")]
    ProjectNotReady { missing: Vec<String> },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// The one mutable aggregate the simulation core operates on.
///
/// Every mutating operation starts by calling [`GameState::normalize`], which
/// repairs the single known corruption pattern (draft and project both
/// present) so the rest of the core can assume a consistent shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub company_name: String,
    pub seed: u64,
    /// Current week, 1-based.
    #[serde(default = "default_week")]
    pub week: u32,
    #[serde(default = "default_money")]
    pub money_cents: i64,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default = "default_workspace")]
    pub workspace: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub research: Option<Research>,
    #[serde(default)]
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub project: Option<Project>,
    /// Pre-confirmation wizard state; mutually exclusive with `project`.
    #[serde(default)]
    pub draft: Option<ProjectDraft>,
    #[serde(default)]
    pub reputation: Reputation,
    #[serde(default)]
    pub market: MarketState,
    #[serde(default)]
    pub history: Vec<ReleasedGame>,
    pub logs: Vec<String>,
    /// Set every fourth week; the embedding layer saves and clears it.
    #[serde(default)]
    pub autosave_due: bool,
    #[serde(skip)]
    pub rng: Option<ChaCha20Rng>,
    #[serde(skip)]
    pub data: Option<ReferenceData>,
}

fn default_week() -> u32 {
    1
}

fn default_money() -> i64 {
    STARTING_MONEY_CENTS
}

fn default_workspace() -> String {
    DEFAULT_WORKSPACE.to_string()
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            seed: 0,
            week: default_week(),
            money_cents: default_money(),
            modifiers: Modifiers::default(),
            workspace: default_workspace(),
            technologies: Vec::new(),
            research: None,
            staff: Vec::new(),
            candidates: Vec::new(),
            project: None,
            draft: None,
            reputation: Reputation::default(),
            market: MarketState::default(),
            history: Vec::new(),
            logs: vec![String::from("log.studio.founded")],
            autosave_due: false,
            rng: None,
            data: None,
        }
    }
}

impl GameState {
    /// Create a fresh state for a new campaign.
    #[must_use]
    pub fn new(company_name: &str, seed: u64, data: ReferenceData) -> Self {
        let mut state = Self {
            company_name: company_name.to_string(),
            seed,
            rng: Some(ChaCha20Rng::seed_from_u64(seed)),
            data: Some(data),
            ..Self::default()
        };
        state.market = MarketState::initialize(&state);
        state
    }

    /// Repair the known corrupted-state condition: a confirmed project and a
    /// pre-confirmation draft existing at the same time. The draft loses.
    pub fn normalize(&mut self) {
        if self.project.is_some() && self.draft.is_some() {
            log::warn!("discarding stale project draft alongside active project");
            self.draft = None;
            self.logs.push(LOG_DRAFT_DISCARDED.to_string());
        }
        if let Some(project) = self.project.as_mut() {
            project.bugs.sync_total();
        }
    }

    /// Reattach reference data and a deterministic RNG after loading a save.
    #[must_use]
    pub fn rehydrate(mut self, data: ReferenceData) -> Self {
        self.data = Some(data);
        if self.rng.is_none() {
            self.rng = Some(rngs::stream_rng(
                self.seed,
                STREAM_RESUME,
                u64::from(self.week),
            ));
        }
        self.normalize();
        self
    }

    /// Charge an amount, failing without mutation when funds are short.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` when the balance cannot cover the charge.
    pub fn charge(&mut self, cents: i64) -> Result<(), CommandError> {
        if cents > self.money_cents {
            return Err(CommandError::InsufficientFunds {
                needed_cents: cents,
                available_cents: self.money_cents,
            });
        }
        self.money_cents -= cents;
        Ok(())
    }

    /// Add revenue or refunds to the balance.
    pub fn credit(&mut self, cents: i64) {
        self.money_cents = self.money_cents.saturating_add(cents);
    }

    /// Deduct running costs. Unlike [`GameState::charge`] this may push the
    /// balance negative; the studio carries debt rather than halting time.
    pub fn deduct_costs(&mut self, cents: i64) {
        self.money_cents = self.money_cents.saturating_sub(cents);
    }

    /// Sum of weekly staff salaries in cents.
    #[must_use]
    pub fn total_salaries_cents(&self) -> i64 {
        self.staff.iter().map(|s| s.salary_cents).sum()
    }

    /// Reference data accessor for operations that require it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelection` when the state was not rehydrated.
    pub fn reference(&self) -> Result<&ReferenceData, CommandError> {
        self.data
            .as_ref()
            .ok_or_else(|| CommandError::InvalidSelection("reference data not loaded".to_string()))
    }

    /// Number of releases in a given genre across studio history.
    #[must_use]
    pub fn releases_in_genre(&self, genre: &str) -> usize {
        self.history.iter().filter(|g| g.genre == genre).count()
    }

    /// The genre the studio has shipped most often, if it has shipped at
    /// all. Ties break toward the alphabetically first genre so the answer
    /// is stable.
    #[must_use]
    pub fn most_released_genre(&self) -> Option<&str> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for game in &self.history {
            match counts.iter_mut().find(|(g, _)| *g == game.genre) {
                Some((_, n)) => *n += 1,
                None => counts.push((game.genre.as_str(), 1)),
            }
        }
        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
            .map(|(genre, _)| genre)
    }
}
