//! Project lifecycle: the planning -> development -> testing -> release
//! state machine, its gating requirements, and the decision setters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::bugs::BugCounts;
use crate::numbers::{ceil_f64_to_u32, dollars_to_cents, round_f64_to_i32};
use crate::state::{CommandError, GameState};

pub(crate) const BASE_BUDGET_DOLLARS: f64 = 1_000.0;
pub(crate) const BASE_WEEKLY_COST_DOLLARS: f64 = 100.0;
pub(crate) const BASE_ESTIMATED_WEEKS: f64 = 16.0;
pub(crate) const ELEMENT_MULT_STEP: f64 = 0.1;
pub(crate) const REQUIRED_ELEMENTS: usize = 3;
const TESTING_BUG_SEED_BASE: f64 = 10.0;
const MORALE_MAX: i32 = 100;
pub(crate) const LOG_PHASE_PREFIX: &str = "log.phase.";

/// The four sequential lifecycle stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DevPhase {
    #[default]
    Planning,
    Development,
    Testing,
    Release,
}

impl DevPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Release => "release",
        }
    }

    /// The only phase this one may transition into, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Planning => Some(Self::Development),
            Self::Development => Some(Self::Testing),
            Self::Testing => Some(Self::Release),
            Self::Release => None,
        }
    }
}

impl fmt::Display for DevPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DevPhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(Self::Planning),
            "development" => Ok(Self::Development),
            "testing" => Ok(Self::Testing),
            "release" => Ok(Self::Release),
            _ => Err(()),
        }
    }
}

/// Development priority, chosen during planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Quality,
    #[default]
    Balanced,
    Speed,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    /// Multiplier on the bug count seeded when testing begins.
    #[must_use]
    pub const fn bug_factor(self) -> f64 {
        match self {
            Self::Quality => 0.7,
            Self::Balanced => 1.0,
            Self::Speed => 1.4,
        }
    }

    /// One-time morale cost applied when the priority is chosen.
    #[must_use]
    pub const fn morale_impact(self) -> i32 {
        match self {
            Self::Quality => -5,
            Self::Balanced => 0,
            Self::Speed => -10,
        }
    }

    /// Final-quality multiplier applied by the release scorer.
    #[must_use]
    pub const fn quality_factor(self) -> f64 {
        match self {
            Self::Quality => 1.2,
            Self::Balanced => 1.0,
            Self::Speed => 0.8,
        }
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketingStrategy {
    Casual,
    Balanced,
    Hardcore,
}

impl MarketingStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Balanced => "balanced",
            Self::Hardcore => "hardcore",
        }
    }
}

impl FromStr for MarketingStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "casual" => Ok(Self::Casual),
            "balanced" => Ok(Self::Balanced),
            "hardcore" => Ok(Self::Hardcore),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchWindow {
    Immediate,
    Optimal,
    Delayed,
}

impl FromStr for LaunchWindow {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" => Ok(Self::Immediate),
            "optimal" => Ok(Self::Optimal),
            "delayed" => Ok(Self::Delayed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationFocus {
    Performance,
    Features,
    Balance,
}

impl FromStr for OptimizationFocus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "performance" => Ok(Self::Performance),
            "features" => Ok(Self::Features),
            "balance" => Ok(Self::Balance),
            _ => Err(()),
        }
    }
}

/// Audience the release is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetAudience {
    Casual,
    Hardcore,
    #[default]
    All,
}

impl TargetAudience {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Hardcore => "hardcore",
            Self::All => "all",
        }
    }
}

impl FromStr for TargetAudience {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "casual" => Ok(Self::Casual),
            "hardcore" => Ok(Self::Hardcore),
            "all" => Ok(Self::All),
            _ => Err(()),
        }
    }
}

/// Production milestone thresholds, each firing exactly once per
/// development phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    DesignReview,
    FeatureComplete,
    Alpha,
    Beta,
}

impl Milestone {
    pub const ALL: [Self; 4] = [
        Self::DesignReview,
        Self::FeatureComplete,
        Self::Alpha,
        Self::Beta,
    ];

    #[must_use]
    pub const fn threshold(self) -> f64 {
        match self {
            Self::DesignReview => 25.0,
            Self::FeatureComplete => 50.0,
            Self::Alpha => 75.0,
            Self::Beta => 90.0,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::DesignReview => "design_review",
            Self::FeatureComplete => "feature_complete",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        }
    }
}

/// A planned feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default = "default_complexity")]
    pub complexity: u32,
}

fn default_complexity() -> u32 {
    1
}

/// Percentage split of team attention during planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub coding: u32,
    pub design: u32,
    pub testing: u32,
}

/// Planning-phase data block, including the transition artifacts the
/// planning exit gate checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlanningData {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub staff_assignments: Vec<String>,
    #[serde(default)]
    pub resource_allocation: Option<ResourceAllocation>,
    #[serde(default)]
    pub project_plan_ready: bool,
    #[serde(default)]
    pub team_setup_ready: bool,
    #[serde(default)]
    pub decisions: Vec<String>,
}

/// Which of the three test types have been run this testing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestsRun {
    #[serde(default)]
    pub unit: bool,
    #[serde(default)]
    pub integration: bool,
    #[serde(default)]
    pub playtest: bool,
}

impl TestsRun {
    #[must_use]
    pub fn completed(self) -> u32 {
        u32::from(self.unit) + u32::from(self.integration) + u32::from(self.playtest)
    }
}

/// Coarse quality metrics tracked during testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub performance: f64,
    pub stability: f64,
    pub usability: f64,
}

impl Default for QualityMetrics {
    fn default() -> Self {
        Self {
            performance: 50.0,
            stability: 50.0,
            usability: 50.0,
        }
    }
}

/// Snapshot archived when a phase is exited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: DevPhase,
    pub completed_week: u32,
    pub progress_at_exit: f64,
    pub quality_at_exit: f64,
    pub decisions: Vec<String>,
}

/// Pre-confirmation wizard state. Mutually exclusive with an active project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub subgenre: Option<String>,
    #[serde(default)]
    pub elements: Vec<String>,
}

/// The unit of work: one game in development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub genre: String,
    pub subgenre: String,
    pub elements: Vec<String>,
    #[serde(default)]
    pub phase: DevPhase,
    /// Progress within the current phase, 0-100.
    #[serde(default)]
    pub phase_progress: f64,
    /// Cumulative development completion, 0-100.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub initial_budget_cents: i64,
    #[serde(default)]
    pub weekly_cost_cents: i64,
    #[serde(default)]
    pub spent_cents: i64,
    #[serde(default)]
    pub estimated_weeks: u32,
    /// Development-speed modifier locked in when the project was green-lit.
    /// Tooling and milestone gains earned mid-project pay off on the next
    /// one, which keeps a project's weekly pace stable.
    #[serde(default = "default_dev_speed")]
    pub dev_speed: f64,
    #[serde(default)]
    pub started_week: u32,
    #[serde(default)]
    pub weeks_elapsed: u32,
    #[serde(default = "default_morale")]
    pub team_morale: i32,
    #[serde(default)]
    pub quality: f64,
    #[serde(default)]
    pub bugs: BugCounts,
    #[serde(default)]
    pub bugs_found: u32,
    #[serde(default)]
    pub bugs_fixed: u32,
    #[serde(default)]
    pub initial_bugs: u32,
    #[serde(default)]
    pub milestones_fired: Vec<Milestone>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub tests_run: TestsRun,
    #[serde(default)]
    pub playtest_score: Option<f64>,
    #[serde(default)]
    pub quality_metrics: QualityMetrics,
    #[serde(default)]
    pub marketing_strategy: Option<MarketingStrategy>,
    #[serde(default)]
    pub launch_window: Option<LaunchWindow>,
    #[serde(default)]
    pub optimization_focus: Option<OptimizationFocus>,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub marketing_budget_cents: i64,
    #[serde(default)]
    pub planning: PlanningData,
    #[serde(default)]
    pub phase_history: Vec<PhaseRecord>,
}

fn default_morale() -> i32 {
    MORALE_MAX
}

fn default_dev_speed() -> f64 {
    1.0
}

/// Phase-machine violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("cannot transition from {from} to {to}")]
    InvalidSequence { from: DevPhase, to: DevPhase },
    #[error("{phase} requirements incomplete: missing {missing:?}")]
    IncompleteRequirements {
        phase: DevPhase,
        missing: Vec<&'static str>,
    },
    #[error("{phase} transition artifacts missing: {missing:?}")]
    MissingTransitionData {
        phase: DevPhase,
        missing: Vec<&'static str>,
    },
    #[error("operation '{operation}' is not valid during the {phase} phase")]
    WrongPhase {
        operation: &'static str,
        phase: DevPhase,
    },
}

impl Project {
    /// Quality is clamped to [0, 100] at every write.
    pub fn add_quality(&mut self, delta: f64) {
        self.quality = (self.quality + delta).clamp(0.0, 100.0);
    }

    pub fn add_morale(&mut self, delta: i32) {
        self.team_morale = (self.team_morale + delta).clamp(0, MORALE_MAX);
    }

    /// Has every required release decision been made?
    #[must_use]
    pub fn missing_release_decisions(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.marketing_strategy.is_none() {
            missing.push("marketing_strategy".to_string());
        }
        if self.launch_window.is_none() {
            missing.push("launch_window".to_string());
        }
        if self.optimization_focus.is_none() {
            missing.push("optimization_focus".to_string());
        }
        missing
    }

    /// Fields the current phase requires before its exit gate opens.
    fn missing_requirements(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self.phase {
            DevPhase::Planning => {
                if self.planning.features.is_empty() {
                    missing.push("features");
                }
                if self.planning.staff_assignments.is_empty() {
                    missing.push("staff_assignments");
                }
                if self.planning.resource_allocation.is_none() {
                    missing.push("resource_allocation");
                }
            }
            DevPhase::Development => {
                if self.progress <= 0.0 {
                    missing.push("code_progress");
                }
                if self.phase_progress <= 0.0 {
                    missing.push("feature_progress");
                }
                if self.team_morale <= 0 {
                    missing.push("team_morale");
                }
            }
            DevPhase::Testing => {
                if self.bugs_found == 0 {
                    missing.push("bugs_found");
                }
                if self.playtest_score.is_none() {
                    missing.push("playtest_results");
                }
            }
            DevPhase::Release => {}
        }
        missing
    }

    /// Artifacts the current phase must have produced before handing off.
    fn missing_transition_data(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self.phase {
            DevPhase::Planning => {
                if !self.planning.project_plan_ready {
                    missing.push("project_plan");
                }
                if !self.planning.team_setup_ready {
                    missing.push("team_setup");
                }
            }
            DevPhase::Development => {
                if self.progress < 100.0 {
                    missing.push("development_metrics");
                }
                if self.milestones_fired.is_empty() {
                    missing.push("milestone_progress");
                }
            }
            DevPhase::Testing => {
                if self.tests_run.completed() < 3 {
                    missing.push("testing_report");
                }
                if self.playtest_score.is_none() {
                    missing.push("optimization_data");
                }
            }
            DevPhase::Release => {}
        }
        missing
    }

    /// Validate a requested transition without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns the first gate violation, checked in order: sequence, then
    /// requirements, then transition artifacts.
    pub fn validate_transition(&self, to: DevPhase) -> Result<(), LifecycleError> {
        if self.phase.next() != Some(to) {
            return Err(LifecycleError::InvalidSequence {
                from: self.phase,
                to,
            });
        }
        let missing = self.missing_requirements();
        if !missing.is_empty() {
            return Err(LifecycleError::IncompleteRequirements {
                phase: self.phase,
                missing,
            });
        }
        let missing = self.missing_transition_data();
        if !missing.is_empty() {
            return Err(LifecycleError::MissingTransitionData {
                phase: self.phase,
                missing,
            });
        }
        Ok(())
    }

    /// Archive the outgoing phase and initialize the incoming one.
    /// Callers have already validated the transition (or are the clock's
    /// auto-advance, which bypasses the manual gates by design).
    pub(crate) fn enter_phase(&mut self, to: DevPhase, week: u32, bug_rate_modifier: f64) {
        self.phase_history.push(PhaseRecord {
            phase: self.phase,
            completed_week: week,
            progress_at_exit: self.progress,
            quality_at_exit: self.quality,
            decisions: std::mem::take(&mut self.planning.decisions),
        });
        self.phase = to;
        self.phase_progress = 0.0;
        match to {
            DevPhase::Planning => {
                self.planning = PlanningData::default();
            }
            DevPhase::Development => {
                self.progress = 0.0;
            }
            DevPhase::Testing => {
                // Seed the open bug count from how rough the build is.
                let priority_factor = self.priority.unwrap_or_default().bug_factor();
                let raw = TESTING_BUG_SEED_BASE * ((100.0 - self.quality) / 100.0).max(0.0)
                    * bug_rate_modifier
                    * priority_factor;
                let seeded = u32::try_from(round_f64_to_i32(raw).max(0)).unwrap_or(0);
                self.bugs = BugCounts::seed_from_total(seeded);
                self.bugs_found = self.bugs.total;
                self.tests_run = TestsRun::default();
                self.playtest_score = None;
            }
            DevPhase::Release => {
                self.initial_bugs = self.bugs.total;
            }
        }
    }
}

#[cfg(test)]
impl Project {
    /// Bare project for unit tests; economics fields left at defaults.
    pub(crate) fn sample(genre: &str, subgenre: &str) -> Self {
        Self {
            name: "Sample".to_string(),
            genre: genre.to_string(),
            subgenre: subgenre.to_string(),
            elements: vec![
                "One".to_string(),
                "Two".to_string(),
                "Three".to_string(),
            ],
            phase: DevPhase::Planning,
            phase_progress: 0.0,
            progress: 0.0,
            initial_budget_cents: dollars_to_cents(1_000.0),
            weekly_cost_cents: dollars_to_cents(100.0),
            spent_cents: 0,
            estimated_weeks: 16,
            dev_speed: 1.0,
            started_week: 1,
            weeks_elapsed: 0,
            team_morale: default_morale(),
            quality: 0.0,
            bugs: BugCounts::default(),
            bugs_found: 0,
            bugs_fixed: 0,
            initial_bugs: 0,
            milestones_fired: Vec::new(),
            priority: None,
            tests_run: TestsRun::default(),
            playtest_score: None,
            quality_metrics: QualityMetrics::default(),
            marketing_strategy: None,
            launch_window: None,
            optimization_focus: None,
            target_audience: TargetAudience::default(),
            marketing_budget_cents: 0,
            planning: PlanningData::default(),
            phase_history: Vec::new(),
        }
    }
}

/// Start a project, charging its initial budget.
///
/// # Errors
///
/// Fails when a project is already active, any selection is invalid, or the
/// studio cannot afford the budget.
pub fn start_project(
    state: &mut GameState,
    genre: &str,
    subgenre: &str,
    elements: &[String],
    name: &str,
) -> Result<(), CommandError> {
    state.normalize();
    if state.project.is_some() {
        return Err(CommandError::ProjectAlreadyActive);
    }
    if name.trim().is_empty() {
        return Err(CommandError::InvalidSelection(
            "project name must not be empty".to_string(),
        ));
    }

    let (cost_mult, time_mult) = {
        let data = state.reference()?;
        let genre_def = data
            .genres
            .genres
            .get(genre)
            .ok_or_else(|| CommandError::InvalidSelection(format!("unknown genre {genre}")))?;
        let sub_def = genre_def.subgenres.get(subgenre).ok_or_else(|| {
            CommandError::InvalidSelection(format!("unknown subgenre {genre}/{subgenre}"))
        })?;

        if elements.len() != REQUIRED_ELEMENTS {
            return Err(CommandError::InvalidSelection(format!(
                "exactly {REQUIRED_ELEMENTS} elements required"
            )));
        }
        for (i, element) in elements.iter().enumerate() {
            if !sub_def.elements.contains(element) {
                return Err(CommandError::InvalidSelection(format!(
                    "element {element} is not offered by {subgenre}"
                )));
            }
            if elements[..i].contains(element) {
                return Err(CommandError::InvalidSelection(format!(
                    "duplicate element {element}"
                )));
            }
        }

        let element_bonus = ELEMENT_MULT_STEP * elements.len() as f64;
        (
            genre_def.cost_mult * sub_def.cost_mult + element_bonus,
            genre_def.time_mult * sub_def.time_mult + element_bonus,
        )
    };

    let budget_cents = dollars_to_cents(
        BASE_BUDGET_DOLLARS * cost_mult * state.modifiers.development_cost,
    );
    state.charge(budget_cents)?;

    let features = elements
        .iter()
        .map(|e| Feature {
            name: e.clone(),
            complexity: 1,
        })
        .collect();

    state.project = Some(Project {
        name: name.to_string(),
        genre: genre.to_string(),
        subgenre: subgenre.to_string(),
        elements: elements.to_vec(),
        phase: DevPhase::Planning,
        phase_progress: 0.0,
        progress: 0.0,
        initial_budget_cents: budget_cents,
        weekly_cost_cents: dollars_to_cents(BASE_WEEKLY_COST_DOLLARS * cost_mult),
        spent_cents: 0,
        estimated_weeks: ceil_f64_to_u32(BASE_ESTIMATED_WEEKS * time_mult),
        dev_speed: state.modifiers.development_speed,
        started_week: state.week,
        weeks_elapsed: 0,
        team_morale: default_morale(),
        quality: 0.0,
        bugs: BugCounts::default(),
        bugs_found: 0,
        bugs_fixed: 0,
        initial_bugs: 0,
        milestones_fired: Vec::new(),
        priority: None,
        tests_run: TestsRun::default(),
        playtest_score: None,
        quality_metrics: QualityMetrics::default(),
        marketing_strategy: None,
        launch_window: None,
        optimization_focus: None,
        target_audience: TargetAudience::default(),
        marketing_budget_cents: 0,
        planning: PlanningData {
            features,
            ..PlanningData::default()
        },
        phase_history: Vec::new(),
    });
    state.draft = None;
    state
        .logs
        .push(format!("{LOG_PHASE_PREFIX}{}", DevPhase::Planning));
    Ok(())
}

/// Explicit phase transition with full gate validation.
pub fn transition_phase(state: &mut GameState, target: DevPhase) -> Result<(), CommandError> {
    state.normalize();
    let bug_rate = state.modifiers.bug_rate;
    let week = state.week;
    let project = state.project.as_mut().ok_or(CommandError::NoActiveProject)?;
    project.validate_transition(target)?;
    project.enter_phase(target, week, bug_rate);
    state.logs.push(format!("{LOG_PHASE_PREFIX}{target}"));
    Ok(())
}

fn active_project(state: &mut GameState) -> Result<&mut Project, CommandError> {
    state.normalize();
    state.project.as_mut().ok_or(CommandError::NoActiveProject)
}

/// Choose the development priority. Applies the one-time morale cost and
/// records the decision.
pub fn set_priority(state: &mut GameState, priority: &str) -> Result<(), CommandError> {
    let parsed = Priority::from_str(priority)
        .map_err(|()| CommandError::InvalidSelection(format!("unknown priority {priority}")))?;
    let project = active_project(state)?;
    if project.priority.is_some() {
        project.priority = Some(parsed);
        return Ok(());
    }
    project.priority = Some(parsed);
    project.add_morale(parsed.morale_impact());
    project
        .planning
        .decisions
        .push(format!("priority:{}", parsed.as_str()));
    Ok(())
}

fn require_release_phase(
    project: &Project,
    operation: &'static str,
) -> Result<(), CommandError> {
    if project.phase != DevPhase::Release {
        return Err(CommandError::Lifecycle(LifecycleError::WrongPhase {
            operation,
            phase: project.phase,
        }));
    }
    Ok(())
}

fn update_release_progress(project: &mut Project) {
    let done = 3 - project.missing_release_decisions().len();
    project.phase_progress = done as f64 / 3.0 * 100.0;
}

pub fn set_marketing_strategy(state: &mut GameState, strategy: &str) -> Result<(), CommandError> {
    let parsed = MarketingStrategy::from_str(strategy).map_err(|()| {
        CommandError::InvalidSelection(format!("unknown marketing strategy {strategy}"))
    })?;
    let project = active_project(state)?;
    require_release_phase(project, "marketing")?;
    project.marketing_strategy = Some(parsed);
    update_release_progress(project);
    Ok(())
}

pub fn set_launch_window(state: &mut GameState, window: &str) -> Result<(), CommandError> {
    let parsed = LaunchWindow::from_str(window)
        .map_err(|()| CommandError::InvalidSelection(format!("unknown launch window {window}")))?;
    let project = active_project(state)?;
    require_release_phase(project, "launch")?;
    project.launch_window = Some(parsed);
    update_release_progress(project);
    Ok(())
}

pub fn set_optimization_focus(state: &mut GameState, focus: &str) -> Result<(), CommandError> {
    let parsed = OptimizationFocus::from_str(focus)
        .map_err(|()| CommandError::InvalidSelection(format!("unknown optimization focus {focus}")))?;
    let project = active_project(state)?;
    require_release_phase(project, "optimize")?;
    project.optimization_focus = Some(parsed);
    update_release_progress(project);
    Ok(())
}

pub fn set_target_audience(state: &mut GameState, audience: &str) -> Result<(), CommandError> {
    let parsed = TargetAudience::from_str(audience)
        .map_err(|()| CommandError::InvalidSelection(format!("unknown audience {audience}")))?;
    let project = active_project(state)?;
    require_release_phase(project, "audience")?;
    project.target_audience = parsed;
    Ok(())
}

/// Commit marketing spend for the upcoming release. Charged immediately.
pub fn set_marketing_budget(state: &mut GameState, cents: i64) -> Result<(), CommandError> {
    state.normalize();
    if cents < 0 {
        return Err(CommandError::InvalidSelection(
            "marketing budget must be non-negative".to_string(),
        ));
    }
    if state.project.is_none() {
        return Err(CommandError::NoActiveProject);
    }
    state.charge(cents)?;
    if let Some(project) = state.project.as_mut() {
        project.marketing_budget_cents += cents;
    }
    Ok(())
}

/// Record a planned feature during the planning phase.
pub fn plan_feature(state: &mut GameState, name: &str, complexity: u32) -> Result<(), CommandError> {
    let project = active_project(state)?;
    if project.phase != DevPhase::Planning {
        return Err(CommandError::Lifecycle(LifecycleError::WrongPhase {
            operation: "feature",
            phase: project.phase,
        }));
    }
    project.planning.features.push(Feature {
        name: name.to_string(),
        complexity: complexity.max(1),
    });
    Ok(())
}

/// Assign the current roster (or the solo founder) to the project and mark
/// the team-setup artifact ready.
pub fn assign_team(state: &mut GameState) -> Result<(), CommandError> {
    state.normalize();
    let assignments: Vec<String> = if state.staff.is_empty() {
        vec!["founder".to_string()]
    } else {
        state.staff.iter().map(|s| s.name.clone()).collect()
    };
    let project = state.project.as_mut().ok_or(CommandError::NoActiveProject)?;
    if project.phase != DevPhase::Planning {
        return Err(CommandError::Lifecycle(LifecycleError::WrongPhase {
            operation: "assign",
            phase: project.phase,
        }));
    }
    project.planning.staff_assignments = assignments;
    project.planning.team_setup_ready = true;
    Ok(())
}

/// Set the planning resource split; percentages must sum to 100. Completes
/// the project-plan artifact.
pub fn set_resource_allocation(
    state: &mut GameState,
    coding: u32,
    design: u32,
    testing: u32,
) -> Result<(), CommandError> {
    if coding + design + testing != 100 {
        return Err(CommandError::InvalidSelection(
            "resource allocation must sum to 100".to_string(),
        ));
    }
    let project = active_project(state)?;
    if project.phase != DevPhase::Planning {
        return Err(CommandError::Lifecycle(LifecycleError::WrongPhase {
            operation: "allocate",
            phase: project.phase,
        }));
    }
    project.planning.resource_allocation = Some(ResourceAllocation {
        coding,
        design,
        testing,
    });
    project.planning.project_plan_ready = true;
    Ok(())
}

/// Cancel the active project. The budget is sunk.
pub fn cancel_project(state: &mut GameState) -> Result<Project, CommandError> {
    state.normalize();
    state.project.take().ok_or(CommandError::NoActiveProject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferenceData;

    fn fresh_state() -> GameState {
        GameState::new("Moon Frog", 99, ReferenceData::default_config())
    }

    fn started(state: &mut GameState) {
        let elements = vec![
            "Real-time Combat".to_string(),
            "Skill Trees".to_string(),
            "Loot System".to_string(),
        ];
        start_project(state, "rpg", "action", &elements, "Dragon Ledger").unwrap();
    }

    #[test]
    fn start_project_charges_scaled_budget() {
        let mut state = fresh_state();
        let before = state.money_cents;
        started(&mut state);
        let project = state.project.as_ref().unwrap();
        // rpg 1.4 * action 1.2 + 0.3 elements = 1.98
        assert_eq!(project.initial_budget_cents, dollars_to_cents(1_980.0));
        assert_eq!(project.weekly_cost_cents, dollars_to_cents(198.0));
        // rpg 1.4 * action 1.3 + 0.3 = 2.12 -> ceil(16 * 2.12) = 34
        assert_eq!(project.estimated_weeks, 34);
        assert_eq!(before - state.money_cents, project.initial_budget_cents);
        assert_eq!(project.planning.features.len(), 3);
    }

    #[test]
    fn start_project_rejects_bad_selections() {
        let mut state = fresh_state();
        let err = start_project(&mut state, "polka", "action", &[], "X").unwrap_err();
        assert!(matches!(err, CommandError::InvalidSelection(_)));

        let dup = vec![
            "Real-time Combat".to_string(),
            "Real-time Combat".to_string(),
            "Loot System".to_string(),
        ];
        let err = start_project(&mut state, "rpg", "action", &dup, "X").unwrap_err();
        assert!(matches!(err, CommandError::InvalidSelection(_)));
        assert!(state.project.is_none());
    }

    #[test]
    fn second_project_is_rejected() {
        let mut state = fresh_state();
        started(&mut state);
        let elements = vec![
            "Real-time Combat".to_string(),
            "Skill Trees".to_string(),
            "Loot System".to_string(),
        ];
        let err = start_project(&mut state, "rpg", "action", &elements, "Again").unwrap_err();
        assert_eq!(err, CommandError::ProjectAlreadyActive);
    }

    #[test]
    fn insufficient_funds_leaves_state_untouched() {
        let mut state = fresh_state();
        state.money_cents = 100;
        let elements = vec![
            "Real-time Combat".to_string(),
            "Skill Trees".to_string(),
            "Loot System".to_string(),
        ];
        let err = start_project(&mut state, "rpg", "action", &elements, "Pricey").unwrap_err();
        assert!(matches!(err, CommandError::InsufficientFunds { .. }));
        assert!(state.project.is_none());
        assert_eq!(state.money_cents, 100);
    }

    #[test]
    fn transitions_follow_the_strict_sequence() {
        let project = Project::sample("puzzle", "match3");
        assert!(matches!(
            project.validate_transition(DevPhase::Testing),
            Err(LifecycleError::InvalidSequence { .. })
        ));
        assert!(matches!(
            project.validate_transition(DevPhase::Release),
            Err(LifecycleError::InvalidSequence { .. })
        ));

        let mut dev = Project::sample("puzzle", "match3");
        dev.phase = DevPhase::Development;
        assert!(matches!(
            dev.validate_transition(DevPhase::Planning),
            Err(LifecycleError::InvalidSequence { .. })
        ));
    }

    #[test]
    fn planning_gate_lists_missing_requirements() {
        let mut state = fresh_state();
        started(&mut state);
        let err = transition_phase(&mut state, DevPhase::Development).unwrap_err();
        match err {
            CommandError::Lifecycle(LifecycleError::IncompleteRequirements { phase, missing }) => {
                assert_eq!(phase, DevPhase::Planning);
                assert!(missing.contains(&"staff_assignments"));
                assert!(missing.contains(&"resource_allocation"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn planning_gate_passes_once_prepared() {
        let mut state = fresh_state();
        started(&mut state);
        assign_team(&mut state).unwrap();
        set_resource_allocation(&mut state, 50, 30, 20).unwrap();
        transition_phase(&mut state, DevPhase::Development).unwrap();
        let project = state.project.as_ref().unwrap();
        assert_eq!(project.phase, DevPhase::Development);
        assert!((project.progress - 0.0).abs() < f64::EPSILON);
        assert_eq!(project.phase_history.len(), 1);
        assert_eq!(project.phase_history[0].phase, DevPhase::Planning);
    }

    #[test]
    fn testing_entry_seeds_bugs_from_quality() {
        let mut project = Project::sample("puzzle", "match3");
        project.phase = DevPhase::Development;
        project.quality = 40.0;
        project.enter_phase(DevPhase::Testing, 5, 1.0);
        // 10 * 0.6 = 6 bugs at balanced priority
        assert_eq!(project.bugs.total, 6);
        assert_eq!(project.bugs_found, 6);
        assert_eq!(project.bugs.critical, 1);
        assert_eq!(project.bugs.major, 1);
        assert_eq!(project.bugs.minor, 4);
    }

    #[test]
    fn speed_priority_seeds_more_bugs() {
        let mut quality_first = Project::sample("puzzle", "match3");
        quality_first.phase = DevPhase::Development;
        quality_first.quality = 40.0;
        quality_first.priority = Some(Priority::Quality);
        quality_first.enter_phase(DevPhase::Testing, 5, 1.0);

        let mut rushed = Project::sample("puzzle", "match3");
        rushed.phase = DevPhase::Development;
        rushed.quality = 40.0;
        rushed.priority = Some(Priority::Speed);
        rushed.enter_phase(DevPhase::Testing, 5, 1.0);

        assert!(rushed.bugs.total > quality_first.bugs.total);
    }

    #[test]
    fn release_entry_snapshots_initial_bugs() {
        let mut project = Project::sample("puzzle", "match3");
        project.phase = DevPhase::Testing;
        project.bugs = BugCounts::seed_from_total(12);
        project.enter_phase(DevPhase::Release, 9, 1.0);
        assert_eq!(project.initial_bugs, 12);
        assert!((project.phase_progress - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn release_decisions_drive_phase_progress() {
        let mut state = fresh_state();
        started(&mut state);
        let project = state.project.as_mut().unwrap();
        project.phase = DevPhase::Release;

        set_marketing_strategy(&mut state, "casual").unwrap();
        set_launch_window(&mut state, "optimal").unwrap();
        let progress = state.project.as_ref().unwrap().phase_progress;
        assert!((progress - 200.0 / 3.0).abs() < 1e-9);
        set_optimization_focus(&mut state, "balance").unwrap();
        let project = state.project.as_ref().unwrap();
        assert!((project.phase_progress - 100.0).abs() < 1e-9);
        assert!(project.missing_release_decisions().is_empty());
    }

    #[test]
    fn release_decisions_rejected_outside_release_phase() {
        let mut state = fresh_state();
        started(&mut state);
        let err = set_marketing_strategy(&mut state, "casual").unwrap_err();
        assert!(matches!(
            err,
            CommandError::Lifecycle(LifecycleError::WrongPhase { .. })
        ));
    }

    #[test]
    fn target_audience_is_a_release_phase_call() {
        let mut state = fresh_state();
        started(&mut state);
        let err = set_target_audience(&mut state, "hardcore").unwrap_err();
        assert!(matches!(
            err,
            CommandError::Lifecycle(LifecycleError::WrongPhase { .. })
        ));

        state.project.as_mut().unwrap().phase = DevPhase::Release;
        set_target_audience(&mut state, "hardcore").unwrap();
        let project = state.project.as_ref().unwrap();
        assert_eq!(project.target_audience, TargetAudience::Hardcore);
        // the audience pick is not one of the three gating decisions
        assert_eq!(project.missing_release_decisions().len(), 3);
    }

    #[test]
    fn priority_applies_morale_cost_once() {
        let mut state = fresh_state();
        started(&mut state);
        set_priority(&mut state, "speed").unwrap();
        assert_eq!(state.project.as_ref().unwrap().team_morale, 90);
        // re-choosing does not re-apply the hit
        set_priority(&mut state, "speed").unwrap();
        assert_eq!(state.project.as_ref().unwrap().team_morale, 90);
        assert!(set_priority(&mut state, "reckless").is_err());
    }

    #[test]
    fn marketing_budget_is_charged_immediately() {
        let mut state = fresh_state();
        started(&mut state);
        state.project.as_mut().unwrap().phase = DevPhase::Release;
        let before = state.money_cents;
        set_marketing_budget(&mut state, 50_000).unwrap();
        assert_eq!(before - state.money_cents, 50_000);
        assert_eq!(
            state.project.as_ref().unwrap().marketing_budget_cents,
            50_000
        );
    }
}
