//! Testing-phase operations: the three test passes and the playtest
//! scoring they produce.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::numbers::{floor_f64_to_u32, round_f64_to_i32, u32_to_f64};
use crate::project::{DevPhase, LifecycleError};
use crate::state::{CommandError, GameState};

const TEST_EFFECTIVENESS_BASE: f64 = 0.7;
const PLAYTEST_SCORE_FLOOR: f64 = 50.0;
const PLAYTEST_SCORE_CEIL: f64 = 100.0;
const PLAYTEST_RANDOM_SPREAD: f64 = 10.0;

/// One of the three test passes, each runnable once per testing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Unit,
    Integration,
    Playtest,
}

impl TestType {
    pub const ALL: [Self; 3] = [Self::Unit, Self::Integration, Self::Playtest];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Integration => "integration",
            Self::Playtest => "playtest",
        }
    }

    /// Base number of bugs this pass surfaces.
    const fn base_bugs(self) -> f64 {
        match self {
            Self::Unit => 10.0,
            Self::Integration => 15.0,
            Self::Playtest => 8.0,
        }
    }

    /// Flat quality points granted, scaled by effectiveness.
    const fn quality_grant(self) -> f64 {
        match self {
            Self::Unit => 5.0,
            Self::Integration => 7.0,
            Self::Playtest => 10.0,
        }
    }

    /// Severity weights (critical, major, minor) for bugs found by this pass.
    const fn severity_weights(self) -> (f64, f64, f64) {
        match self {
            Self::Unit => (0.2, 0.3, 0.5),
            Self::Integration => (0.3, 0.4, 0.3),
            Self::Playtest => (0.1, 0.3, 0.6),
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unit" => Ok(Self::Unit),
            "integration" => Ok(Self::Integration),
            "playtest" => Ok(Self::Playtest),
            _ => Err(()),
        }
    }
}

/// Result of a single test pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub test_type: TestType,
    pub bugs_found: u32,
    pub found_critical: u32,
    pub found_major: u32,
    pub found_minor: u32,
    pub quality_gain: f64,
    /// Set only by the playtest pass.
    pub playtest_score: Option<f64>,
    pub tests_completed: u32,
    /// `(tests_completed / 3) * 100`.
    pub phase_progress: f64,
    /// True when the third pass completed and the project moved to release.
    pub phase_complete: bool,
    /// True when this pass had already run; the call changed nothing.
    pub already_completed: bool,
}

/// Run one test pass during the testing phase. Each pass may run once per
/// phase; bugs it surfaces join the open pool and the pass grants a flat
/// quality increment. Completing the third pass moves the project to the
/// release phase and snapshots the initial bug count. Re-running a pass
/// that already ran is a no-op whose report says so.
///
/// # Errors
///
/// Fails when no project is active or the project is not in testing.
pub fn run_test(state: &mut GameState, test_type: TestType) -> Result<TestReport, CommandError> {
    state.normalize();
    let team_efficiency = state.team_efficiency();
    let testing_mod = state.modifiers.testing_effectiveness;
    let detection_mod = state.modifiers.bug_detection;
    let bug_rate = state.modifiers.bug_rate;
    let week = state.week;
    let random_offset = state
        .rng
        .as_mut()
        .map_or(0.0, |rng| rng.random_range(0.0..PLAYTEST_RANDOM_SPREAD));

    let project = state.project.as_mut().ok_or(CommandError::NoActiveProject)?;
    if project.phase != DevPhase::Testing {
        return Err(CommandError::Lifecycle(LifecycleError::WrongPhase {
            operation: "test",
            phase: project.phase,
        }));
    }
    let already_run = match test_type {
        TestType::Unit => project.tests_run.unit,
        TestType::Integration => project.tests_run.integration,
        TestType::Playtest => project.tests_run.playtest,
    };
    if already_run {
        return Ok(TestReport {
            test_type,
            bugs_found: 0,
            found_critical: 0,
            found_major: 0,
            found_minor: 0,
            quality_gain: 0.0,
            playtest_score: if test_type == TestType::Playtest {
                project.playtest_score
            } else {
                None
            },
            tests_completed: project.tests_run.completed(),
            phase_progress: project.phase_progress,
            phase_complete: false,
            already_completed: true,
        });
    }

    let effectiveness = TEST_EFFECTIVENESS_BASE * team_efficiency * testing_mod;
    let raw_found = test_type.base_bugs() * effectiveness * detection_mod;
    let bugs_found = u32::try_from(round_f64_to_i32(raw_found).max(0)).unwrap_or(0);

    let (weight_critical, weight_major, _) = test_type.severity_weights();
    let found_critical = floor_f64_to_u32(u32_to_f64(bugs_found) * weight_critical);
    let found_major = floor_f64_to_u32(u32_to_f64(bugs_found) * weight_major);
    let found_minor = bugs_found - found_critical - found_major;

    project.bugs.add(found_critical, found_major, found_minor);
    project.bugs_found += bugs_found;

    let quality_gain = test_type.quality_grant() * effectiveness;
    project.add_quality(quality_gain);

    let playtest_score = if test_type == TestType::Playtest {
        let score = (PLAYTEST_SCORE_FLOOR + project.quality / 2.0 + random_offset)
            .clamp(PLAYTEST_SCORE_FLOOR, PLAYTEST_SCORE_CEIL);
        project.playtest_score = Some(score);
        Some(score)
    } else {
        None
    };

    match test_type {
        TestType::Unit => project.tests_run.unit = true,
        TestType::Integration => project.tests_run.integration = true,
        TestType::Playtest => project.tests_run.playtest = true,
    }
    let tests_completed = project.tests_run.completed();
    project.phase_progress = f64::from(tests_completed) / 3.0 * 100.0;
    let phase_progress = project.phase_progress;

    let phase_complete = tests_completed == 3;
    if phase_complete {
        project.enter_phase(DevPhase::Release, week, bug_rate);
    }

    Ok(TestReport {
        test_type,
        bugs_found,
        found_critical,
        found_major,
        found_minor,
        quality_gain,
        playtest_score,
        tests_completed,
        phase_progress,
        phase_complete,
        already_completed: false,
    })
}
