//! Bug severity bookkeeping and the repair pass run during the release
//! phase.

use serde::{Deserialize, Serialize};

use crate::numbers::{ceil_f64_to_u32, floor_f64_to_u32, u32_to_f64};
use crate::project::DevPhase;
use crate::state::{CommandError, GameState};

const FIX_BASE_EFFECTIVENESS: f64 = 0.4;
const FIX_TEAM_FLOOR: f64 = 0.2;
const FIX_MULT_CRITICAL: f64 = 1.0;
const FIX_MULT_MAJOR: f64 = 0.8;
const FIX_MULT_MINOR: f64 = 0.6;
const QUALITY_PER_CRITICAL: f64 = 2.0;
const QUALITY_PER_MAJOR: f64 = 1.0;
const QUALITY_PER_MINOR: f64 = 0.5;
const QUALITY_GAIN_CAP: f64 = 10.0;

// Severity split applied when seeding the testing phase from a raw count.
const SEED_RATIO_CRITICAL: f64 = 0.2;
const SEED_RATIO_MAJOR: f64 = 0.3;
const SEED_RATIO_MINOR: f64 = 0.5;

/// Bug counts per severity tier plus the running total kept in sync by all
/// mutators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BugCounts {
    #[serde(default)]
    pub critical: u32,
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
    #[serde(default)]
    pub total: u32,
}

impl BugCounts {
    /// Split a raw bug count into severities at the fixed 20/30/50 ratio.
    /// The minor share takes the ceiling so small counts do not vanish.
    #[must_use]
    pub fn seed_from_total(total: u32) -> Self {
        let raw = u32_to_f64(total);
        let mut counts = Self {
            critical: floor_f64_to_u32(raw * SEED_RATIO_CRITICAL),
            major: floor_f64_to_u32(raw * SEED_RATIO_MAJOR),
            minor: ceil_f64_to_u32(raw * SEED_RATIO_MINOR),
            total: 0,
        };
        counts.sync_total();
        counts
    }

    /// Recompute `total` from the tiers.
    pub fn sync_total(&mut self) {
        self.total = self.critical + self.major + self.minor;
    }

    pub fn add(&mut self, critical: u32, major: u32, minor: u32) {
        self.critical += critical;
        self.major += major;
        self.minor += minor;
        self.sync_total();
    }

    /// Remove fixed bugs, saturating per tier.
    pub fn remove(&mut self, critical: u32, major: u32, minor: u32) {
        self.critical = self.critical.saturating_sub(critical);
        self.major = self.major.saturating_sub(major);
        self.minor = self.minor.saturating_sub(minor);
        self.sync_total();
    }

    /// Scale every tier by a factor, flooring the results. Used by the BETA
    /// milestone's 20% bug cull.
    pub fn scale(&mut self, factor: f64) {
        self.critical = floor_f64_to_u32(u32_to_f64(self.critical) * factor);
        self.major = floor_f64_to_u32(u32_to_f64(self.major) * factor);
        self.minor = floor_f64_to_u32(u32_to_f64(self.minor) * factor);
        self.sync_total();
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Outcome of one repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FixReport {
    pub fixed_critical: u32,
    pub fixed_major: u32,
    pub fixed_minor: u32,
    pub quality_gain: f64,
    pub remaining: u32,
    /// `(initial_bugs - bugs) / initial_bugs * 100`.
    pub fix_progress_pct: f64,
}

impl FixReport {
    #[must_use]
    pub const fn total_fixed(&self) -> u32 {
        self.fixed_critical + self.fixed_major + self.fixed_minor
    }
}

fn fixed_for_tier(count: u32, effectiveness: f64, tier_mult: f64) -> u32 {
    if count == 0 {
        return 0;
    }
    let raw = floor_f64_to_u32(u32_to_f64(count) * effectiveness * tier_mult);
    raw.max(1).min(count)
}

/// Repair bugs during the release phase. A project with no bugs reports an
/// all-zero pass rather than an error.
///
/// # Errors
///
/// Fails when no project is active or the project is not in release.
pub fn fix_bugs(state: &mut GameState) -> Result<FixReport, CommandError> {
    state.normalize();
    let team_efficiency = state.team_efficiency();
    let testing_mod = state.modifiers.testing_effectiveness;
    let project = state.project.as_mut().ok_or(CommandError::NoActiveProject)?;
    if project.phase != DevPhase::Release {
        return Err(CommandError::Lifecycle(
            crate::project::LifecycleError::WrongPhase {
                operation: "fix",
                phase: project.phase,
            },
        ));
    }

    if project.bugs.is_empty() {
        return Ok(FixReport {
            remaining: 0,
            fix_progress_pct: 100.0,
            ..FixReport::default()
        });
    }

    let effectiveness = FIX_BASE_EFFECTIVENESS * team_efficiency.max(FIX_TEAM_FLOOR) * testing_mod;
    let fixed_critical = fixed_for_tier(project.bugs.critical, effectiveness, FIX_MULT_CRITICAL);
    let fixed_major = fixed_for_tier(project.bugs.major, effectiveness, FIX_MULT_MAJOR);
    let fixed_minor = fixed_for_tier(project.bugs.minor, effectiveness, FIX_MULT_MINOR);

    project.bugs.remove(fixed_critical, fixed_major, fixed_minor);
    let total_fixed = fixed_critical + fixed_major + fixed_minor;
    project.bugs_fixed += total_fixed;

    let quality_gain = (u32_to_f64(fixed_critical) * QUALITY_PER_CRITICAL
        + u32_to_f64(fixed_major) * QUALITY_PER_MAJOR
        + u32_to_f64(fixed_minor) * QUALITY_PER_MINOR)
        .min(QUALITY_GAIN_CAP);
    project.add_quality(quality_gain);

    let fix_progress_pct = if project.initial_bugs == 0 {
        100.0
    } else {
        u32_to_f64(project.initial_bugs - project.bugs.total) / u32_to_f64(project.initial_bugs)
            * 100.0
    };

    Ok(FixReport {
        fixed_critical,
        fixed_major,
        fixed_minor,
        quality_gain,
        remaining: project.bugs.total,
        fix_progress_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    fn release_state(critical: u32, major: u32, minor: u32) -> GameState {
        let mut state = GameState::default();
        let mut project = Project::sample("puzzle", "match3");
        project.phase = DevPhase::Release;
        project.bugs = BugCounts::default();
        project.bugs.add(critical, major, minor);
        project.initial_bugs = project.bugs.total;
        state.project = Some(project);
        state
    }

    #[test]
    fn seeding_splits_twenty_thirty_fifty() {
        let counts = BugCounts::seed_from_total(10);
        assert_eq!(counts.critical, 2);
        assert_eq!(counts.major, 3);
        assert_eq!(counts.minor, 5);
        assert_eq!(counts.total, 10);

        // ceil on the minor share keeps tiny counts visible
        let one = BugCounts::seed_from_total(1);
        assert_eq!((one.critical, one.major, one.minor), (0, 0, 1));
    }

    #[test]
    fn fixes_at_least_one_per_nonempty_tier() {
        let mut state = release_state(2, 3, 5);
        let report = fix_bugs(&mut state).unwrap();
        assert!(report.fixed_critical >= 1);
        assert!(report.fixed_major >= 1);
        assert!(report.fixed_minor >= 1);
        let project = state.project.as_ref().unwrap();
        assert_eq!(project.bugs_fixed, report.total_fixed());
        assert_eq!(project.bugs.total, 10 - report.total_fixed());
    }

    #[test]
    fn repair_with_unit_efficiency_matches_formula() {
        // teamEfficiency = 1 (no staff), testing modifier 1:
        // effectiveness = 0.4; critical floor(2*0.4)=0 -> min 1,
        // major floor(3*0.32)=0 -> min 1, minor floor(5*0.24)=1.
        let mut state = release_state(2, 3, 5);
        let report = fix_bugs(&mut state).unwrap();
        assert_eq!(report.fixed_critical, 1);
        assert_eq!(report.fixed_major, 1);
        assert_eq!(report.fixed_minor, 1);
        assert!((report.quality_gain - 3.5).abs() < 1e-9);
        assert_eq!(report.remaining, 7);
        assert!((report.fix_progress_pct - 30.0).abs() < 1e-9);
    }

    #[test]
    fn never_fixes_more_than_present() {
        let mut state = release_state(1, 0, 0);
        let report = fix_bugs(&mut state).unwrap();
        assert_eq!(report.fixed_critical, 1);
        assert_eq!(report.fixed_major, 0);
        assert_eq!(report.fixed_minor, 0);
        assert_eq!(state.project.as_ref().unwrap().bugs.total, 0);
    }

    #[test]
    fn empty_project_reports_nothing_to_fix() {
        let mut state = release_state(0, 0, 0);
        let report = fix_bugs(&mut state).unwrap();
        assert_eq!(report.total_fixed(), 0);
        assert!((report.fix_progress_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn quality_gain_caps_at_ten() {
        let mut state = release_state(40, 40, 40);
        // crank effectiveness with a large, happy, veteran team
        state.staff = (0..8)
            .map(|_| crate::staff::StaffMember {
                name: "Dev".to_string(),
                role: "programmer".to_string(),
                skills: std::collections::HashMap::from([("coding".to_string(), 5)]),
                experience: 730,
                salary_cents: 0,
                mood: 100,
            })
            .collect();
        let report = fix_bugs(&mut state).unwrap();
        assert!((report.quality_gain - QUALITY_GAIN_CAP).abs() < f64::EPSILON);
    }

    #[test]
    fn repair_outside_release_phase_is_rejected() {
        let mut state = release_state(1, 1, 1);
        state.project.as_mut().unwrap().phase = DevPhase::Testing;
        assert!(fix_bugs(&mut state).is_err());
    }
}
