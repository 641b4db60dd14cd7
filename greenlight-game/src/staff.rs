//! Staff roster, candidate pool, and team efficiency.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::numbers::{dollars_to_cents, i64_to_f64, u32_to_f64};
use crate::state::{
    CommandError, GameState, LOG_STAFF_FIRED_PREFIX, LOG_STAFF_HIRED_PREFIX,
};

const TRAINING_BASE_COST_DOLLARS: f64 = 500.0;
const SKILL_MAX: u8 = 5;
const FIRING_MORALE_PENALTY: i32 = 5;
const TRAINING_MOOD_BOOST: i32 = 10;
const RAISE_MOOD_BOOST: i32 = 15;
const RAISE_SALARY_FACTOR: f64 = 1.15;
const MOOD_SHIFT_CHANCE: f64 = 0.2;
const EXPERIENCE_CAP_DAYS: f64 = 365.0;
const SIZE_FACTOR_CAP: f64 = 1.5;
const EXPERIENCE_FACTOR_CAP: f64 = 1.5;

const CANDIDATE_FIRST_NAMES: [&str; 8] = [
    "Alex", "Sam", "Jordan", "Taylor", "Morgan", "Casey", "Robin", "Pat",
];
const CANDIDATE_LAST_NAMES: [&str; 8] = [
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
];

/// A hired member of the studio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub name: String,
    /// Staff type id from the reference catalog (programmer/artist/writer/qa).
    pub role: String,
    /// Skill name -> level in [1, 5].
    pub skills: HashMap<String, u8>,
    /// Days of professional experience; grows weekly.
    pub experience: u32,
    pub salary_cents: i64,
    /// Mood in [0, 100].
    pub mood: i32,
}

/// A generated applicant, hireable by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub role: String,
    pub skills: HashMap<String, u8>,
    pub experience: u32,
    pub salary_cents: i64,
}

impl StaffMember {
    /// Individual productivity in roughly [0.14, 1.5]: skill average scaled
    /// by mood, with up to +30% from a year of experience.
    #[must_use]
    pub fn effectiveness(&self) -> f64 {
        if self.skills.is_empty() {
            return 0.0;
        }
        let skill_sum: u32 = self.skills.values().map(|&v| u32::from(v)).sum();
        let skill_avg = f64::from(skill_sum) / self.skills.len() as f64;
        let mood_factor = f64::from(self.mood) / 100.0;
        let experience_factor = (u32_to_f64(self.experience) / EXPERIENCE_CAP_DAYS).min(1.0);
        (skill_avg / f64::from(SKILL_MAX)) * mood_factor * (0.7 + experience_factor * 0.3)
    }
}

impl Candidate {
    fn into_member(self) -> StaffMember {
        StaffMember {
            name: self.name,
            role: self.role,
            skills: self.skills,
            experience: self.experience,
            salary_cents: self.salary_cents,
            mood: 100,
        }
    }
}

/// Composite team efficiency: size, experience, and morale factors
/// multiplied together, the first two capped at 1.5. A solo founder with no
/// hires runs at exactly 1.0.
#[must_use]
pub fn team_efficiency(staff: &[StaffMember], team_morale: f64) -> f64 {
    if staff.is_empty() {
        return 1.0;
    }
    let size_factor = (1.0 + staff.len() as f64 * 0.1).min(SIZE_FACTOR_CAP);
    let avg_experience =
        staff.iter().map(|s| u32_to_f64(s.experience)).sum::<f64>() / staff.len() as f64;
    let experience_factor = (1.0 + avg_experience / EXPERIENCE_CAP_DAYS).min(EXPERIENCE_FACTOR_CAP);
    let morale_factor = (team_morale / 100.0).clamp(0.0, 1.0);
    size_factor * experience_factor * morale_factor
}

impl GameState {
    /// Team efficiency using the active project's morale (or full morale
    /// when between projects).
    #[must_use]
    pub fn team_efficiency(&self) -> f64 {
        let morale = self
            .project
            .as_ref()
            .map_or(100.0, |p| f64::from(p.team_morale));
        team_efficiency(&self.staff, morale)
    }
}

/// Regenerate the applicant pool: one or two candidates per staff type.
/// Roles are visited in sorted order so the same seed yields the same pool.
pub fn refresh_candidates(state: &mut GameState) -> Result<(), CommandError> {
    state.normalize();
    let types = state.reference()?.staff_types.types.clone();
    let mut roles: Vec<_> = types.keys().cloned().collect();
    roles.sort_unstable();

    let mut pool = Vec::new();
    if let Some(rng) = state.rng.as_mut() {
        for role in roles {
            let def = &types[&role];
            let count = rng.random_range(1..=2);
            for _ in 0..count {
                let first = CANDIDATE_FIRST_NAMES[rng.random_range(0..CANDIDATE_FIRST_NAMES.len())];
                let last = CANDIDATE_LAST_NAMES[rng.random_range(0..CANDIDATE_LAST_NAMES.len())];
                let mut skills = HashMap::new();
                for skill in &def.skills {
                    skills.insert(skill.clone(), rng.random_range(1..=4u8));
                }
                let experience = rng.random_range(0..1000);
                let variance = rng.random_range(-0.2..0.2);
                let skill_sum: u32 = skills.values().map(|&v| u32::from(v)).sum();
                let skill_bonus = f64::from(skill_sum) / 15.0;
                let salary = i64_to_f64(def.base_salary) * (1.0 + variance + skill_bonus);
                pool.push(Candidate {
                    name: format!("{first} {last}"),
                    role: role.clone(),
                    skills,
                    experience,
                    salary_cents: dollars_to_cents(salary),
                });
            }
        }
    }
    state.candidates = pool;
    Ok(())
}

/// Hire a candidate by index into the current pool.
///
/// # Errors
///
/// Fails when the index is invalid or the workspace is at capacity.
pub fn hire_staff(state: &mut GameState, candidate_index: usize) -> Result<(), CommandError> {
    state.normalize();
    let capacity = {
        let data = state.reference()?;
        data.workspaces
            .tier(&state.workspace)
            .map(|t| t.capacity)
            .ok_or_else(|| {
                CommandError::InvalidSelection(format!("unknown workspace {}", state.workspace))
            })?
    };
    if state.staff.len() >= capacity {
        return Err(CommandError::InvalidSelection(format!(
            "workspace capacity reached ({capacity})"
        )));
    }
    if candidate_index >= state.candidates.len() {
        return Err(CommandError::InvalidSelection(format!(
            "no candidate at index {candidate_index}"
        )));
    }
    let candidate = state.candidates.remove(candidate_index);
    state
        .logs
        .push(format!("{LOG_STAFF_HIRED_PREFIX}{}", candidate.role));
    state.staff.push(candidate.into_member());
    Ok(())
}

/// Fire a staff member by roster index. The rest of the team takes a morale
/// hit.
pub fn fire_staff(state: &mut GameState, staff_index: usize) -> Result<StaffMember, CommandError> {
    state.normalize();
    if staff_index >= state.staff.len() {
        return Err(CommandError::InvalidSelection(format!(
            "no staff member at index {staff_index}"
        )));
    }
    let fired = state.staff.remove(staff_index);
    for member in &mut state.staff {
        member.mood = (member.mood - FIRING_MORALE_PENALTY).max(0);
    }
    state
        .logs
        .push(format!("{LOG_STAFF_FIRED_PREFIX}{}", fired.role));
    Ok(fired)
}

/// Train one skill of a staff member. Cost scales with the current level.
pub fn train_staff(
    state: &mut GameState,
    staff_index: usize,
    skill: &str,
) -> Result<(), CommandError> {
    state.normalize();
    let current = {
        let member = state
            .staff
            .get(staff_index)
            .ok_or_else(|| {
                CommandError::InvalidSelection(format!("no staff member at index {staff_index}"))
            })?;
        *member.skills.get(skill).ok_or_else(|| {
            CommandError::InvalidSelection(format!("{} has no skill {skill}", member.name))
        })?
    };
    if current >= SKILL_MAX {
        return Err(CommandError::InvalidSelection(format!(
            "{skill} is already at maximum level"
        )));
    }
    let cost = dollars_to_cents(TRAINING_BASE_COST_DOLLARS * f64::from(current));
    state.charge(cost)?;
    let member = &mut state.staff[staff_index];
    if let Some(level) = member.skills.get_mut(skill) {
        *level += 1;
    }
    member.mood = (member.mood + TRAINING_MOOD_BOOST).min(100);
    Ok(())
}

/// Grant a raise: +15% salary, +15 mood.
pub fn give_raise(state: &mut GameState, staff_index: usize) -> Result<(), CommandError> {
    state.normalize();
    let member = state.staff.get_mut(staff_index).ok_or_else(|| {
        CommandError::InvalidSelection(format!("no staff member at index {staff_index}"))
    })?;
    member.salary_cents = dollars_to_cents(
        crate::numbers::cents_to_dollars(member.salary_cents) * RAISE_SALARY_FACTOR,
    );
    member.mood = (member.mood + RAISE_MOOD_BOOST).min(100);
    Ok(())
}

/// Weekly staff processing: experience accrues and moods drift. Returns the
/// salary total for the cost step of the tick.
pub fn process_week(state: &mut GameState) -> i64 {
    let salaries = state.total_salaries_cents();
    for member in &mut state.staff {
        member.experience = member.experience.saturating_add(1);
    }
    if let Some(rng) = state.rng.as_mut() {
        for member in &mut state.staff {
            if rng.random_bool(MOOD_SHIFT_CHANCE) {
                let shift = rng.random_range(-5..=5);
                member.mood = (member.mood + shift).clamp(0, 100);
            }
        }
    }
    salaries
}
