//! Technology research and workspace upgrades.
//!
//! Research is one project at a time: purchasing a technology charges its
//! cost up front and schedules the work; the weekly clock counts it down
//! and applies the modifier effects on completion.

use crate::numbers::{dollars_to_cents, i64_to_f64};
use crate::state::{
    CommandError, GameState, Research, LOG_RESEARCH_COMPLETE_PREFIX, LOG_WORKSPACE_UPGRADED_PREFIX,
};

pub(crate) const LOG_RESEARCH_STARTED_PREFIX: &str = "log.research.started.";

/// Start researching a technology, charging its cost immediately.
///
/// # Errors
///
/// Fails for unknown ids, technologies already owned, unmet prerequisites,
/// research already in flight, or insufficient funds.
pub fn purchase_technology(state: &mut GameState, tech_id: &str) -> Result<(), CommandError> {
    state.normalize();
    if state.technologies.iter().any(|t| t == tech_id) {
        return Err(CommandError::InvalidSelection(format!(
            "technology {tech_id} already researched"
        )));
    }
    if let Some(research) = &state.research {
        return Err(CommandError::InvalidSelection(format!(
            "research already in progress: {}",
            research.tech_id
        )));
    }

    let (cost_cents, weeks) = {
        let data = state.reference()?;
        let tech = data.technologies.technologies.get(tech_id).ok_or_else(|| {
            CommandError::InvalidSelection(format!("unknown technology {tech_id}"))
        })?;
        for requirement in &tech.requires {
            if !state.technologies.iter().any(|t| t == requirement) {
                return Err(CommandError::InvalidSelection(format!(
                    "technology {tech_id} requires {requirement}"
                )));
            }
        }
        (dollars_to_cents(i64_to_f64(tech.cost)), tech.weeks)
    };

    state.charge(cost_cents)?;
    state.research = Some(Research {
        tech_id: tech_id.to_string(),
        weeks_remaining: weeks,
    });
    state
        .logs
        .push(format!("{LOG_RESEARCH_STARTED_PREFIX}{tech_id}"));
    Ok(())
}

/// Advance in-flight research by one week, applying the technology's
/// effects when it completes. Returns the completed id, if any.
pub(crate) fn tick_research(state: &mut GameState) -> Option<String> {
    let research = state.research.as_mut()?;
    research.weeks_remaining = research.weeks_remaining.saturating_sub(1);
    if research.weeks_remaining > 0 {
        return None;
    }
    let tech_id = state.research.take()?.tech_id;

    let effects = state
        .data
        .as_ref()
        .and_then(|d| d.technologies.technologies.get(&tech_id))
        .map(|t| t.effects.clone())
        .unwrap_or_default();
    let mut names: Vec<&String> = effects.keys().collect();
    names.sort();
    for name in names {
        state.modifiers.apply_named(name, effects[name]);
    }

    state.technologies.push(tech_id.clone());
    state
        .logs
        .push(format!("{LOG_RESEARCH_COMPLETE_PREFIX}{tech_id}"));
    Some(tech_id)
}

/// Move up to the next workspace tier, charging its cost.
///
/// # Errors
///
/// Fails at the top tier or when funds are short.
pub fn upgrade_workspace(state: &mut GameState) -> Result<(), CommandError> {
    state.normalize();
    let (next_id, cost_cents) = {
        let data = state.reference()?;
        let current = data.workspaces.index_of(&state.workspace).ok_or_else(|| {
            CommandError::InvalidSelection(format!("unknown workspace {}", state.workspace))
        })?;
        let next = data.workspaces.tiers.get(current + 1).ok_or_else(|| {
            CommandError::InvalidSelection("already at the top workspace tier".to_string())
        })?;
        (next.id.clone(), dollars_to_cents(i64_to_f64(next.cost)))
    };

    state.charge(cost_cents)?;
    state.workspace = next_id.clone();
    state
        .logs
        .push(format!("{LOG_WORKSPACE_UPGRADED_PREFIX}{next_id}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferenceData;

    fn rich_state() -> GameState {
        let mut state = GameState::new("Moon Frog", 5, ReferenceData::default_config());
        state.money_cents = 10_000_000;
        state
    }

    #[test]
    fn purchase_charges_and_schedules_research() {
        let mut state = rich_state();
        let before = state.money_cents;
        purchase_technology(&mut state, "ide_upgrade").unwrap();
        assert_eq!(before - state.money_cents, 100_000);
        let research = state.research.as_ref().unwrap();
        assert_eq!(research.tech_id, "ide_upgrade");
        assert_eq!(research.weeks_remaining, 2);
    }

    #[test]
    fn one_research_project_at_a_time() {
        let mut state = rich_state();
        purchase_technology(&mut state, "ide_upgrade").unwrap();
        let err = purchase_technology(&mut state, "automated_testing").unwrap_err();
        assert!(matches!(err, CommandError::InvalidSelection(_)));
    }

    #[test]
    fn prerequisites_are_enforced() {
        let mut state = rich_state();
        let err = purchase_technology(&mut state, "version_control").unwrap_err();
        assert!(matches!(err, CommandError::InvalidSelection(_)));

        state.technologies.push("ide_upgrade".to_string());
        purchase_technology(&mut state, "version_control").unwrap();
    }

    #[test]
    fn completion_applies_modifier_effects() {
        let mut state = rich_state();
        purchase_technology(&mut state, "ide_upgrade").unwrap();
        assert!(tick_research(&mut state).is_none());
        let done = tick_research(&mut state);
        assert_eq!(done.as_deref(), Some("ide_upgrade"));
        assert!(state.research.is_none());
        assert!(state.technologies.contains(&"ide_upgrade".to_string()));
        assert!((state.modifiers.development_speed - 1.2).abs() < f64::EPSILON);
        assert!((state.modifiers.bug_rate - 0.9).abs() < f64::EPSILON);
        assert!(state
            .logs
            .iter()
            .any(|l| l == &format!("{LOG_RESEARCH_COMPLETE_PREFIX}ide_upgrade")));
    }

    #[test]
    fn owned_technologies_cannot_be_rebought() {
        let mut state = rich_state();
        state.technologies.push("ide_upgrade".to_string());
        let err = purchase_technology(&mut state, "ide_upgrade").unwrap_err();
        assert!(matches!(err, CommandError::InvalidSelection(_)));
    }

    #[test]
    fn workspace_upgrades_walk_the_tiers() {
        let mut state = rich_state();
        assert_eq!(state.workspace, "home_office");
        upgrade_workspace(&mut state).unwrap();
        assert_eq!(state.workspace, "small_studio");
        upgrade_workspace(&mut state).unwrap();
        upgrade_workspace(&mut state).unwrap();
        assert_eq!(state.workspace, "large_studio");
        let err = upgrade_workspace(&mut state).unwrap_err();
        assert!(matches!(err, CommandError::InvalidSelection(_)));
    }

    #[test]
    fn upgrades_respect_funds() {
        let mut state = rich_state();
        state.money_cents = 1_000;
        let err = upgrade_workspace(&mut state).unwrap_err();
        assert!(matches!(err, CommandError::InsufficientFunds { .. }));
        assert_eq!(state.workspace, "home_office");
    }
}
