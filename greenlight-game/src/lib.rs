//! Greenlight Game Engine
//!
//! Platform-agnostic core game logic for the Greenlight studio simulation.
//! This crate provides all game mechanics without UI or platform-specific dependencies.

pub mod bugs;
pub mod clock;
pub mod data;
pub mod events;
pub mod market;
pub mod numbers;
pub mod project;
pub mod release;
pub mod reputation;
pub mod rngs;
pub mod seed;
pub mod staff;
pub mod state;
pub mod tech;
pub mod testing;

// Re-export commonly used types
pub use bugs::{BugCounts, FixReport, fix_bugs};
pub use clock::{WeeklyReport, advance_week};
pub use data::{
    AudienceCatalog, GenreCatalog, GenreDef, ReferenceData, ReviewerCatalog, ReviewerProfile,
    StaffCatalog, SubgenreDef, TechCatalog, TechDef, WorkspaceCatalog, WorkspaceDef,
};
pub use events::{EventTone, MarketEffect, MarketEffectKind, WeeklyEvent, draw_weekly_event};
pub use market::{CompetitorRelease, GenreTrend, MarketCycle, MarketState, TrendSnapshot};
pub use project::{
    DevPhase, Feature, LaunchWindow, LifecycleError, MarketingStrategy, Milestone,
    OptimizationFocus, PlanningData, Priority, Project, ProjectDraft, ResourceAllocation,
    TargetAudience, assign_team, cancel_project, plan_feature, set_launch_window,
    set_marketing_budget, set_marketing_strategy, set_optimization_focus, set_priority,
    set_resource_allocation, set_target_audience, start_project, transition_phase,
};
pub use release::{
    ReleaseOutcome, ReleasePolicy, Review, marketing_effectiveness, release_game,
    release_game_with_policy, timing_impact,
};
pub use reputation::{Reputation, SegmentReputation, social_mentions};
pub use seed::{
    decode_to_seed, encode_friendly, generate_code_from_entropy, seed_from_studio_name,
};
pub use staff::{
    Candidate, StaffMember, fire_staff, give_raise, hire_staff, refresh_candidates, team_efficiency,
    train_staff,
};
pub use state::{
    CommandError, GameState, Modifiers, ReceptionScores, ReleasedGame, Research,
};
pub use tech::{purchase_technology, upgrade_workspace};
pub use testing::{TestReport, TestType, run_test};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the reference tables from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the reference data cannot be loaded.
    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), Self::Error>;

    /// Load game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<GameState>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main game engine for managing campaign instances
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Create a new campaign with an explicit seed
    ///
    /// # Errors
    ///
    /// Returns an error if the reference data cannot be loaded.
    pub fn create_game(&self, company_name: &str, seed: u64) -> Result<GameState, L::Error> {
        let data = self.data_loader.load_reference_data()?;
        Ok(GameState::new(company_name, seed, data))
    }

    /// Create a new campaign seeded from the studio name, so the same name
    /// always produces the same world
    ///
    /// # Errors
    ///
    /// Returns an error if the reference data cannot be loaded.
    pub fn create_game_from_name(&self, company_name: &str) -> Result<GameState, L::Error> {
        self.create_game(company_name, seed::seed_from_studio_name(company_name))
    }

    /// Save a game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be saved.
    pub fn save_game(&self, save_name: &str, game_state: &GameState) -> Result<(), S::Error> {
        self.storage.save_game(save_name, game_state)
    }

    /// Load a game state
    ///
    /// # Errors
    ///
    /// Returns an error if the game state cannot be loaded or rehydrated.
    pub fn load_game(&self, save_name: &str) -> Result<Option<GameState>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(game_state) = self.storage.load_game(save_name).map_err(Into::into)? {
            // Rehydrate with fresh data
            let data = self.data_loader.load_reference_data().map_err(Into::into)?;
            Ok(Some(game_state.rehydrate(data)))
        } else {
            Ok(None)
        }
    }
}
