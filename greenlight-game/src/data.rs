//! Static reference tables: genres, audiences, reviewers, staff types,
//! workspaces, technologies.
//!
//! All catalogs are read-only for the simulation. Each one loads from JSON
//! with validation and falls back to the embedded defaults shipped with the
//! crate, so platform layers may override any table without recompiling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A subgenre within a genre, carrying its selectable design elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgenreDef {
    pub name: String,
    pub cost_mult: f64,
    pub time_mult: f64,
    pub elements: Vec<String>,
}

/// A game genre with its economic multipliers and subgenres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreDef {
    pub name: String,
    pub cost_mult: f64,
    pub time_mult: f64,
    pub market_size: f64,
    pub fan_loyalty: f64,
    pub subgenres: HashMap<String, SubgenreDef>,
}

/// Catalog of all genres keyed by genre id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenreCatalog {
    pub genres: HashMap<String, GenreDef>,
}

/// An audience segment with its genre preference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceSegmentDef {
    pub name: String,
    pub loyalty_gain: f64,
    pub preferences: HashMap<String, f64>,
}

/// Social mention templates per sentiment tier. `{company}` and `{genre}`
/// placeholders are substituted at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MentionTemplates {
    pub positive: Vec<String>,
    pub neutral: Vec<String>,
    pub negative: Vec<String>,
}

/// Audience segments plus the mention templates used after releases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AudienceCatalog {
    pub segments: HashMap<String, AudienceSegmentDef>,
    pub mentions: MentionTemplates,
}

/// Quote pools for one reviewer persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReviewQuotes {
    pub positive: Vec<String>,
    pub neutral: Vec<String>,
    pub negative: Vec<String>,
}

/// A critic persona: focus areas, metric biases, and quote pools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerProfile {
    pub id: String,
    pub name: String,
    pub title: String,
    pub style: String,
    pub focuses: Vec<String>,
    pub biases: HashMap<String, f64>,
    pub quotes: ReviewQuotes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReviewerCatalog {
    pub reviewers: Vec<ReviewerProfile>,
}

/// A hireable staff archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffTypeDef {
    pub name: String,
    /// Weekly base salary in dollars.
    pub base_salary: i64,
    pub skills: Vec<String>,
    pub affects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StaffCatalog {
    pub types: HashMap<String, StaffTypeDef>,
}

/// A workspace tier. Tiers are ordered from cheapest to most expensive and
/// upgrades walk the order one step at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDef {
    pub id: String,
    pub name: String,
    /// Purchase cost in dollars.
    pub cost: i64,
    pub capacity: usize,
    pub productivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkspaceCatalog {
    pub tiers: Vec<WorkspaceDef>,
}

/// A researchable technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechDef {
    pub branch: String,
    pub name: String,
    /// Purchase cost in dollars.
    pub cost: i64,
    /// Research duration in weeks.
    pub weeks: u32,
    /// Modifier name -> multiplier applied on completion.
    pub effects: HashMap<String, f64>,
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TechCatalog {
    pub technologies: HashMap<String, TechDef>,
}

/// Container for every reference table the simulation consumes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceData {
    pub genres: GenreCatalog,
    pub audiences: AudienceCatalog,
    pub reviewers: ReviewerCatalog,
    pub staff_types: StaffCatalog,
    pub workspaces: WorkspaceCatalog,
    pub technologies: TechCatalog,
}

impl GenreCatalog {
    /// Load the genre catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        if self.genres.is_empty() {
            return Err("genre catalog is empty".to_string());
        }
        for (id, genre) in &self.genres {
            if genre.subgenres.is_empty() {
                return Err(format!("genre {id} has no subgenres"));
            }
            if genre.cost_mult <= 0.0 || genre.time_mult <= 0.0 {
                return Err(format!("genre {id} has non-positive multipliers"));
            }
            for (sid, sub) in &genre.subgenres {
                if sub.elements.len() < 3 {
                    return Err(format!("subgenre {id}/{sid} offers fewer than 3 elements"));
                }
            }
        }
        Ok(())
    }

    /// Get embedded default catalog.
    #[must_use]
    pub fn default_config() -> Self {
        serde_json::from_str(include_str!("../assets/genres.json")).unwrap_or_default()
    }
}

impl AudienceCatalog {
    /// Load the audience catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        for segment in ["casual", "hardcore", "critics", "all"] {
            if !self.segments.contains_key(segment) {
                return Err(format!("missing audience segment: {segment}"));
            }
        }
        Ok(())
    }

    /// Get embedded default catalog.
    #[must_use]
    pub fn default_config() -> Self {
        serde_json::from_str(include_str!("../assets/audiences.json")).unwrap_or_default()
    }
}

impl ReviewerCatalog {
    /// Load the reviewer catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        if self.reviewers.len() < 3 {
            return Err("need at least 3 reviewer personas".to_string());
        }
        for reviewer in &self.reviewers {
            if reviewer.quotes.positive.is_empty()
                || reviewer.quotes.neutral.is_empty()
                || reviewer.quotes.negative.is_empty()
            {
                return Err(format!("reviewer {} has an empty quote pool", reviewer.id));
            }
        }
        Ok(())
    }

    /// Get embedded default catalog.
    #[must_use]
    pub fn default_config() -> Self {
        serde_json::from_str(include_str!("../assets/reviewers.json")).unwrap_or_default()
    }
}

impl StaffCatalog {
    /// Load the staff catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        for role in ["programmer", "artist", "writer", "qa"] {
            let Some(def) = self.types.get(role) else {
                return Err(format!("missing staff type: {role}"));
            };
            if def.skills.is_empty() {
                return Err(format!("staff type {role} has no skills"));
            }
        }
        Ok(())
    }

    /// Get embedded default catalog.
    #[must_use]
    pub fn default_config() -> Self {
        serde_json::from_str(include_str!("../assets/staff.json")).unwrap_or_default()
    }
}

impl WorkspaceCatalog {
    /// Load the workspace catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        if self.tiers.is_empty() {
            return Err("workspace catalog is empty".to_string());
        }
        let ascending = self.tiers.windows(2).all(|w| w[0].cost <= w[1].cost);
        if !ascending {
            return Err("workspace tiers must be ordered by cost".to_string());
        }
        Ok(())
    }

    /// Get embedded default catalog.
    #[must_use]
    pub fn default_config() -> Self {
        serde_json::from_str(include_str!("../assets/workspaces.json")).unwrap_or_default()
    }

    /// Position of a tier in the upgrade order.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.id == id)
    }

    #[must_use]
    pub fn tier(&self, id: &str) -> Option<&WorkspaceDef> {
        self.tiers.iter().find(|t| t.id == id)
    }
}

impl TechCatalog {
    /// Load the technology catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let catalog: Self =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), String> {
        for (id, tech) in &self.technologies {
            for req in &tech.requires {
                if !self.technologies.contains_key(req) {
                    return Err(format!("tech {id} requires unknown tech {req}"));
                }
            }
        }
        Ok(())
    }

    /// Get embedded default catalog.
    #[must_use]
    pub fn default_config() -> Self {
        serde_json::from_str(include_str!("../assets/technologies.json")).unwrap_or_default()
    }
}

impl ReferenceData {
    /// Build the full reference set from the embedded defaults.
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            genres: GenreCatalog::default_config(),
            audiences: AudienceCatalog::default_config(),
            reviewers: ReviewerCatalog::default_config(),
            staff_types: StaffCatalog::default_config(),
            workspaces: WorkspaceCatalog::default_config(),
            technologies: TechCatalog::default_config(),
        }
    }

    /// Empty reference set (useful for tests that inject their own tables).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Genre preference multiplier for an audience/genre pair.
    /// Missing pairs fall back to 1.0 for reception and are handled
    /// separately (0.5) by the reputation match factor.
    #[must_use]
    pub fn genre_preference(&self, audience: &str, genre: &str) -> Option<f64> {
        self.audiences
            .segments
            .get(audience)
            .and_then(|s| s.preferences.get(genre))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse_and_validate() {
        let data = ReferenceData::default_config();
        assert!(data.genres.validate().is_ok());
        assert!(data.audiences.validate().is_ok());
        assert!(data.reviewers.validate().is_ok());
        assert!(data.staff_types.validate().is_ok());
        assert!(data.workspaces.validate().is_ok());
        assert!(data.technologies.validate().is_ok());
        assert_eq!(data.genres.genres.len(), 10);
        assert_eq!(data.reviewers.reviewers.len(), 5);
        assert_eq!(data.workspaces.tiers.len(), 4);
    }

    #[test]
    fn genre_preferences_resolve() {
        let data = ReferenceData::default_config();
        let casual_puzzle = data.genre_preference("casual", "puzzle").unwrap();
        assert!((casual_puzzle - 1.5).abs() < f64::EPSILON);
        assert!(data.genre_preference("casual", "unknown-genre").is_none());
    }

    #[test]
    fn tech_requirement_chains_are_closed() {
        let techs = TechCatalog::default_config();
        assert!(techs.technologies.contains_key("ide_upgrade"));
        let ci = &techs.technologies["continuous_integration"];
        assert_eq!(ci.requires, vec!["version_control".to_string()]);
    }

    #[test]
    fn from_json_rejects_bad_catalogs() {
        assert!(GenreCatalog::from_json("{\"genres\":{}}").is_err());
        assert!(WorkspaceCatalog::from_json("not json").is_err());
    }
}
