use serde::{Deserialize, Serialize};

use crate::error::MapperError;

/// Largest class size the reaction-center completer will fully permute.
/// 8! = 40320 already exceeds any sensible permutation ceiling.
const MAX_FULL_PERMUTATION_LIMIT: usize = 8;

/// Search bounds and switches for [`ReactionMapper`](crate::ReactionMapper).
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```
/// use rxnmap::MapperConfig;
///
/// let config = MapperConfig::from_json(r#"{ "max_attempts": 8 }"#).unwrap();
/// assert_eq!(config.max_attempts, 8);
/// assert_eq!(config.max_radius, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    /// Largest environment radius compared between atoms.
    pub max_radius: usize,
    /// Full mapping passes per reaction (and per rule trial) while the
    /// decision tree still has unexplored choices.
    pub max_attempts: usize,
    /// A rule whose reactant template matches more often than this is
    /// skipped for the reaction.
    pub max_rule_matches: usize,
    /// Reaction-center completion is abandoned above this many joint
    /// permutations.
    pub max_center_permutations: usize,
    /// Atom classes up to this size are permuted exhaustively; larger ones
    /// only try the identity permutation.
    pub full_permutation_limit: usize,
    pub use_rules: bool,
    /// Run rule trials on the rayon pool. Results are identical either way.
    pub parallel_rule_trials: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_radius: 7,
            max_attempts: 64,
            max_rule_matches: 512,
            max_center_permutations: 20_000,
            full_permutation_limit: 6,
            use_rules: true,
            parallel_rule_trials: true,
        }
    }
}

impl MapperConfig {
    pub fn from_json(json: &str) -> Result<Self, MapperError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, MapperError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), MapperError> {
        if self.max_radius == 0 {
            return Err(MapperError::InvalidConfig(
                "max_radius must be at least 1".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(MapperError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.max_center_permutations == 0 {
            return Err(MapperError::InvalidConfig(
                "max_center_permutations must be at least 1".into(),
            ));
        }
        if self.full_permutation_limit > MAX_FULL_PERMUTATION_LIMIT {
            return Err(MapperError::InvalidConfig(format!(
                "full_permutation_limit {} exceeds {MAX_FULL_PERMUTATION_LIMIT}",
                self.full_permutation_limit
            )));
        }
        Ok(())
    }
}
