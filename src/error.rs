use thiserror::Error;

use crate::reaction::ReactionSmilesError;
use crate::smiles::SmilesError;

/// Errors surfaced by the mapping API. Bounded-search cutoffs are not
/// errors: they yield a partial mapping instead.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error(transparent)]
    Smiles(#[from] SmilesError),
    #[error(transparent)]
    ReactionSmiles(#[from] ReactionSmilesError),
    #[error("configuration is not valid JSON: {0}")]
    ConfigJson(#[from] serde_json::Error),
    #[error("invalid mapper configuration: {0}")]
    InvalidConfig(String),
    #[error("rule '{name}' has an unusable template: {reason}")]
    InvalidRule { name: String, reason: String },
}
