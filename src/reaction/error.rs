use thiserror::Error;

use crate::smiles::SmilesError;

/// Error returned when parsing a reaction SMILES string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactionSmilesError {
    /// No `>>` separator found.
    #[error("no '>>' separator found in reaction SMILES")]
    MissingSeparator,
    /// More than two `>` separators.
    #[error("too many '>' separators in reaction SMILES")]
    TooManySeparators,
    #[error("reaction has no reactants")]
    EmptyReactants,
    #[error("reaction has no products")]
    EmptyProducts,
    /// A molecule failed to parse.
    #[error("invalid {section} component: {detail}")]
    InvalidComponent {
        section: &'static str,
        #[source]
        detail: SmilesError,
    },
}
