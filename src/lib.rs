//! Atom-to-atom mapping of chemical reactions.
//!
//! ```
//! use rxnmap::ReactionMapper;
//!
//! let mapper = ReactionMapper::with_standard_rules().unwrap();
//! let (reaction, result) = mapper.map_smiles("CC(=O)O.OCC>>CC(=O)OCC.O").unwrap();
//! assert_eq!(result.mapped_count(), 7);
//! assert_eq!(reaction.reactant_map_numbers()[1], reaction.product_map_numbers()[1]);
//! ```

pub mod atom;
pub mod bond;
pub mod canonical;
pub mod config;
pub mod element;
pub mod error;
pub mod graph_ops;
pub mod mapping;
pub mod mol;
pub mod reaction;
pub mod rings;
pub mod smiles;
pub mod substruct;
pub mod traits;

pub use atom::{Atom, MapOrigin, Parity};
pub use bond::{Bond, BondOrder, SimpleBondType};
pub use config::MapperConfig;
pub use error::MapperError;
pub use mapping::{
    ChemicalRule, MappingResult, MappingScorer, ReactionMapper, RuleBondEdit, RuleCatalog,
};
pub use mol::Mol;
pub use reaction::{from_reaction_smiles, Reaction, ReactionSmilesError};
pub use smiles::{from_smiles, SmilesError};
pub use traits::{
    HasAromaticity, HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount, HasIsotope,
};
