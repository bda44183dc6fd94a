pub mod error;
mod parser;

pub use error::ReactionSmilesError;
pub use parser::parse_reaction_smiles;

use crate::atom::{Atom, MapOrigin};
use crate::bond::Bond;
use crate::graph_ops::{merge, MergedMol};
use crate::mol::Mol;

/// A reaction record: reactant and product molecules, each atom carrying
/// its map number.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub(crate) reactants: Vec<Mol<Atom, Bond>>,
    pub(crate) products: Vec<Mol<Atom, Bond>>,
}

impl Reaction {
    pub fn new(reactants: Vec<Mol<Atom, Bond>>, products: Vec<Mol<Atom, Bond>>) -> Self {
        Self {
            reactants,
            products,
        }
    }

    pub fn reactants(&self) -> &[Mol<Atom, Bond>] {
        &self.reactants
    }

    pub fn products(&self) -> &[Mol<Atom, Bond>] {
        &self.products
    }

    /// All reactant molecules as one graph, atoms in molecule order.
    pub fn merged_reactants(&self) -> MergedMol<Atom, Bond> {
        merge(&self.reactants)
    }

    pub fn merged_products(&self) -> MergedMol<Atom, Bond> {
        merge(&self.products)
    }

    /// Map numbers of all reactant atoms in merged order.
    pub fn reactant_map_numbers(&self) -> Vec<u16> {
        collect_map_numbers(&self.reactants)
    }

    pub fn product_map_numbers(&self) -> Vec<u16> {
        collect_map_numbers(&self.products)
    }

    /// Copies map numbers, given in merged order, back onto the molecules.
    pub(crate) fn write_map_numbers(
        &mut self,
        reactants: &[(u16, MapOrigin)],
        products: &[(u16, MapOrigin)],
    ) {
        write_side(&mut self.reactants, reactants);
        write_side(&mut self.products, products);
    }
}

pub fn from_reaction_smiles(s: &str) -> Result<Reaction, ReactionSmilesError> {
    parse_reaction_smiles(s)
}

fn collect_map_numbers(mols: &[Mol<Atom, Bond>]) -> Vec<u16> {
    mols.iter()
        .flat_map(|mol| mol.atoms().map(move |a| mol.atom(a).map_no))
        .collect()
}

fn write_side(mols: &mut [Mol<Atom, Bond>], numbers: &[(u16, MapOrigin)]) {
    let mut values = numbers.iter();
    for mol in mols.iter_mut() {
        let atoms: Vec<_> = mol.atoms().collect();
        for idx in atoms {
            let Some(&(map_no, origin)) = values.next() else {
                return;
            };
            let atom = mol.atom_mut(idx);
            atom.map_no = map_no;
            atom.map_origin = origin;
        }
    }
}
