mod builder;
pub mod error;
mod parse_tree;
mod tokenizer;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
pub use error::SmilesError;

/// Parses a SMILES string. Atom-map classes (`[C:3]`) become manual map
/// numbers; aromatic input is kept aromatic rather than kekulized.
pub fn from_smiles(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    if tokens.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tree = parse_tree::build_parse_tree(&tokens)?;
    Ok(builder::build_mol(&tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Parity;
    use crate::bond::{BondOrder, SimpleBondType};
    use petgraph::graph::NodeIndex;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn atom(mol: &Mol<Atom, Bond>, i: usize) -> &Atom {
        mol.atom(n(i))
    }

    fn bond(mol: &Mol<Atom, Bond>, a: usize, b: usize) -> &Bond {
        let edge = mol.bond_between(n(a), n(b)).unwrap();
        mol.bond(edge)
    }

    #[test]
    fn methane() {
        let mol = from_smiles("C").unwrap();
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(mol.bond_count(), 0);
        assert_eq!(atom(&mol, 0).atomic_num, 6);
        assert_eq!(atom(&mol, 0).hydrogen_count, 4);
    }

    #[test]
    fn ethene() {
        let mol = from_smiles("C=C").unwrap();
        assert_eq!(atom(&mol, 0).hydrogen_count, 2);
        assert_eq!(bond(&mol, 0, 1).order, BondOrder::Double);
    }

    #[test]
    fn acetic_acid() {
        let mol = from_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(atom(&mol, 0).hydrogen_count, 3);
        assert_eq!(atom(&mol, 1).hydrogen_count, 0);
        assert_eq!(atom(&mol, 2).hydrogen_count, 0);
        assert_eq!(atom(&mol, 3).hydrogen_count, 1);
        assert_eq!(bond(&mol, 1, 2).order, BondOrder::Double);
    }

    #[test]
    fn hypervalent_sulfur_and_phosphorus() {
        let dmso = from_smiles("CS(=O)C").unwrap();
        assert_eq!(atom(&dmso, 1).hydrogen_count, 0);
        let phosphoric = from_smiles("OP(=O)(O)O").unwrap();
        assert_eq!(atom(&phosphoric, 1).hydrogen_count, 0);
    }

    #[test]
    fn bracket_atoms_keep_explicit_hydrogens() {
        let mol = from_smiles("[NH4+]").unwrap();
        assert_eq!(atom(&mol, 0).hydrogen_count, 4);
        assert_eq!(atom(&mol, 0).formal_charge, 1);
        let mol = from_smiles("[Fe]").unwrap();
        assert_eq!(atom(&mol, 0).hydrogen_count, 0);
    }

    #[test]
    fn isotope() {
        let mol = from_smiles("[13CH4]").unwrap();
        assert_eq!(atom(&mol, 0).isotope, 13);
        assert_eq!(atom(&mol, 0).hydrogen_count, 4);
    }

    #[test]
    fn benzene_stays_aromatic() {
        let mol = from_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.bond_count(), 6);
        for i in 0..6 {
            assert!(atom(&mol, i).is_aromatic);
            assert_eq!(atom(&mol, i).hydrogen_count, 1);
        }
        for e in mol.bonds() {
            assert_eq!(mol.bond(e).simple_type(), SimpleBondType::Delocalized);
        }
    }

    #[test]
    fn pyridine_and_pyrrole() {
        let pyridine = from_smiles("c1ccncc1").unwrap();
        assert_eq!(atom(&pyridine, 3).hydrogen_count, 0);
        let pyrrole = from_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(atom(&pyrrole, 3).hydrogen_count, 1);
        let furan = from_smiles("c1ccoc1").unwrap();
        assert_eq!(atom(&furan, 3).hydrogen_count, 0);
    }

    #[test]
    fn fused_aromatic_carbon_has_no_hydrogen() {
        let mol = from_smiles("c1ccc2ccccc2c1").unwrap();
        assert_eq!(atom(&mol, 3).hydrogen_count, 0);
        assert_eq!(atom(&mol, 0).hydrogen_count, 1);
    }

    #[test]
    fn biphenyl_link_is_not_aromatic() {
        let mol = from_smiles("c1ccccc1-c1ccccc1").unwrap();
        assert!(!bond(&mol, 5, 6).is_aromatic);
    }

    #[test]
    fn atom_class_becomes_map_number() {
        let mol = from_smiles("[CH3:1][OH:2]").unwrap();
        assert_eq!(atom(&mol, 0).map_no, 1);
        assert_eq!(atom(&mol, 1).map_no, 2);
    }

    #[test]
    fn wildcard_bond() {
        let mol = from_smiles("[C:1]~[O:2]").unwrap();
        assert!(bond(&mol, 0, 1).any_order);
    }

    #[test]
    fn tetrahedral_parity_independent_of_writing_order() {
        let a = from_smiles("F[C@H](Cl)Br").unwrap();
        let b = from_smiles("[C@@H](F)(Cl)Br").unwrap();
        assert_eq!(atom(&a, 1).parity, Parity::Odd);
        assert_eq!(atom(&b, 0).parity, Parity::Odd);

        let c = from_smiles("F[C@@H](Cl)Br").unwrap();
        assert_eq!(atom(&c, 1).parity, Parity::Even);
    }

    #[test]
    fn parity_with_ring_closure_neighbor() {
        // The ring partner sits at the digit position, ahead of the methyl.
        let mol = from_smiles("[C@]1(C)(F)CCC1").unwrap();
        // written order [5, 1, 2, 3]; index order [1, 2, 3, 5]: a four-cycle.
        assert_eq!(atom(&mol, 0).parity, Parity::Even);
    }

    #[test]
    fn parity_needs_three_substituents() {
        // two neighbors plus the implicit hydrogen is enough
        let mol = from_smiles("[C@H](F)Cl").unwrap();
        assert_eq!(atom(&mol, 0).parity, Parity::Odd);

        let mol = from_smiles("F[C@]Cl").unwrap();
        assert_eq!(atom(&mol, 1).parity, Parity::None);
        let mol = from_smiles("[C@H2]F").unwrap();
        assert_eq!(atom(&mol, 0).parity, Parity::None);
    }

    #[test]
    fn achiral_atoms_have_no_parity() {
        let mol = from_smiles("CC(O)C").unwrap();
        assert!(mol.atoms().all(|a| mol.atom(a).parity == Parity::None));
    }

    #[test]
    fn sodium_chloride() {
        let mol = from_smiles("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 0);
        assert_eq!(atom(&mol, 0).formal_charge, 1);
        assert_eq!(atom(&mol, 1).formal_charge, -1);
    }

    #[test]
    fn empty_string() {
        assert_eq!(from_smiles(""), Err(SmilesError::EmptyInput));
        assert_eq!(from_smiles("   "), Err(SmilesError::EmptyInput));
    }

    #[test]
    fn malformed_input() {
        assert!(from_smiles("C(C").is_err());
        assert!(from_smiles("C1CC").is_err());
        assert!(matches!(
            from_smiles("[C"),
            Err(SmilesError::UnclosedBracket { .. })
        ));
        assert!(matches!(
            from_smiles("[Xx]"),
            Err(SmilesError::InvalidElement { .. })
        ));
    }
}
