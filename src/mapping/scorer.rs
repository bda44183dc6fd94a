use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder, SimpleBondType};
use crate::element::{is_metal, CARBON, OXYGEN, SULFUR};
use crate::mol::{permutation_parity, Mol};

const METAL_HETEROATOM_PENALTY: f64 = 1.7;
const OXO_CARBON_HETEROATOM_PENALTY: f64 = 1.8;
const HETEROATOM_PENALTY: f64 = 1.9;
const CARBON_CARBON_BASE_PENALTY: f64 = 1.9;
const DELOCALIZED_CARBON_CARBON_PENALTY: f64 = 3.0;
const STEREO_INVERSION_PENALTY: f64 = 5.0;

/// Rates an atom correspondence by the bond changes it implies.
///
/// Scores are non-positive: 0 means every bond survives unchanged, and each
/// broken, formed or retyped bond and each unexplained stereo inversion
/// lowers the score.
pub struct MappingScorer<'a> {
    reactant: &'a Mol<Atom, Bond>,
    product: &'a Mol<Atom, Bond>,
}

impl<'a> MappingScorer<'a> {
    pub fn new(reactant: &'a Mol<Atom, Bond>, product: &'a Mol<Atom, Bond>) -> Self {
        Self { reactant, product }
    }

    /// `reactant_map` and `product_map` hold one map number per atom, 0 for
    /// unmapped atoms.
    pub fn score(&self, reactant_map: &[u16], product_map: &[u16]) -> f64 {
        let product_by_map = atoms_by_map_no(product_map);
        let mut handled = vec![false; self.product.bond_count()];
        let mut penalty = 0.0;

        for edge in self.reactant.bonds() {
            let Some((a, b)) = self.reactant.bond_endpoints(edge) else {
                continue;
            };
            let partner = mapped_partner(reactant_map, &product_by_map, a)
                .zip(mapped_partner(reactant_map, &product_by_map, b))
                .and_then(|(pa, pb)| self.product.bond_between(pa, pb));
            match partner {
                Some(product_edge) => {
                    handled[product_edge.index()] = true;
                    if self.reactant.bond(edge).simple_type()
                        != self.product.bond(product_edge).simple_type()
                    {
                        penalty += 1.0;
                    }
                }
                None => penalty += break_penalty(self.reactant, edge),
            }
        }

        for edge in self.product.bonds() {
            if !handled[edge.index()] {
                penalty += break_penalty(self.product, edge);
            }
        }

        penalty += self.stereo_penalty(reactant_map, product_map, &product_by_map);

        -penalty
    }

    fn stereo_penalty(
        &self,
        reactant_map: &[u16],
        product_map: &[u16],
        product_by_map: &[Option<NodeIndex>],
    ) -> f64 {
        let mut penalty = 0.0;
        for r in self.reactant.atoms() {
            let r_atom = self.reactant.atom(r);
            if !r_atom.parity.is_defined() {
                continue;
            }
            let r_neighbors = self.reactant.sorted_neighbors(r);
            if r_neighbors.len() + (r_atom.hydrogen_count as usize) < 3 {
                continue;
            }
            let Some(p) = mapped_partner(reactant_map, product_by_map, r) else {
                continue;
            };
            let p_atom = self.product.atom(p);
            if !p_atom.parity.is_defined() || p_atom.hydrogen_count != r_atom.hydrogen_count {
                continue;
            }

            let r_numbers: Vec<u16> = r_neighbors
                .iter()
                .map(|nb| reactant_map[nb.index()])
                .collect();
            let p_numbers: Vec<u16> = self
                .product
                .sorted_neighbors(p)
                .iter()
                .map(|nb| product_map[nb.index()])
                .collect();
            if r_numbers.contains(&0) || !same_members(&r_numbers, &p_numbers) {
                continue;
            }

            let expected = if permutation_parity(&r_numbers, &p_numbers) {
                r_atom.parity
            } else {
                r_atom.parity.inverted()
            };
            if p_atom.parity != expected {
                penalty += STEREO_INVERSION_PENALTY;
            }
        }
        penalty
    }
}

fn atoms_by_map_no(map: &[u16]) -> Vec<Option<NodeIndex>> {
    let max = map.iter().copied().max().unwrap_or(0) as usize;
    let mut by_map = vec![None; max + 1];
    for (i, &m) in map.iter().enumerate() {
        if m != 0 {
            by_map[m as usize] = Some(NodeIndex::new(i));
        }
    }
    by_map
}

fn mapped_partner(
    reactant_map: &[u16],
    product_by_map: &[Option<NodeIndex>],
    atom: NodeIndex,
) -> Option<NodeIndex> {
    match reactant_map[atom.index()] {
        0 => None,
        m => product_by_map.get(m as usize).copied().flatten(),
    }
}

fn same_members(a: &[u16], b: &[u16]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

/// Cost of breaking or forming `edge`, cheaper at common disconnection
/// sites.
fn break_penalty(mol: &Mol<Atom, Bond>, edge: EdgeIndex) -> f64 {
    let Some((a, b)) = mol.bond_endpoints(edge) else {
        return 0.0;
    };
    let (za, zb) = (mol.atom(a).atomic_num, mol.atom(b).atomic_num);

    if za == CARBON && zb == CARBON {
        let bond = mol.bond(edge);
        return match bond.simple_type() {
            SimpleBondType::Delocalized => DELOCALIZED_CARBON_CARBON_PENALTY,
            _ => CARBON_CARBON_BASE_PENALTY + f64::from(bond.order.as_u8()) / 10.0,
        };
    }

    if (is_metal(za) && zb != CARBON) || (is_metal(zb) && za != CARBON) {
        return METAL_HETEROATOM_PENALTY;
    }

    let carbon = match (za, zb) {
        (CARBON, _) => Some(a),
        (_, CARBON) => Some(b),
        _ => None,
    };
    if carbon.is_some_and(|c| has_oxo_group(mol, c, edge)) {
        return OXO_CARBON_HETEROATOM_PENALTY;
    }

    HETEROATOM_PENALTY
}

/// `true` when `carbon` has a non-aromatic double bond to O or S other than
/// `except`.
fn has_oxo_group(mol: &Mol<Atom, Bond>, carbon: NodeIndex, except: EdgeIndex) -> bool {
    mol.bonds_of(carbon).any(|e| {
        if e == except {
            return false;
        }
        let bond = mol.bond(e);
        if bond.is_aromatic || bond.order != BondOrder::Double {
            return false;
        }
        let Some((x, y)) = mol.bond_endpoints(e) else {
            return false;
        };
        let other = if x == carbon { y } else { x };
        matches!(mol.atom(other).atomic_num, OXYGEN | SULFUR)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn score(r: &str, p: &str, rmap: &[u16], pmap: &[u16]) -> f64 {
        let r = from_smiles(r).unwrap();
        let p = from_smiles(p).unwrap();
        MappingScorer::new(&r, &p).score(rmap, pmap)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identity_scores_zero() {
        let map = [1, 2, 3, 4, 5, 6];
        assert_eq!(score("c1ccccc1", "c1ccccc1", &map, &map), 0.0);
    }

    #[test]
    fn esterification_uses_oxo_penalty() {
        // CC(=O)O.OCC >> CC(=O)OCC.O with the acid hydroxyl leaving as water
        let s = score(
            "CC(=O)O.OCC",
            "CC(=O)OCC.O",
            &[1, 2, 3, 4, 5, 6, 7],
            &[1, 2, 3, 5, 6, 7, 4],
        );
        assert!(approx(s, -3.6), "{s}");
    }

    #[test]
    fn carbon_carbon_penalty_grows_with_order() {
        assert!(approx(score("CC", "C.C", &[1, 2], &[1, 2]), -2.0));
        assert!(approx(score("C=C", "C.C", &[1, 2], &[1, 2]), -2.1));
        assert!(approx(score("C#C", "C.C", &[1, 2], &[1, 2]), -2.2));
    }

    #[test]
    fn aromatic_carbon_bond_is_expensive() {
        let map = [1, 2, 3, 4, 5, 6];
        let s = score("c1ccccc1", "C=CC=CC=C", &map, &map);
        // one ring bond is gone, five change from aromatic to fixed order
        assert!(approx(s, -(3.0 + 5.0)), "{s}");
    }

    #[test]
    fn metal_heteroatom_bond() {
        assert!(approx(score("[Na]O", "[Na].O", &[1, 2], &[1, 2]), -1.7));
        assert!(approx(score("CO", "C.O", &[1, 2], &[1, 2]), -1.9));
    }

    #[test]
    fn unmapped_atoms_count_as_broken() {
        // both sides pay for the C-O bond
        assert!(approx(score("CO", "CO", &[1, 0], &[1, 0]), -3.8));
    }

    #[test]
    fn retyped_bond_costs_one() {
        assert!(approx(score("CC=O", "C=CO", &[1, 2, 3], &[1, 2, 3]), -2.0));
    }

    #[test]
    fn silent_inversion_is_penalized() {
        let map = [1, 2, 3, 4];
        assert_eq!(score("F[C@H](Cl)Br", "F[C@H](Cl)Br", &map, &map), 0.0);
        assert!(approx(score("F[C@H](Cl)Br", "F[C@@H](Cl)Br", &map, &map), -5.0));
    }

    #[test]
    fn inversion_check_follows_map_numbers() {
        // same configuration written from the stereocenter
        let s = score(
            "F[C@H](Cl)Br",
            "[C@@H](F)(Cl)Br",
            &[1, 2, 3, 4],
            &[2, 1, 3, 4],
        );
        assert_eq!(s, 0.0);
    }

    #[test]
    fn unknown_parity_is_not_compared() {
        let map = [1, 2, 3, 4];
        assert_eq!(score("FC(Cl)Br", "F[C@@H](Cl)Br", &map, &map), 0.0);
    }
}
