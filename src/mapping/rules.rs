use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::{Atom, Parity};
use crate::bond::{Bond, BondOrder};
use crate::error::MapperError;
use crate::mol::Mol;
use crate::reaction::from_reaction_smiles;
use crate::substruct::AtomMapping;

/// What a rule does to one bond of the matched reactant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleBondEdit {
    Delete,
    /// Template bond was `~`: keep whatever is there.
    KeepUnchanged,
    Set(BondOrder),
}

/// One bond edit between two template atoms, identified by their rule map
/// numbers (`map_a < map_b`) and their reactant-template indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChemicalRuleBond {
    pub map_a: u16,
    pub map_b: u16,
    pub atom_a: NodeIndex,
    pub atom_b: NodeIndex,
    pub edit: RuleBondEdit,
}

/// A mapped reaction template with the bond edits it implies.
#[derive(Debug, Clone)]
pub struct ChemicalRule {
    name: String,
    reactant: Mol<Atom, Bond>,
    product: Mol<Atom, Bond>,
    penalty: f64,
    bonds: Vec<ChemicalRuleBond>,
}

impl ChemicalRule {
    /// Parses a mapped reaction SMILES template. Every reactant template atom
    /// needs a unique map number, and every product template atom must carry
    /// one of them.
    pub fn new(name: &str, template: &str, penalty: f64) -> Result<Self, MapperError> {
        let invalid = |reason: String| MapperError::InvalidRule {
            name: name.to_string(),
            reason,
        };

        let rxn = from_reaction_smiles(template)?;
        let reactant = rxn.merged_reactants().mol;
        let product = rxn.merged_products().mol;

        let mut reactant_by_map: HashMap<u16, NodeIndex> = HashMap::new();
        for idx in reactant.atoms() {
            let map_no = reactant.atom(idx).map_no;
            if map_no == 0 {
                return Err(invalid(format!("reactant atom {} is unmapped", idx.index())));
            }
            if reactant_by_map.insert(map_no, idx).is_some() {
                return Err(invalid(format!("map number {map_no} repeats")));
            }
        }
        let mut seen_in_product: Vec<u16> = Vec::new();
        for idx in product.atoms() {
            let map_no = product.atom(idx).map_no;
            if !reactant_by_map.contains_key(&map_no) {
                return Err(invalid(format!(
                    "product atom {} has no reactant counterpart",
                    idx.index()
                )));
            }
            if seen_in_product.contains(&map_no) {
                return Err(invalid(format!("map number {map_no} repeats")));
            }
            seen_in_product.push(map_no);
        }

        let rule_bond = |ma: u16, mb: u16, edit: RuleBondEdit| {
            let (map_a, map_b) = (ma.min(mb), ma.max(mb));
            ChemicalRuleBond {
                map_a,
                map_b,
                atom_a: reactant_by_map[&map_a],
                atom_b: reactant_by_map[&map_b],
                edit,
            }
        };

        let mut bonds = Vec::new();
        for e in product.bonds() {
            let Some((a, b)) = product.bond_endpoints(e) else {
                continue;
            };
            let bond = product.bond(e);
            let edit = if bond.any_order {
                RuleBondEdit::KeepUnchanged
            } else {
                RuleBondEdit::Set(bond.order)
            };
            bonds.push(rule_bond(
                product.atom(a).map_no,
                product.atom(b).map_no,
                edit,
            ));
        }
        let covered: Vec<(u16, u16)> = bonds.iter().map(|b| (b.map_a, b.map_b)).collect();
        for e in reactant.bonds() {
            let Some((a, b)) = reactant.bond_endpoints(e) else {
                continue;
            };
            let (ma, mb) = (reactant.atom(a).map_no, reactant.atom(b).map_no);
            if !covered.contains(&(ma.min(mb), ma.max(mb))) {
                bonds.push(rule_bond(ma, mb, RuleBondEdit::Delete));
            }
        }
        bonds.sort();
        bonds.dedup_by_key(|b| (b.map_a, b.map_b));

        Ok(Self {
            name: name.to_string(),
            reactant,
            product,
            penalty,
            bonds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn reactant_template(&self) -> &Mol<Atom, Bond> {
        &self.reactant
    }

    pub fn product_template(&self) -> &Mol<Atom, Bond> {
        &self.product
    }

    pub fn bonds(&self) -> &[ChemicalRuleBond] {
        &self.bonds
    }

    /// The bond edits resolved onto target atoms through `m`, sorted. Two
    /// matches with equal edit lists produce the same rewritten reactant.
    pub fn target_edits(&self, m: &AtomMapping) -> Vec<(NodeIndex, NodeIndex, RuleBondEdit)> {
        let mut target_of = vec![None; self.reactant.atom_count()];
        for &(q, t) in m {
            if let Some(slot) = target_of.get_mut(q.index()) {
                *slot = Some(t);
            }
        }
        let mut edits: Vec<_> = self
            .bonds
            .iter()
            .filter_map(|b| {
                let ta = target_of[b.atom_a.index()]?;
                let tb = target_of[b.atom_b.index()]?;
                Some((ta.min(tb), ta.max(tb), b.edit))
            })
            .collect();
        edits.sort();
        edits
    }

    /// Rewrites `target` per the rule at match `m`. Atoms whose bonds change
    /// lose their stereo configuration.
    pub fn apply(&self, target: &mut Mol<Atom, Bond>, m: &AtomMapping) {
        let mut doomed: Vec<EdgeIndex> = Vec::new();
        let mut touched: Vec<NodeIndex> = Vec::new();
        for (a, b, edit) in self.target_edits(m) {
            match (target.bond_between(a, b), edit) {
                (None, RuleBondEdit::Set(order)) => {
                    target.add_bond(a, b, Bond::with_order(order));
                    touched.extend([a, b]);
                }
                (Some(e), RuleBondEdit::Delete) => {
                    doomed.push(e);
                    touched.extend([a, b]);
                }
                (Some(e), RuleBondEdit::Set(order)) => {
                    let bond = target.bond_mut(e);
                    if bond.order != order || bond.is_aromatic || bond.is_delocalized {
                        *bond = Bond::with_order(order);
                        touched.extend([a, b]);
                    }
                }
                (None, _) | (Some(_), RuleBondEdit::KeepUnchanged) => {}
            }
        }

        // swap-removal: highest index first keeps the rest valid
        doomed.sort_unstable_by(|x, y| y.cmp(x));
        for e in doomed {
            target.remove_bond(e);
        }

        for atom in touched {
            let a = target.atom_mut(atom);
            if a.parity.is_defined() {
                a.parity = Parity::Unknown;
            }
        }
    }
}

/// The rules tried on every reaction, built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<ChemicalRule>,
}

impl RuleCatalog {
    pub fn new(rules: Vec<ChemicalRule>) -> Self {
        Self { rules }
    }

    /// Pericyclic and carbonyl rules with their penalties.
    pub fn standard() -> Result<Self, MapperError> {
        let rules = [
            (
                "diels-alder",
                "[C:1]=[C:2][C:3]=[C:4].[C:5]=[C:6]>>[C:1]1[C:2]=[C:3][C:4][C:6][C:5]1",
                3.5,
            ),
            (
                "retro-diels-alder",
                "[C:1]1[C:2]=[C:3][C:4][C:6][C:5]1>>[C:1]=[C:2][C:3]=[C:4].[C:5]=[C:6]",
                3.5,
            ),
            (
                "cope",
                "[C:1]=[C:2][C:3][C:4][C:5]=[C:6]>>[C:3]=[C:2][C:1][C:6][C:5]=[C:4]",
                3.5,
            ),
            (
                "claisen",
                "[C:1]=[C:2][O:3][C:4][C:5]=[C:6]>>[O:3]=[C:2][C:1][C:6][C:5]=[C:4]",
                3.5,
            ),
            ("oxirane-opening", "[C:1]1[O:2][C:3]1>>[O:2][C:1][C:3]", 2.0),
            (
                "wittig",
                "[C:1]=[O:2].[C:3]=[P:4]>>[C:1]=[C:3].[O:2]=[P:4]",
                3.0,
            ),
        ];
        let rules = rules
            .into_iter()
            .map(|(name, template, penalty)| ChemicalRule::new(name, template, penalty))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ChemicalRule] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&ChemicalRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;
    use crate::substruct::get_template_matches;

    fn bond_set(mol: &Mol<Atom, Bond>) -> Vec<(usize, usize, u8)> {
        let mut set: Vec<_> = mol
            .bonds()
            .filter_map(|e| {
                let (a, b) = mol.bond_endpoints(e)?;
                let (a, b) = (a.index().min(b.index()), a.index().max(b.index()));
                Some((a, b, mol.bond(e).order.as_u8()))
            })
            .collect();
        set.sort();
        set
    }

    #[test]
    fn standard_catalog_builds() {
        let catalog = RuleCatalog::standard().unwrap();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.get("diels-alder").unwrap().penalty(), 3.5);
    }

    #[test]
    fn diels_alder_bonds() {
        let catalog = RuleCatalog::standard().unwrap();
        let rule = catalog.get("diels-alder").unwrap();
        let edits: Vec<_> = rule.bonds().iter().map(|b| (b.map_a, b.map_b, b.edit)).collect();
        use RuleBondEdit::Set;
        assert_eq!(
            edits,
            vec![
                (1, 2, Set(BondOrder::Single)),
                (1, 5, Set(BondOrder::Single)),
                (2, 3, Set(BondOrder::Double)),
                (3, 4, Set(BondOrder::Single)),
                (4, 6, Set(BondOrder::Single)),
                (5, 6, Set(BondOrder::Single)),
            ]
        );
    }

    #[test]
    fn uncovered_reactant_bonds_are_deleted() {
        let catalog = RuleCatalog::standard().unwrap();
        let wittig = catalog.get("wittig").unwrap();
        let deletes: Vec<_> = wittig
            .bonds()
            .iter()
            .filter(|b| b.edit == RuleBondEdit::Delete)
            .map(|b| (b.map_a, b.map_b))
            .collect();
        assert_eq!(deletes, vec![(1, 2), (3, 4)]);
    }

    #[test]
    fn wildcard_product_bond_is_kept() {
        let rule = ChemicalRule::new("t", "[C:1]~[O:2].[N:3]>>[C:1](~[O:2])[N:3]", 1.0).unwrap();
        let edits: Vec<_> = rule.bonds().iter().map(|b| (b.map_a, b.map_b, b.edit)).collect();
        assert_eq!(
            edits,
            vec![
                (1, 2, RuleBondEdit::KeepUnchanged),
                (1, 3, RuleBondEdit::Set(BondOrder::Single)),
            ]
        );
    }

    #[test]
    fn unmapped_template_atom_is_an_error() {
        let err = ChemicalRule::new("bad", "[C:1]=C>>[C:1]C", 1.0).unwrap_err();
        assert!(matches!(err, MapperError::InvalidRule { .. }));
        let err = ChemicalRule::new("bad", "[C:1]>>[C:1][C:2]", 1.0).unwrap_err();
        assert!(err.to_string().contains("no reactant counterpart"));
    }

    #[test]
    fn diels_alder_closes_ring() {
        let catalog = RuleCatalog::standard().unwrap();
        let rule = catalog.get("diels-alder").unwrap();
        let mut target = from_smiles("C=CC=C.C=C").unwrap();
        let matches = get_template_matches(&target, rule.reactant_template(), 512);
        assert!(!matches.is_empty());
        rule.apply(&mut target, &matches[0]);

        assert_eq!(target.bond_count(), 6);
        let doubles = target
            .bonds()
            .filter(|&e| target.bond(e).order == BondOrder::Double)
            .count();
        assert_eq!(doubles, 1);
        assert!(target.atoms().all(|a| target.degree(a) == 2));
    }

    #[test]
    fn retro_diels_alder_deletes_bonds() {
        let catalog = RuleCatalog::standard().unwrap();
        let rule = catalog.get("retro-diels-alder").unwrap();
        let mut target = from_smiles("C1=CCCCC1").unwrap();
        let matches = get_template_matches(&target, rule.reactant_template(), 512);
        assert!(!matches.is_empty());
        rule.apply(&mut target, &matches[0]);
        assert_eq!(target.bond_count(), 4);
        let doubles = target
            .bonds()
            .filter(|&e| target.bond(e).order == BondOrder::Double)
            .count();
        assert_eq!(doubles, 3);
    }

    #[test]
    fn application_is_repeatable() {
        let catalog = RuleCatalog::standard().unwrap();
        let rule = catalog.get("diels-alder").unwrap();
        let original = from_smiles("C=CC=C.C=C").unwrap();
        let matches = get_template_matches(&original, rule.reactant_template(), 512);
        for m in &matches {
            let mut first = original.clone();
            rule.apply(&mut first, m);
            let mut second = original.clone();
            rule.apply(&mut second, m);
            assert_eq!(bond_set(&first), bond_set(&second));
        }
    }

    #[test]
    fn touched_stereocenters_become_unknown() {
        let rule = ChemicalRule::new("cut", "[C:1][Br:2]>>[C:1].[Br:2]", 1.0).unwrap();
        let mut target = from_smiles("F[C@H](Cl)Br").unwrap();
        let matches = get_template_matches(&target, rule.reactant_template(), 8);
        assert_eq!(matches.len(), 1);
        rule.apply(&mut target, &matches[0]);
        assert_eq!(target.bond_count(), 2);
        assert_eq!(target.atom(NodeIndex::new(1)).parity, Parity::Unknown);
    }

    #[test]
    fn equal_edit_lists_for_symmetric_matches() {
        let rule = ChemicalRule::new("cut", "[C:1][C:2]>>[C:1].[C:2]", 1.0).unwrap();
        let target = from_smiles("CC").unwrap();
        let matches = get_template_matches(&target, rule.reactant_template(), 8);
        assert_eq!(matches.len(), 2);
        assert_eq!(rule.target_edits(&matches[0]), rule.target_edits(&matches[1]));
    }
}
