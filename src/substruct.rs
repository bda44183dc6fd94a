use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;

/// `(query atom, target atom)` pairs in ascending query-atom order.
pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

pub fn has_substruct_match_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(&A1, &A2) -> bool,
    bond_match: impl Fn(&B1, &B2) -> bool,
) -> bool {
    !Vf2::new(target, query, atom_match, bond_match)
        .find_up_to(1)
        .is_empty()
}

/// All embeddings, stopping once `limit` have been found.
pub fn get_substruct_matches_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(&A1, &A2) -> bool,
    bond_match: impl Fn(&B1, &B2) -> bool,
    limit: usize,
) -> Vec<AtomMapping> {
    Vf2::new(target, query, atom_match, bond_match).find_up_to(limit)
}

/// Reaction-template atom semantics: the element must agree, and the charge
/// only when the template atom carries one.
pub fn template_atom_match(target: &Atom, template: &Atom) -> bool {
    target.atomic_num == template.atomic_num
        && (template.formal_charge == 0 || target.formal_charge == template.formal_charge)
}

/// Reaction-template bond semantics: `~` matches anything, otherwise order
/// and aromaticity must agree.
pub fn template_bond_match(target: &Bond, template: &Bond) -> bool {
    if template.any_order {
        return true;
    }
    target.is_aromatic == template.is_aromatic
        && (target.is_aromatic || target.order == template.order)
}

pub fn has_template_match(target: &Mol<Atom, Bond>, template: &Mol<Atom, Bond>) -> bool {
    has_substruct_match_with(target, template, template_atom_match, template_bond_match)
}

pub fn get_template_matches(
    target: &Mol<Atom, Bond>,
    template: &Mol<Atom, Bond>,
    limit: usize,
) -> Vec<AtomMapping> {
    get_substruct_matches_with(
        target,
        template,
        template_atom_match,
        template_bond_match,
        limit,
    )
}

struct Vf2<'a, A1, B1, A2, B2, FA, FB> {
    target: &'a Mol<A1, B1>,
    query: &'a Mol<A2, B2>,
    atom_match: FA,
    bond_match: FB,
    query_order: Vec<NodeIndex>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a, A1, B1, A2, B2, FA, FB> Vf2<'a, A1, B1, A2, B2, FA, FB>
where
    FA: Fn(&A1, &A2) -> bool,
    FB: Fn(&B1, &B2) -> bool,
{
    fn new(
        target: &'a Mol<A1, B1>,
        query: &'a Mol<A2, B2>,
        atom_match: FA,
        bond_match: FB,
    ) -> Self {
        Self {
            target,
            query,
            atom_match,
            bond_match,
            query_order: connected_order(query),
            query_map: vec![None; query.atom_count()],
            target_used: vec![false; target.atom_count()],
        }
    }

    fn find_up_to(&mut self, limit: usize) -> Vec<AtomMapping> {
        let mut results = Vec::new();
        if limit > 0 && self.query_order.len() <= self.target_used.len() {
            self.recurse(0, &mut results, limit);
        }
        results
    }

    fn recurse(&mut self, depth: usize, results: &mut Vec<AtomMapping>, limit: usize) {
        if depth == self.query_order.len() {
            let mapping = self
                .query
                .atoms()
                .filter_map(|qn| self.query_map[qn.index()].map(|tn| (qn, tn)))
                .collect();
            results.push(mapping);
            return;
        }

        let query_node = self.query_order[depth];

        for t_idx in 0..self.target_used.len() {
            if self.target_used[t_idx] {
                continue;
            }

            let target_node = NodeIndex::new(t_idx);

            if !self.is_feasible(query_node, target_node) {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[t_idx] = true;

            self.recurse(depth + 1, results, limit);

            self.query_map[query_node.index()] = None;
            self.target_used[t_idx] = false;

            if results.len() >= limit {
                return;
            }
        }
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if !(self.atom_match)(self.target.atom(target_node), self.query.atom(query_node)) {
            return false;
        }
        if self.target.degree(target_node) < self.query.degree(query_node) {
            return false;
        }

        for q_neighbor in self.query.neighbors(query_node) {
            if let Some(t_mapped) = self.query_map[q_neighbor.index()] {
                let Some(q_bond) = self.query.bond_between(query_node, q_neighbor) else {
                    return false;
                };
                match self.target.bond_between(target_node, t_mapped) {
                    Some(t_bond) => {
                        if !(self.bond_match)(self.target.bond(t_bond), self.query.bond(q_bond)) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }

        true
    }
}

/// Query atoms ordered so that each one after the first of its fragment is
/// bonded to an earlier one, which keeps the search pruned.
fn connected_order<A, B>(query: &Mol<A, B>) -> Vec<NodeIndex> {
    let mut order = Vec::with_capacity(query.atom_count());
    let mut seen = vec![false; query.atom_count()];
    for start in query.atoms() {
        if seen[start.index()] {
            continue;
        }
        seen[start.index()] = true;
        let first = order.len();
        order.push(start);
        let mut i = first;
        while i < order.len() {
            let current = order[i];
            for nb in query.sorted_neighbors(current) {
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    order.push(nb);
                }
            }
            i += 1;
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn mol(smiles: &str) -> Mol<Atom, Bond> {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    #[test]
    fn ethanol_contains_cc() {
        let target = mol("CCO");
        let query = mol("CC");
        assert!(has_template_match(&target, &query));
        assert_eq!(get_template_matches(&target, &query, 10).len(), 2);
    }

    #[test]
    fn methane_does_not_contain_cc() {
        assert!(!has_template_match(&mol("C"), &mol("CC")));
    }

    #[test]
    fn limit_caps_results() {
        let target = mol("C1CCCCC1");
        let query = mol("CC");
        assert_eq!(get_template_matches(&target, &query, 100).len(), 12);
        assert_eq!(get_template_matches(&target, &query, 5).len(), 5);
    }

    #[test]
    fn bond_order_must_agree() {
        assert!(!has_template_match(&mol("CCC"), &mol("C=C")));
        assert!(has_template_match(&mol("CC=C"), &mol("C=C")));
    }

    #[test]
    fn wildcard_bond_matches_any_order() {
        assert!(has_template_match(&mol("CC#N"), &mol("C~N")));
        assert!(has_template_match(&mol("CN"), &mol("C~N")));
    }

    #[test]
    fn aliphatic_template_skips_aromatic_bonds() {
        assert!(!has_template_match(&mol("c1ccccc1"), &mol("CC")));
        assert!(has_template_match(&mol("c1ccccc1"), &mol("c:c")));
    }

    #[test]
    fn charge_only_checked_when_template_charged() {
        assert!(has_template_match(&mol("C[O-]"), &mol("CO")));
        assert!(!has_template_match(&mol("CO"), &mol("C[O-]")));
    }

    #[test]
    fn disconnected_template() {
        let target = mol("C=CC=C.C=C");
        let template = mol("C=CC=C.C=C");
        let matches = get_template_matches(&target, &template, 512);
        assert!(!matches.is_empty());
        for m in &matches {
            assert_eq!(m.len(), 6);
            assert!(m.windows(2).all(|w| w[0].0 < w[1].0));
        }
    }
}
