use indexmap::IndexMap;
use log::debug;
use petgraph::graph::NodeIndex;

use super::state::{AtomState, MapState};
use super::MappingContext;

/// Unmapped atoms of one element and isotope on both sides.
#[derive(Debug, Clone, Default)]
struct AtomClass {
    reactant_atoms: Vec<NodeIndex>,
    product_atoms: Vec<NodeIndex>,
}

impl AtomClass {
    fn slots(&self) -> usize {
        self.reactant_atoms.len().max(self.product_atoms.len())
    }
}

/// Permutation state of a class that needs searching. The larger side
/// owns the slots and `keys[i]` is the atom of the smaller side offered to
/// slot `i`; keys at or past the smaller side's count stand for "no partner".
#[derive(Debug, Clone)]
struct ClassSearch {
    class: AtomClass,
    /// Slots are reactant atoms (else product atoms).
    reactant_slots: bool,
    keys: Vec<usize>,
    exhaustive: bool,
}

impl ClassSearch {
    fn new(class: AtomClass, full_permutation_limit: usize) -> Self {
        let slots = class.slots();
        let reactant_slots = class.reactant_atoms.len() >= class.product_atoms.len();
        let mut search = Self {
            class,
            reactant_slots,
            keys: vec![0; slots],
            exhaustive: slots <= full_permutation_limit,
        };
        search.reset();
        search
    }

    fn partners(&self) -> usize {
        self.class.reactant_atoms.len().min(self.class.product_atoms.len())
    }

    /// Distinct arrangements of the padded partner list: slots!/(slots-partners)!.
    fn permutation_count(&self) -> usize {
        if !self.exhaustive {
            return 1;
        }
        let slots = self.class.slots();
        ((slots - self.partners() + 1)..=slots).product()
    }

    fn reset(&mut self) {
        let partners = self.partners();
        for (i, k) in self.keys.iter_mut().enumerate() {
            *k = i.min(partners);
        }
    }

    fn pairs(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        let (slot_atoms, partner_atoms) = if self.reactant_slots {
            (&self.class.reactant_atoms, &self.class.product_atoms)
        } else {
            (&self.class.product_atoms, &self.class.reactant_atoms)
        };
        slot_atoms
            .iter()
            .zip(&self.keys)
            .filter_map(move |(&slot, &k)| {
                let partner = *partner_atoms.get(k)?;
                Some(if self.reactant_slots {
                    (slot, partner)
                } else {
                    (partner, slot)
                })
            })
    }
}

/// Lexicographic successor of `keys`; `false` (and `keys` untouched) after
/// the last arrangement. Repeated keys yield each distinct arrangement once.
fn next_permutation(keys: &mut [usize]) -> bool {
    let Some(i) = keys.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(j) = keys.iter().rposition(|&k| k > keys[i]) else {
        return false;
    };
    keys.swap(i, j);
    keys[i + 1..].reverse();
    true
}

/// Pairs atoms that graph growth left unmapped, trying all assignments
/// within each element class under a global permutation ceiling.
pub struct ReactionCenterMapper<'c, 'a> {
    ctx: &'c MappingContext<'a>,
}

impl<'c, 'a> ReactionCenterMapper<'c, 'a> {
    pub fn new(ctx: &'c MappingContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &'c MappingContext<'a> {
        self.ctx
    }

    /// Maps what it can and returns the score of the chosen joint
    /// permutation, or 0 when no permutation search took place.
    pub fn complete(&self, state: &mut MapState) -> f64 {
        let ctx = self.ctx;
        if state.is_exhausted() {
            return 0.0;
        }
        let mut hard = Vec::new();
        for class in self.classes(state) {
            if !self.resolve_trivially(&class, state) {
                hard.push(ClassSearch::new(class, ctx.config.full_permutation_limit));
            }
        }
        if hard.is_empty() {
            return 0.0;
        }

        let total = hard
            .iter()
            .try_fold(1usize, |acc, c| acc.checked_mul(c.permutation_count()));
        match total {
            Some(total) if total <= ctx.config.max_center_permutations => {
                debug!("reaction center: {} classes, {total} permutations", hard.len());
            }
            _ => {
                debug!(
                    "reaction center: permutation count exceeds {}, skipped",
                    ctx.config.max_center_permutations
                );
                return 0.0;
            }
        }

        let base_partner = self.mapped_partners(state);
        let mut best_score = 0;
        let mut best_keys: Vec<Vec<usize>> = Vec::new();
        loop {
            let score = self.joint_score(&hard, &base_partner);
            if score > best_score {
                best_score = score;
                best_keys = hard.iter().map(|c| c.keys.clone()).collect();
            }
            if !advance_odometer(&mut hard) {
                break;
            }
        }

        for (search, keys) in hard.iter_mut().zip(best_keys) {
            search.keys = keys;
            for (r, p) in search.pairs() {
                state.assign(r, p);
            }
        }
        best_score as f64
    }

    fn classes(&self, state: &MapState) -> Vec<AtomClass> {
        let ctx = self.ctx;
        let mut classes: IndexMap<(u8, u16), AtomClass> = IndexMap::new();
        for r in ctx.reactant.atoms() {
            if state.is_reactant_unmapped(r) {
                let a = ctx.reactant.atom(r);
                classes
                    .entry((a.atomic_num, a.isotope))
                    .or_default()
                    .reactant_atoms
                    .push(r);
            }
        }
        for p in ctx.product.atoms() {
            if state.is_product_unmapped(p) {
                let a = ctx.product.atom(p);
                if let Some(class) = classes.get_mut(&(a.atomic_num, a.isotope)) {
                    class.product_atoms.push(p);
                }
            }
        }
        classes
            .into_values()
            .filter(|c| !c.product_atoms.is_empty())
            .collect()
    }

    /// Maps singleton classes, and classes whose smaller side consists of
    /// isolated atoms of one charge, in list order.
    fn resolve_trivially(&self, class: &AtomClass, state: &mut MapState) -> bool {
        let ctx = self.ctx;
        let (r, p) = (&class.reactant_atoms, &class.product_atoms);
        if r.len() == 1 && p.len() == 1 {
            state.assign(r[0], p[0]);
            return true;
        }

        let isolated_alike = if r.len() <= p.len() {
            let charge = ctx.reactant.atom(r[0]).formal_charge;
            r.iter().all(|&a| {
                ctx.reactant.degree(a) == 0 && ctx.reactant.atom(a).formal_charge == charge
            })
        } else {
            let charge = ctx.product.atom(p[0]).formal_charge;
            p.iter().all(|&a| {
                ctx.product.degree(a) == 0 && ctx.product.atom(a).formal_charge == charge
            })
        };
        if !isolated_alike {
            return false;
        }
        for (&ra, &pa) in r.iter().zip(p) {
            state.assign(ra, pa);
        }
        true
    }

    /// Product partner of every reactant atom mapped so far.
    fn mapped_partners(&self, state: &MapState) -> Vec<Option<NodeIndex>> {
        let by_map = state.product_atoms_by_map_no();
        self.ctx
            .reactant
            .atoms()
            .map(|r| match state.reactant(r) {
                AtomState::Mapped(m) => by_map.get(m as usize).copied().flatten(),
                _ => None,
            })
            .collect()
    }

    /// 1 plus the reactant bonds at center atoms that the assignment carries
    /// over to existing product bonds.
    fn joint_score(&self, hard: &[ClassSearch], base_partner: &[Option<NodeIndex>]) -> usize {
        let ctx = self.ctx;
        let mut partner = base_partner.to_vec();
        let mut in_center = vec![false; partner.len()];
        for (r, p) in hard.iter().flat_map(|c| c.pairs()) {
            partner[r.index()] = Some(p);
            in_center[r.index()] = true;
        }

        let mut score = 1;
        for edge in ctx.reactant.bonds() {
            let Some((a, b)) = ctx.reactant.bond_endpoints(edge) else {
                continue;
            };
            if !in_center[a.index()] && !in_center[b.index()] {
                continue;
            }
            if let (Some(pa), Some(pb)) = (partner[a.index()], partner[b.index()]) {
                if ctx.product.bond_between(pa, pb).is_some() {
                    score += 1;
                }
            }
        }
        score
    }
}

/// Steps the joint permutation, last class fastest. Returns `false` after
/// the final combination.
fn advance_odometer(hard: &mut [ClassSearch]) -> bool {
    for search in hard.iter_mut().rev() {
        if search.exhaustive && next_permutation(&mut search.keys) {
            return true;
        }
        search.reset();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::reaction::from_reaction_smiles;
    use crate::{Atom, Bond, Mol};

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn merged(smiles: &str) -> (Mol<Atom, Bond>, Mol<Atom, Bond>) {
        let rxn = from_reaction_smiles(smiles).unwrap();
        (rxn.merged_reactants().mol, rxn.merged_products().mol)
    }

    #[test]
    fn next_permutation_skips_repeats() {
        let mut keys = vec![0, 1, 2, 2];
        let mut count = 1;
        while next_permutation(&mut keys) {
            count += 1;
        }
        // 4! / 2!
        assert_eq!(count, 12);
        assert_eq!(keys, vec![2, 2, 1, 0]);
    }

    #[test]
    fn permutation_count_with_padding() {
        let class = AtomClass {
            reactant_atoms: vec![n(0), n(1), n(2)],
            product_atoms: vec![n(0)],
        };
        let search = ClassSearch::new(class, 6);
        assert_eq!(search.keys, vec![0, 1, 1]);
        assert_eq!(search.permutation_count(), 3);
    }

    #[test]
    fn larger_product_side_is_counted_per_reactant() {
        let class = AtomClass {
            reactant_atoms: vec![n(0)],
            product_atoms: (0..6).map(n).collect(),
        };
        let mut search = ClassSearch::new(class, 6);
        assert_eq!(search.keys, vec![0, 1, 1, 1, 1, 1]);
        assert_eq!(search.permutation_count(), 6);

        let mut partners = vec![search.pairs().collect::<Vec<_>>()];
        while next_permutation(&mut search.keys) {
            partners.push(search.pairs().collect());
        }
        assert_eq!(partners.len(), 6);
        for (i, pairs) in partners.iter().enumerate() {
            assert_eq!(pairs, &vec![(n(0), n(i))]);
        }
    }

    #[test]
    fn bonded_atoms_pair_with_isolated_ones() {
        let (r, p) = merged("NO>>N.N.N.N.N.N.O.O.O.O.O.O");
        let config = MapperConfig::default();
        let ctx = MappingContext::new(&r, &p, &config);
        let mut state = MapState::new(2, 12);
        let score = ReactionCenterMapper::new(&ctx).complete(&mut state);
        // 6 x 6 joint permutations, all without carried-over bonds
        assert_eq!(score, 1.0);
        assert_eq!(state.mapped_count(), 2);
        assert_eq!(state.reactant(n(0)), state.product(n(0)));
        assert_eq!(state.reactant(n(1)), state.product(n(6)));
    }

    #[test]
    fn large_classes_only_try_identity() {
        let class = AtomClass {
            reactant_atoms: (0..7).map(n).collect(),
            product_atoms: (0..7).map(n).collect(),
        };
        assert_eq!(ClassSearch::new(class, 6).permutation_count(), 1);
    }

    #[test]
    fn singletons_map_directly() {
        let (r, p) = merged("CBr>>CO");
        let config = MapperConfig::default();
        let ctx = MappingContext::new(&r, &p, &config);
        let mut state = MapState::new(2, 2);
        assert_eq!(ReactionCenterMapper::new(&ctx).complete(&mut state), 0.0);
        assert_eq!(state.reactant(n(0)), state.product(n(0)));
        assert!(state.is_reactant_unmapped(n(1)));
    }

    #[test]
    fn isolated_atoms_map_in_order() {
        let (r, p) = merged("C.C>>CC");
        let config = MapperConfig::default();
        let ctx = MappingContext::new(&r, &p, &config);
        let mut state = MapState::new(2, 2);
        ReactionCenterMapper::new(&ctx).complete(&mut state);
        assert_eq!(state.reactant_map_numbers(), vec![1, 2]);
        assert_eq!(state.product_map_numbers(), vec![1, 2]);
    }

    #[test]
    fn best_permutation_keeps_connectivity() {
        let (r, p) = merged("CCO>>OCC");
        let config = MapperConfig::default();
        let ctx = MappingContext::new(&r, &p, &config);
        let mut state = MapState::new(3, 3);
        let score = ReactionCenterMapper::new(&ctx).complete(&mut state);
        assert_eq!(score, 3.0);
        assert_eq!(state.reactant(n(2)), state.product(n(0)));
        assert_eq!(state.reactant(n(1)), state.product(n(1)));
        assert_eq!(state.reactant(n(0)), state.product(n(2)));
    }

    #[test]
    fn permutation_ceiling_leaves_atoms_unmapped() {
        let (r, p) = merged("CCCCCC.OOOOOO>>C1CCCCC1.O1OOOOO1");
        let config = MapperConfig::default();
        let ctx = MappingContext::new(&r, &p, &config);
        let mut state = MapState::new(12, 12);
        assert_eq!(ReactionCenterMapper::new(&ctx).complete(&mut state), 0.0);
        assert_eq!(state.mapped_count(), 0);
    }

    #[test]
    fn ceiling_is_configurable() {
        let (r, p) = merged("CCCC.OOOO>>C1CCC1.O1OOO1");
        let mut config = MapperConfig {
            max_center_permutations: 24 * 24 - 1,
            ..MapperConfig::default()
        };
        {
            let ctx = MappingContext::new(&r, &p, &config);
            let mut state = MapState::new(8, 8);
            assert_eq!(ReactionCenterMapper::new(&ctx).complete(&mut state), 0.0);
        }

        config.max_center_permutations = 24 * 24;
        let ctx = MappingContext::new(&r, &p, &config);
        let mut state = MapState::new(8, 8);
        let score = ReactionCenterMapper::new(&ctx).complete(&mut state);
        // all three chain bonds survive per element
        assert_eq!(score, 7.0);
        assert_eq!(state.mapped_count(), 8);
    }
}
