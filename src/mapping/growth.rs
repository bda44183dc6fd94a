use log::trace;
use petgraph::graph::NodeIndex;

use super::environment::{matching_depth, ExitEnvironments};
use super::root_pairs::RootAtomPair;
use super::state::{AtomState, MapState};
use super::MappingContext;
use crate::atom::{Atom, Parity};
use crate::bond::{Bond, BondOrder};
use crate::element::{CARBON, NITROGEN, OXYGEN};
use crate::mol::{permutation_parity, Mol};

const DEPTH_WEIGHT: u32 = 256;
const PARITY_BONUS: u32 = 1;
const RING_BONUS: u32 = 2;
const BOND_CHANGE_SCORE: u32 = 3;

/// Extends a seed pair into a mapped region by repeatedly pairing the most
/// similar unmapped neighbors.
pub struct GrowthMapper<'c, 'a> {
    ctx: &'c MappingContext<'a>,
    reactant_exits: ExitEnvironments<'a>,
    product_exits: ExitEnvironments<'a>,
}

impl<'c, 'a> GrowthMapper<'c, 'a> {
    pub fn new(ctx: &'c MappingContext<'a>) -> Self {
        Self {
            ctx,
            reactant_exits: ExitEnvironments::new(ctx.reactant, ctx.config.max_radius),
            product_exits: ExitEnvironments::new(ctx.product, ctx.config.max_radius),
        }
    }

    /// Maps the seed and grows breadth-first from it. Returns the number of
    /// pairs mapped, seed included; 0 when the seed was already taken or no
    /// map number is left.
    pub fn grow_from(&mut self, pair: &RootAtomPair, state: &mut MapState) -> usize {
        let (root_r, root_p) = (pair.reactant_atom, pair.product_atom);
        if !state.is_reactant_unmapped(root_r) || !state.is_product_unmapped(root_p) {
            return 0;
        }
        if state.assign(root_r, root_p).is_none() {
            return 0;
        }

        let mut reactant_queue = vec![root_r];
        let mut product_queue = vec![root_p];
        let mut pos = 0;
        while pos < reactant_queue.len() {
            let (ra, pa) = (reactant_queue[pos], product_queue[pos]);
            while let Some((rn, pn, score)) = self.best_candidate(ra, pa, state) {
                let Some(map_no) = state.assign(rn, pn) else {
                    return reactant_queue.len();
                };
                trace!(
                    "grew {} -> {} as {map_no} (similarity {score})",
                    rn.index(),
                    pn.index()
                );
                reactant_queue.push(rn);
                product_queue.push(pn);
            }
            pos += 1;
        }
        reactant_queue.len()
    }

    /// Highest-scoring unmapped neighbor pair of `ra`/`pa`; the first one
    /// found wins ties.
    fn best_candidate(
        &mut self,
        ra: NodeIndex,
        pa: NodeIndex,
        state: &MapState,
    ) -> Option<(NodeIndex, NodeIndex, u32)> {
        let ctx = self.ctx;
        let mut best: Option<(NodeIndex, NodeIndex, u32)> = None;
        for rn in ctx.reactant.sorted_neighbors(ra) {
            if !state.is_reactant_unmapped(rn) {
                continue;
            }
            for pn in ctx.product.sorted_neighbors(pa) {
                if !state.is_product_unmapped(pn)
                    || ctx.reactant.atom(rn).atomic_num != ctx.product.atom(pn).atomic_num
                {
                    continue;
                }
                let score = self.similarity(ra, rn, pa, pn, state);
                if score > 0 && best.map_or(true, |(_, _, b)| score > b) {
                    best = Some((rn, pn, score));
                }
            }
        }
        best
    }

    fn similarity(
        &mut self,
        ra: NodeIndex,
        rn: NodeIndex,
        pa: NodeIndex,
        pn: NodeIndex,
        state: &MapState,
    ) -> u32 {
        let ctx = self.ctx;
        let depth = matching_depth(
            self.reactant_exits.get(rn, ra),
            self.product_exits.get(pn, pa),
        );
        let full_depth = depth >= ctx.config.max_radius;

        if !full_depth && !passes_basic_rules(ctx.reactant, ra, rn, ctx.product, pa, pn) {
            return 0;
        }

        let (Some(r_bond), Some(p_bond)) = (
            ctx.reactant.bond_between(ra, rn),
            ctx.product.bond_between(pa, pn),
        ) else {
            return 0;
        };
        if ctx.reactant.bond(r_bond).simple_type() != ctx.product.bond(p_bond).simple_type() {
            return if full_depth { BOND_CHANGE_SCORE } else { 0 };
        }

        let mut score = DEPTH_WEIGHT * depth as u32;
        let max_radius = ctx.config.max_radius;
        let r_parity = local_parity(ctx.reactant, rn, |nb| match state.reactant(nb) {
            AtomState::Mapped(m) => (0, u64::from(m)),
            _ => (1, ctx.reactant_envs.descriptor(nb, max_radius)),
        });
        let p_parity = local_parity(ctx.product, pn, |nb| match state.product(nb) {
            AtomState::Mapped(m) => (0, u64::from(m)),
            _ => (1, ctx.product_envs.descriptor(nb, max_radius)),
        });
        if let (Some(r), Some(p)) = (r_parity, p_parity) {
            if r == p {
                score += PARITY_BONUS;
            }
        }
        if ctx.reactant_rings.is_ring_bond(r_bond) == ctx.product_rings.is_ring_bond(p_bond) {
            score += RING_BONUS;
        }
        score
    }
}

/// Stereo parity of `atom` relative to its neighbors ordered by `key`, an
/// implicit hydrogen last: `Some(true)` for odd. Mapped neighbors keyed by
/// map number and the rest by environment descriptor order the same way on
/// both sides. `None` unless `atom` is a stereocenter with at least three
/// substituents that `key` tells apart.
fn local_parity(
    mol: &Mol<Atom, Bond>,
    atom: NodeIndex,
    key: impl Fn(NodeIndex) -> (u8, u64),
) -> Option<bool> {
    let a = mol.atom(atom);
    if !a.parity.is_defined() || a.hydrogen_count > 1 {
        return None;
    }
    let mut index_order: Vec<Option<NodeIndex>> =
        mol.sorted_neighbors(atom).into_iter().map(Some).collect();
    if a.hydrogen_count == 1 {
        index_order.push(None);
    }
    if index_order.len() < 3 {
        return None;
    }

    let key_of = |slot: &Option<NodeIndex>| slot.map_or((u8::MAX, 0), &key);
    let mut ordered = index_order.clone();
    ordered.sort_by_key(key_of);
    if ordered.windows(2).any(|w| key_of(&w[0]) == key_of(&w[1])) {
        return None;
    }
    let even = permutation_parity(&index_order, &ordered);
    Some((a.parity == Parity::Odd) == even)
}

/// Carbon with a non-aromatic double bond to oxygen.
fn is_acyl_carbon(mol: &Mol<Atom, Bond>, atom: NodeIndex) -> bool {
    mol.atom(atom).atomic_num == CARBON
        && mol.neighbors(atom).any(|nb| {
            mol.atom(nb).atomic_num == OXYGEN
                && mol.bond_between(atom, nb).is_some_and(|e| {
                    let b = mol.bond(e);
                    !b.is_aromatic && b.order == BondOrder::Double
                })
        })
}

fn is_single_bonded_hetero(mol: &Mol<Atom, Bond>, parent: NodeIndex, atom: NodeIndex) -> bool {
    matches!(mol.atom(atom).atomic_num, OXYGEN | NITROGEN)
        && mol.bond_between(parent, atom).is_some_and(|e| {
            let b = mol.bond(e);
            !b.is_aromatic && b.order == BondOrder::Single
        })
}

/// Vetoes neighbor pairs that look alike but are typically exchanged in a
/// reaction. Bypassed when the environments agree to the full radius.
fn passes_basic_rules(
    reactant: &Mol<Atom, Bond>,
    ra: NodeIndex,
    rn: NodeIndex,
    product: &Mol<Atom, Bond>,
    pa: NodeIndex,
    pn: NodeIndex,
) -> bool {
    let r_hetero = is_single_bonded_hetero(reactant, ra, rn);
    let p_hetero = is_single_bonded_hetero(product, pa, pn);
    let r_acyl = is_acyl_carbon(reactant, ra);
    let p_acyl = is_acyl_carbon(product, pa);

    // ester or acid oxygen (or amide nitrogen) of an acyl group: the one
    // leaving in a re-esterification
    if r_acyl && p_acyl && r_hetero && p_hetero {
        return false;
    }

    // reductive cleavage: acyl oxygen on one side, alcohol carbon on the other
    let r_carbon = reactant.atom(ra).atomic_num == CARBON;
    let p_carbon = product.atom(pa).atomic_num == CARBON;
    if (r_acyl && r_hetero && p_carbon && !p_acyl) || (p_acyl && p_hetero && r_carbon && !r_acyl)
    {
        return false;
    }

    // O or N hanging off a heteroatom is easily substituted
    let r_on = matches!(reactant.atom(rn).atomic_num, OXYGEN | NITROGEN);
    let p_on = matches!(product.atom(pn).atomic_num, OXYGEN | NITROGEN);
    if r_on && p_on && (!r_carbon || !p_carbon) {
        return false;
    }

    true
}
