use std::collections::VecDeque;

use log::trace;
use petgraph::graph::NodeIndex;

use super::state::{AtomState, MapState};
use super::MappingContext;
use crate::atom::Atom;
use crate::bond::Bond;
use crate::canonical::{elevate_rank, RankScratch};
use crate::element::CARBON;
use crate::mol::Mol;

const MANUAL_PRIORITY: u32 = u32::MAX;
const SINGLETON_PRIORITY: u32 = 4;
const FRAGMENT_CLASS_PRIORITY: u32 = 2;

fn environment_priority(radius: usize, carbon: bool) -> u32 {
    16 + 2 * radius as u32 + u32::from(carbon)
}

/// A seed correspondence for graph growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootAtomPair {
    pub reactant_atom: NodeIndex,
    pub product_atom: NodeIndex,
    /// Higher is more plausible: manual pairs, then larger matching radius,
    /// carbon roots before others at equal radius.
    pub priority: u32,
    /// The pair was picked among several candidates.
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DecisionNode {
    choice: usize,
    count: usize,
}

/// Choices made at tied candidates during one pass, replayed and varied over
/// successive passes until every combination has been tried.
///
/// A pass calls [`choose`](Self::choose) at every tie; between passes
/// [`advance`](Self::advance) bumps the deepest choice that still has
/// untried alternatives and forgets everything after it.
#[derive(Debug, Clone, Default)]
pub struct DecisionTree {
    nodes: Vec<DecisionNode>,
    cursor: usize,
    complete: bool,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the alternative to take among `count`.
    pub fn choose(&mut self, count: usize) -> usize {
        if count <= 1 {
            return 0;
        }
        if let Some(node) = self.nodes.get(self.cursor) {
            if node.count == count {
                self.cursor += 1;
                return node.choice;
            }
            // The pass diverged from the recorded path.
            self.nodes.truncate(self.cursor);
        }
        self.nodes.push(DecisionNode { choice: 0, count });
        self.cursor += 1;
        0
    }

    /// Moves to the next unexplored choice sequence. Returns `false` once
    /// all sequences have been tried.
    pub fn advance(&mut self) -> bool {
        self.nodes.truncate(self.cursor);
        self.cursor = 0;
        while let Some(last) = self.nodes.last_mut() {
            if last.choice + 1 < last.count {
                last.choice += 1;
                return true;
            }
            self.nodes.pop();
        }
        self.complete = true;
        false
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn depth(&self) -> usize {
        self.nodes.len()
    }
}

/// Emits seed pairs for one mapping pass, most plausible first.
///
/// Candidates come from four sources, tried in order on every call: manual
/// map numbers, environments matching at radius `max..=1`, singleton
/// radius-0 classes of stoichiometric reactions, and equal-sized classes of
/// symmetric atoms spread over distinct untouched fragments.
pub struct RootAtomPairSource<'c, 'a> {
    ctx: &'c MappingContext<'a>,
    tree: DecisionTree,
    reactant_ranks: Vec<usize>,
    product_ranks: Vec<usize>,
    scratch: RankScratch,
    pending: VecDeque<RootAtomPair>,
}

impl<'c, 'a> RootAtomPairSource<'c, 'a> {
    pub fn new(ctx: &'c MappingContext<'a>) -> Self {
        let atoms = ctx.reactant.atom_count().max(ctx.product.atom_count());
        Self {
            ctx,
            tree: DecisionTree::new(),
            reactant_ranks: ctx.reactant_ranks.clone(),
            product_ranks: ctx.product_ranks.clone(),
            scratch: RankScratch::with_capacity(atoms),
            pending: VecDeque::new(),
        }
    }

    /// Resets per-pass state. Decisions recorded so far are replayed.
    pub fn start_pass(&mut self) {
        self.reactant_ranks.clone_from(&self.ctx.reactant_ranks);
        self.product_ranks.clone_from(&self.ctx.product_ranks);
        self.pending.clear();
        self.tree.rewind();
    }

    pub fn advance(&mut self) -> bool {
        self.tree.advance()
    }

    pub fn is_complete(&self) -> bool {
        self.tree.is_complete()
    }

    /// Next seed whose atoms are both unmapped. Candidates where neither
    /// atom has an unmapped neighbor left are marked rejected and skipped.
    pub fn next_pair(&mut self, state: &mut MapState) -> Option<RootAtomPair> {
        loop {
            let pair = self.next_candidate(state)?;
            let (r, p) = (pair.reactant_atom, pair.product_atom);
            let reactant_open = has_unmapped_neighbor(self.ctx.reactant, r, |a| {
                state.is_reactant_unmapped(a)
            });
            let product_open =
                has_unmapped_neighbor(self.ctx.product, p, |a| state.is_product_unmapped(a));
            if !reactant_open && !product_open {
                trace!("rejecting seed {} -> {}", r.index(), p.index());
                state.reject(r, p);
                continue;
            }
            let elevated = self.elevate(r, p);
            trace!(
                "seed {} -> {} (priority {})",
                r.index(),
                p.index(),
                pair.priority
            );
            return Some(RootAtomPair {
                ambiguous: pair.ambiguous || elevated,
                ..pair
            });
        }
    }

    fn next_candidate(&mut self, state: &MapState) -> Option<RootAtomPair> {
        while let Some(pair) = self.pending.pop_front() {
            if state.is_reactant_unmapped(pair.reactant_atom)
                && state.is_product_unmapped(pair.product_atom)
            {
                return Some(pair);
            }
        }

        let ctx = self.ctx;
        for &(r, p) in &ctx.manual_pairs {
            if state.is_reactant_unmapped(r) && state.is_product_unmapped(p) {
                return Some(RootAtomPair {
                    reactant_atom: r,
                    product_atom: p,
                    priority: MANUAL_PRIORITY,
                    ambiguous: false,
                });
            }
        }

        for radius in (1..=ctx.index.max_radius()).rev() {
            for carbon in [true, false] {
                for group in ctx.index.groups(radius) {
                    let is_carbon = ctx.reactant.atom(group.reactant_atoms[0]).atomic_num == CARBON;
                    if is_carbon != carbon {
                        continue;
                    }
                    let rs = available(&group.reactant_atoms, |a| state.is_reactant_unmapped(a));
                    let ps = available(&group.product_atoms, |a| state.is_product_unmapped(a));
                    if rs.is_empty() || ps.is_empty() {
                        continue;
                    }
                    return Some(self.pick(&rs, &ps, environment_priority(radius, carbon)));
                }
            }
        }

        if ctx.stoichiometric {
            for group in ctx.index.groups(0) {
                let rs = available(&group.reactant_atoms, |a| state.is_reactant_unmapped(a));
                let ps = available(&group.product_atoms, |a| state.is_product_unmapped(a));
                if rs.len() == 1 && ps.len() == 1 {
                    return Some(RootAtomPair {
                        reactant_atom: rs[0],
                        product_atom: ps[0],
                        priority: SINGLETON_PRIORITY,
                        ambiguous: false,
                    });
                }
            }
        }

        self.queue_fragment_class(state);
        self.pending.pop_front()
    }

    /// Picks one pair from tied candidate lists. Distinct symmetry classes
    /// among the candidates are a decision; atoms within a class are
    /// interchangeable and the first one is taken.
    fn pick(&mut self, rs: &[NodeIndex], ps: &[NodeIndex], priority: u32) -> RootAtomPair {
        let product_classes = class_representatives(ps, &self.product_ranks);
        let (reactant_atom, product_atom, options) = if product_classes.len() > 1 {
            let choice = self.tree.choose(product_classes.len());
            (rs[0], product_classes[choice], product_classes.len())
        } else {
            let reactant_classes = class_representatives(rs, &self.reactant_ranks);
            let choice = self.tree.choose(reactant_classes.len());
            (reactant_classes[choice], ps[0], reactant_classes.len())
        };
        RootAtomPair {
            reactant_atom,
            product_atom,
            priority,
            ambiguous: options > 1,
        }
    }

    /// Looks for a class of same-element atoms that sits one atom per
    /// untouched fragment and is symmetric on both sides. Its atoms are
    /// queued as positional pairs.
    ///
    /// Only radius 0 is scanned: a group at a larger radius with atoms left
    /// on both sides is already taken as an environment match.
    fn queue_fragment_class(&mut self, state: &MapState) {
        let ctx = self.ctx;
        let reactant_used = used_fragments(&ctx.reactant_fragments, |i| state.reactant(i));
        let product_used = used_fragments(&ctx.product_fragments, |i| state.product(i));

        for group in ctx.index.groups(0) {
            let rs = available(&group.reactant_atoms, |a| state.is_reactant_unmapped(a));
            let ps = available(&group.product_atoms, |a| state.is_product_unmapped(a));
            if rs.is_empty() || rs.len() != ps.len() {
                continue;
            }
            if !spread_over_fresh_fragments(&rs, &ctx.reactant_fragments, &reactant_used)
                || !spread_over_fresh_fragments(&ps, &ctx.product_fragments, &product_used)
                || !same_rank(&rs, &self.reactant_ranks)
                || !same_rank(&ps, &self.product_ranks)
            {
                continue;
            }
            let ambiguous = rs.len() > 1;
            self.pending
                .extend(rs.iter().zip(&ps).map(|(&r, &p)| RootAtomPair {
                    reactant_atom: r,
                    product_atom: p,
                    priority: FRAGMENT_CLASS_PRIORITY,
                    ambiguous,
                }));
            return;
        }
    }

    /// Splits the chosen atoms out of their symmetry classes so later ties
    /// in this pass see the asymmetry.
    fn elevate(&mut self, r: NodeIndex, p: NodeIndex) -> bool {
        let reactant = elevate_rank(
            self.ctx.reactant,
            &mut self.reactant_ranks,
            r,
            &mut self.scratch,
        );
        let product = elevate_rank(
            self.ctx.product,
            &mut self.product_ranks,
            p,
            &mut self.scratch,
        );
        reactant || product
    }
}

fn available(atoms: &[NodeIndex], is_unmapped: impl Fn(NodeIndex) -> bool) -> Vec<NodeIndex> {
    atoms.iter().copied().filter(|&a| is_unmapped(a)).collect()
}

fn has_unmapped_neighbor(
    mol: &Mol<Atom, Bond>,
    atom: NodeIndex,
    is_unmapped: impl Fn(NodeIndex) -> bool,
) -> bool {
    mol.neighbors(atom).any(is_unmapped)
}

/// First atom of each distinct rank, in list order.
fn class_representatives(atoms: &[NodeIndex], ranks: &[usize]) -> Vec<NodeIndex> {
    let mut seen: Vec<usize> = Vec::new();
    let mut reps = Vec::new();
    for &a in atoms {
        let rank = ranks[a.index()];
        if !seen.contains(&rank) {
            seen.push(rank);
            reps.push(a);
        }
    }
    reps
}

fn same_rank(atoms: &[NodeIndex], ranks: &[usize]) -> bool {
    atoms
        .windows(2)
        .all(|w| ranks[w[0].index()] == ranks[w[1].index()])
}

fn used_fragments(fragments: &[usize], state_of: impl Fn(NodeIndex) -> AtomState) -> Vec<bool> {
    let count = fragments.iter().copied().max().map_or(0, |m| m + 1);
    let mut used = vec![false; count];
    for (i, &f) in fragments.iter().enumerate() {
        if matches!(state_of(NodeIndex::new(i)), AtomState::Mapped(_)) {
            used[f] = true;
        }
    }
    used
}

fn spread_over_fresh_fragments(atoms: &[NodeIndex], fragments: &[usize], used: &[bool]) -> bool {
    let mut seen: Vec<usize> = Vec::with_capacity(atoms.len());
    for a in atoms {
        let f = fragments[a.index()];
        if used[f] || seen.contains(&f) {
            return false;
        }
        seen.push(f);
    }
    true
}
