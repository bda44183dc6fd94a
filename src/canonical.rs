use std::hash::{Hash, Hasher};

use petgraph::graph::NodeIndex;

use crate::bond::BondOrder;
use crate::mol::Mol;
use crate::traits::{
    HasAromaticity, HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount, HasIsotope,
};

/// Stable 64-bit FNV-1a. Descriptors built from it must not depend on the
/// process, unlike `DefaultHasher`.
pub(crate) struct Fnv1aHasher(u64);

impl Fnv1aHasher {
    pub(crate) fn new() -> Self {
        Self(0xcbf29ce484222325)
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct AtomInvariant {
    atomic_num: u8,
    degree: u8,
    hydrogen_count: u8,
    formal_charge: i8,
    is_aromatic: bool,
    isotope: u16,
    singles: u8,
    doubles: u8,
    triples: u8,
    aromatic_bonds: u8,
}

fn atom_invariant<A, B>(mol: &Mol<A, B>, idx: NodeIndex) -> AtomInvariant
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge + HasAromaticity + HasIsotope,
    B: HasBondOrder,
{
    let atom = mol.atom(idx);
    let is_aromatic = atom.is_aromatic();
    let mut degree: u8 = 0;
    let mut singles: u8 = 0;
    let mut doubles: u8 = 0;
    let mut triples: u8 = 0;
    let mut aromatic_bonds: u8 = 0;
    for edge in mol.bonds_of(idx) {
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        degree += 1;
        let neighbor = if a == idx { b } else { a };
        if is_aromatic && mol.atom(neighbor).is_aromatic() {
            aromatic_bonds += 1;
        } else {
            match mol.bond(edge).bond_order() {
                BondOrder::Single => singles += 1,
                BondOrder::Double => doubles += 1,
                BondOrder::Triple => triples += 1,
            }
        }
    }
    AtomInvariant {
        atomic_num: atom.atomic_num(),
        degree,
        hydrogen_count: atom.hydrogen_count(),
        formal_charge: atom.formal_charge(),
        is_aromatic,
        isotope: atom.isotope(),
        singles,
        doubles,
        triples,
        aromatic_bonds,
    }
}

fn hash_invariant(inv: &AtomInvariant) -> u64 {
    let mut h = Fnv1aHasher::new();
    inv.hash(&mut h);
    h.finish()
}

pub(crate) fn ranks_from_values(values: &[u64]) -> Vec<usize> {
    let n = values.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by_key(|&i| values[i]);
    let mut ranks = vec![0usize; n];
    if n == 0 {
        return ranks;
    }
    ranks[indices[0]] = 0;
    for i in 1..n {
        ranks[indices[i]] = if values[indices[i]] == values[indices[i - 1]] {
            ranks[indices[i - 1]]
        } else {
            i
        };
    }
    ranks
}

pub(crate) fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted: Vec<usize> = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Reusable buffers for rank refinement, sized once per graph and passed
/// into every refinement call.
#[derive(Debug, Default)]
pub struct RankScratch {
    values: Vec<u64>,
    neighbor_ranks: Vec<usize>,
}

impl RankScratch {
    pub fn with_capacity(atom_count: usize) -> Self {
        Self {
            values: Vec::with_capacity(atom_count),
            neighbor_ranks: Vec::with_capacity(8),
        }
    }
}

/// Refines ranks by hashing each atom's rank with its sorted neighbor ranks
/// until the number of classes stops growing.
fn morgan_refine<A, B>(mol: &Mol<A, B>, ranks: &mut Vec<usize>, scratch: &mut RankScratch) {
    let n = mol.atom_count();
    let mut prev_distinct = count_distinct(ranks);

    loop {
        scratch.values.clear();
        scratch.values.resize(n, 0);
        for node in mol.atoms() {
            let i = node.index();
            scratch.neighbor_ranks.clear();
            scratch
                .neighbor_ranks
                .extend(mol.neighbors(node).map(|nb| ranks[nb.index()]));
            scratch.neighbor_ranks.sort_unstable();

            let mut h = Fnv1aHasher::new();
            ranks[i].hash(&mut h);
            scratch.neighbor_ranks.hash(&mut h);
            scratch.values[i] = h.finish();
        }
        let new_ranks = ranks_from_values(&scratch.values);
        let distinct = count_distinct(&new_ranks);
        if distinct <= prev_distinct {
            return;
        }
        *ranks = new_ranks;
        prev_distinct = distinct;
    }
}

/// Symmetry classes: atoms with equal rank are indistinguishable by
/// invariant refinement. Ties are not broken.
pub fn symmetry_ranks<A, B>(mol: &Mol<A, B>, scratch: &mut RankScratch) -> Vec<usize>
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge + HasAromaticity + HasIsotope,
    B: HasBondOrder,
{
    let initial_values: Vec<u64> = mol
        .atoms()
        .map(|idx| hash_invariant(&atom_invariant(mol, idx)))
        .collect();
    let mut ranks = ranks_from_values(&initial_values);
    morgan_refine(mol, &mut ranks, scratch);
    ranks
}

/// Splits `atom` out of its symmetry class and propagates the asymmetry
/// through the graph. Returns `false` when the atom was already alone in
/// its class.
pub fn elevate_rank<A, B>(
    mol: &Mol<A, B>,
    ranks: &mut Vec<usize>,
    atom: NodeIndex,
    scratch: &mut RankScratch,
) -> bool {
    let rank = ranks[atom.index()];
    if ranks.iter().filter(|&&r| r == rank).count() < 2 {
        return false;
    }
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    ranks[atom.index()] = max_rank + 1;
    morgan_refine(mol, ranks, scratch);
    true
}
