use std::collections::VecDeque;

use petgraph::algo::connected_components;
use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;

/// Per-bond smallest ring size and per-atom ring-size membership.
///
/// Ring sizes above 31 share the top bit of the atom bitset.
#[derive(Debug, Clone)]
pub struct RingInfo {
    bond_ring_size: Vec<Option<usize>>,
    atom_ring_bits: Vec<u32>,
}

impl RingInfo {
    pub fn perceive<A, B>(mol: &Mol<A, B>) -> Self {
        let mut bond_ring_size = vec![None; mol.bond_count()];
        let mut atom_ring_bits = vec![0u32; mol.atom_count()];

        if Self::expected_ring_count(mol) > 0 {
            for edge in mol.bonds() {
                let Some((u, v)) = mol.bond_endpoints(edge) else {
                    continue;
                };
                let Some(size) = smallest_cycle_through(mol, edge, u, v) else {
                    continue;
                };
                bond_ring_size[edge.index()] = Some(size);
                let bit = 1u32 << size.min(31);
                atom_ring_bits[u.index()] |= bit;
                atom_ring_bits[v.index()] |= bit;
            }
        }

        Self {
            bond_ring_size,
            atom_ring_bits,
        }
    }

    pub fn is_ring_bond(&self, bond: EdgeIndex) -> bool {
        self.smallest_ring_size(bond).is_some()
    }

    pub fn smallest_ring_size(&self, bond: EdgeIndex) -> Option<usize> {
        self.bond_ring_size.get(bond.index()).copied().flatten()
    }

    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.ring_size_bits(atom) != 0
    }

    /// Bit `n` is set when the atom sits on a bond whose smallest ring has
    /// `n` members.
    pub fn ring_size_bits(&self, atom: NodeIndex) -> u32 {
        self.atom_ring_bits.get(atom.index()).copied().unwrap_or(0)
    }

    pub fn expected_ring_count<A, B>(mol: &Mol<A, B>) -> usize {
        let v = mol.atom_count();
        let e = mol.bond_count();
        let c = connected_components(mol.graph());
        (e + c).saturating_sub(v)
    }
}

/// BFS from `u` to `v` without crossing `edge`.
fn smallest_cycle_through<A, B>(
    mol: &Mol<A, B>,
    edge: EdgeIndex,
    u: NodeIndex,
    v: NodeIndex,
) -> Option<usize> {
    let mut dist = vec![u32::MAX; mol.atom_count()];
    let mut queue = VecDeque::new();
    dist[u.index()] = 0;
    queue.push_back(u);

    while let Some(cur) = queue.pop_front() {
        for bond in mol.bonds_of(cur) {
            if bond == edge {
                continue;
            }
            let Some((a, b)) = mol.bond_endpoints(bond) else {
                continue;
            };
            let nb = if a == cur { b } else { a };
            if dist[nb.index()] != u32::MAX {
                continue;
            }
            dist[nb.index()] = dist[cur.index()] + 1;
            if nb == v {
                return Some(dist[nb.index()] as usize + 1);
            }
            queue.push_back(nb);
        }
    }
    None
}
