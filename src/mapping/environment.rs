//! Canonical descriptors of circular atom neighborhoods.
//!
//! The descriptor of atom `a` at radius `r` identifies the isomorphism class
//! of the subgraph induced by all atoms within `r` bonds of `a`, with `a`
//! marked as the root. Charges, radicals and hydrogen counts are left out so
//! that an atom whose protonation or charge changes across a reaction still
//! finds its partner.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, SimpleBondType};
use crate::canonical::Fnv1aHasher;
use crate::mol::Mol;

pub type Descriptor = u64;

/// Descriptors of every atom for radii `0..=max_radius`.
#[derive(Debug, Clone)]
pub struct AtomEnvironments {
    max_radius: usize,
    descriptors: Vec<Vec<Descriptor>>,
}

impl AtomEnvironments {
    pub fn classify(mol: &Mol<Atom, Bond>, max_radius: usize) -> Self {
        let descriptors = mol
            .atoms()
            .map(|root| grow_descriptors(mol, root, None, max_radius))
            .collect();
        Self {
            max_radius,
            descriptors,
        }
    }

    pub fn max_radius(&self) -> usize {
        self.max_radius
    }

    pub fn descriptor(&self, atom: NodeIndex, radius: usize) -> Descriptor {
        self.descriptors[atom.index()][radius.min(self.max_radius)]
    }
}

/// Descriptors of environments grown from a root atom without entering one
/// excluded neighbor, i.e. looking out through the root's other bonds.
/// Computed on demand and cached.
#[derive(Debug)]
pub struct ExitEnvironments<'a> {
    mol: &'a Mol<Atom, Bond>,
    max_radius: usize,
    cache: HashMap<(NodeIndex, NodeIndex), Vec<Descriptor>>,
}

impl<'a> ExitEnvironments<'a> {
    pub fn new(mol: &'a Mol<Atom, Bond>, max_radius: usize) -> Self {
        Self {
            mol,
            max_radius,
            cache: HashMap::new(),
        }
    }

    /// Descriptors for radii `0..=max_radius`.
    pub fn get(&mut self, root: NodeIndex, excluded: NodeIndex) -> &[Descriptor] {
        let (mol, max_radius) = (self.mol, self.max_radius);
        self.cache
            .entry((root, excluded))
            .or_insert_with(|| grow_descriptors(mol, root, Some(excluded), max_radius))
    }
}

/// Number of consecutive radii, starting at 1, whose descriptors agree.
pub fn matching_depth(a: &[Descriptor], b: &[Descriptor]) -> usize {
    a.iter()
        .zip(b)
        .skip(1)
        .take_while(|(x, y)| x == y)
        .count()
}

fn grow_descriptors(
    mol: &Mol<Atom, Bond>,
    root: NodeIndex,
    excluded: Option<NodeIndex>,
    max_radius: usize,
) -> Vec<Descriptor> {
    let mut descriptors = Vec::with_capacity(max_radius + 1);
    descriptors.push(root_descriptor(mol.atom(root)));

    let mut in_ball = vec![false; mol.atom_count()];
    in_ball[root.index()] = true;
    if let Some(ex) = excluded {
        in_ball[ex.index()] = true;
    }
    let mut members = vec![root];
    let mut frontier = vec![root];

    for radius in 1..=max_radius {
        let mut next = Vec::new();
        for &atom in &frontier {
            for nb in mol.sorted_neighbors(atom) {
                if !in_ball[nb.index()] {
                    in_ball[nb.index()] = true;
                    next.push(nb);
                }
            }
        }
        if next.is_empty() {
            let last = descriptors[radius - 1];
            descriptors.resize(max_radius + 1, last);
            break;
        }
        members.extend_from_slice(&next);
        frontier = next;
        descriptors.push(ball_descriptor(mol, root, &members, radius));
    }

    descriptors
}

fn root_descriptor(atom: &Atom) -> Descriptor {
    let mut h = Fnv1aHasher::new();
    atom.atomic_num.hash(&mut h);
    atom.isotope.hash(&mut h);
    h.finish()
}

fn bond_code(bond: &Bond) -> u8 {
    match bond.simple_type() {
        SimpleBondType::Single => 1,
        SimpleBondType::Double => 2,
        SimpleBondType::Triple => 3,
        SimpleBondType::Delocalized => 4,
    }
}

/// Hash of the induced subgraph on `members` after `radius + 1` rounds of
/// neighbor-label refinement. Labels are hashes, not ranks, so they compare
/// across graphs.
fn ball_descriptor(
    mol: &Mol<Atom, Bond>,
    root: NodeIndex,
    members: &[NodeIndex],
    radius: usize,
) -> Descriptor {
    let mut local = vec![usize::MAX; mol.atom_count()];
    for (i, &atom) in members.iter().enumerate() {
        local[atom.index()] = i;
    }

    let mut edges: Vec<(usize, usize, u8)> = Vec::new();
    for (i, &atom) in members.iter().enumerate() {
        for e in mol.bonds_of(atom) {
            let Some((a, b)) = mol.bond_endpoints(e) else {
                continue;
            };
            let other = if a == atom { b } else { a };
            let j = local[other.index()];
            if j != usize::MAX && i < j {
                edges.push((i, j, bond_code(mol.bond(e))));
            }
        }
    }

    let mut labels: Vec<u64> = members
        .iter()
        .map(|&atom| {
            let a = mol.atom(atom);
            let mut h = Fnv1aHasher::new();
            a.atomic_num.hash(&mut h);
            a.isotope.hash(&mut h);
            a.is_aromatic.hash(&mut h);
            (atom == root).hash(&mut h);
            h.finish()
        })
        .collect();

    let mut adjacency: Vec<Vec<(usize, u8)>> = vec![Vec::new(); members.len()];
    for &(i, j, code) in &edges {
        adjacency[i].push((j, code));
        adjacency[j].push((i, code));
    }

    let mut around: Vec<(u8, u64)> = Vec::new();
    for _ in 0..=radius {
        let next: Vec<u64> = (0..members.len())
            .map(|i| {
                around.clear();
                around.extend(adjacency[i].iter().map(|&(j, code)| (code, labels[j])));
                around.sort_unstable();
                let mut h = Fnv1aHasher::new();
                labels[i].hash(&mut h);
                around.hash(&mut h);
                h.finish()
            })
            .collect();
        labels = next;
    }

    let mut sorted_labels = labels.clone();
    sorted_labels.sort_unstable();
    let mut edge_labels: Vec<(u64, u64, u8)> = edges
        .iter()
        .map(|&(i, j, code)| (labels[i].min(labels[j]), labels[i].max(labels[j]), code))
        .collect();
    edge_labels.sort_unstable();

    let mut h = Fnv1aHasher::new();
    sorted_labels.hash(&mut h);
    edge_labels.hash(&mut h);
    h.finish()
}

/// Atoms of both sides sharing one descriptor at one radius.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvGroup {
    pub reactant_atoms: Vec<NodeIndex>,
    pub product_atoms: Vec<NodeIndex>,
}

/// Per radius, descriptor to the reactant and product atoms carrying it.
/// Only descriptors present on both sides are kept, in reactant atom order.
#[derive(Debug, Clone)]
pub struct EnvironmentIndex {
    by_radius: Vec<IndexMap<Descriptor, EnvGroup>>,
}

impl EnvironmentIndex {
    pub fn build(reactant: &AtomEnvironments, product: &AtomEnvironments) -> Self {
        let max_radius = reactant.max_radius().min(product.max_radius());
        let reactant_atoms = reactant.descriptors.len();
        let product_atoms = product.descriptors.len();

        let by_radius = (0..=max_radius)
            .map(|radius| {
                let mut groups: IndexMap<Descriptor, EnvGroup> = IndexMap::new();
                for i in 0..reactant_atoms {
                    let atom = NodeIndex::new(i);
                    groups
                        .entry(reactant.descriptor(atom, radius))
                        .or_default()
                        .reactant_atoms
                        .push(atom);
                }
                for i in 0..product_atoms {
                    let atom = NodeIndex::new(i);
                    if let Some(group) = groups.get_mut(&product.descriptor(atom, radius)) {
                        group.product_atoms.push(atom);
                    }
                }
                groups.retain(|_, g| !g.product_atoms.is_empty());
                groups
            })
            .collect();

        Self { by_radius }
    }

    pub fn max_radius(&self) -> usize {
        self.by_radius.len().saturating_sub(1)
    }

    pub fn groups(&self, radius: usize) -> impl Iterator<Item = &EnvGroup> + '_ {
        self.by_radius
            .get(radius)
            .into_iter()
            .flat_map(|groups| groups.values())
    }

    pub fn group_count(&self, radius: usize) -> usize {
        self.by_radius.get(radius).map_or(0, |g| g.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    fn envs(smiles: &str, radius: usize) -> AtomEnvironments {
        AtomEnvironments::classify(&from_smiles(smiles).unwrap(), radius)
    }

    #[test]
    fn radius_zero_is_element_and_isotope() {
        let e = envs("C[13CH3]O", 3);
        assert_ne!(e.descriptor(n(0), 0), e.descriptor(n(1), 0));
        assert_ne!(e.descriptor(n(0), 0), e.descriptor(n(2), 0));
        let plain = envs("CC", 1);
        assert_eq!(e.descriptor(n(0), 0), plain.descriptor(n(1), 0));
    }

    #[test]
    fn symmetric_atoms_share_descriptors() {
        let e = envs("OCCO", 4);
        for r in 0..=4 {
            assert_eq!(e.descriptor(n(0), r), e.descriptor(n(3), r));
            assert_eq!(e.descriptor(n(1), r), e.descriptor(n(2), r));
        }
    }

    #[test]
    fn root_marking_separates_positions() {
        // Same ball at radius 2, different roots.
        let e = envs("CCC", 2);
        assert_ne!(e.descriptor(n(0), 2), e.descriptor(n(1), 2));
    }

    #[test]
    fn descriptors_ignore_charge_and_hydrogens() {
        let acid = envs("CC(=O)O", 3);
        let anion = envs("CC(=O)[O-]", 3);
        for i in 0..4 {
            for r in 0..=3 {
                assert_eq!(acid.descriptor(n(i), r), anion.descriptor(n(i), r));
            }
        }
    }

    #[test]
    fn descriptors_independent_of_atom_order() {
        let a = envs("OCC(C)N", 3);
        let b = envs("NC(C)CO", 3);
        // O(0) in a is O(4) in b; central C(2) in a is C(1) in b
        for r in 0..=3 {
            assert_eq!(a.descriptor(n(0), r), b.descriptor(n(4), r));
            assert_eq!(a.descriptor(n(2), r), b.descriptor(n(1), r));
        }
    }

    #[test]
    fn bond_order_matters() {
        let single = envs("CC", 1);
        let double = envs("C=C", 1);
        assert_ne!(single.descriptor(n(0), 1), double.descriptor(n(0), 1));
    }

    #[test]
    fn growth_stops_when_molecule_is_absorbed() {
        let e = envs("CO", 5);
        for r in 2..=5 {
            assert_eq!(e.descriptor(n(0), r), e.descriptor(n(0), 1));
        }
    }

    #[test]
    fn exit_environment_skips_excluded_neighbor() {
        let mol = from_smiles("CCO").unwrap();
        let mut exits = ExitEnvironments::new(&mol, 3);
        let toward_o = exits.get(n(1), n(0)).to_vec();
        let toward_c = exits.get(n(1), n(2)).to_vec();
        assert_ne!(toward_o[1], toward_c[1]);

        let ethane = from_smiles("CC").unwrap();
        let mut ethane_exits = ExitEnvironments::new(&ethane, 3);
        // C1 looking away from O sees only C0, just like ethane's C1 looking away from nothing.
        let methyl_side = ethane_exits.get(n(1), n(1)).to_vec();
        assert_eq!(toward_c[1], methyl_side[1]);
    }

    #[test]
    fn matching_depth_counts_from_radius_one() {
        assert_eq!(matching_depth(&[9, 1, 2, 3], &[8, 1, 2, 3]), 3);
        assert_eq!(matching_depth(&[0, 1, 2, 3], &[0, 1, 5, 3]), 1);
        assert_eq!(matching_depth(&[0, 1], &[0, 2]), 0);
    }

    #[test]
    fn index_keeps_descriptors_on_both_sides() {
        let r = envs("CC(=O)O.OCC", 3);
        let p = envs("CC(=O)OCC.O", 3);
        let index = EnvironmentIndex::build(&r, &p);
        let radius0: Vec<_> = index.groups(0).collect();
        assert_eq!(radius0.len(), 2);
        assert_eq!(index.group_count(0), 2);
        assert_eq!(radius0[0].reactant_atoms, vec![n(0), n(1), n(5), n(6)]);
        assert_eq!(radius0[0].product_atoms, vec![n(0), n(1), n(4), n(5)]);
        assert_eq!(radius0[1].reactant_atoms, vec![n(2), n(3), n(4)]);
        assert_eq!(radius0[1].product_atoms, vec![n(2), n(3), n(6)]);
        // The terminal methyl of the acetyl group looks the same at radius 1.
        assert!(index
            .groups(1)
            .any(|g| g.reactant_atoms.contains(&n(0)) && g.product_atoms.contains(&n(0))));
    }
}
