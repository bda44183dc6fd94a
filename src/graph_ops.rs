use petgraph::graph::NodeIndex;

use crate::mol::Mol;

pub fn connected_components<A, B>(mol: &Mol<A, B>) -> Vec<Vec<NodeIndex>> {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut components = Vec::new();
    for node in mol.atoms() {
        if visited[node.index()] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            component.push(current);
            for neighbor in mol.neighbors(current) {
                if !visited[neighbor.index()] {
                    stack.push(neighbor);
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}

/// Fragment number per atom, numbered by lowest member index.
pub fn fragment_numbers<A, B>(mol: &Mol<A, B>) -> Vec<usize> {
    let mut numbers = vec![0; mol.atom_count()];
    for (frag, component) in connected_components(mol).iter().enumerate() {
        for atom in component {
            numbers[atom.index()] = frag;
        }
    }
    numbers
}

/// Several molecules copied into one indexed graph.
#[derive(Debug, Clone)]
pub struct MergedMol<A, B> {
    pub mol: Mol<A, B>,
    /// `(molecule, atom within that molecule)` for every merged atom.
    pub origins: Vec<(usize, NodeIndex)>,
}

pub fn merge<A: Clone, B: Clone>(mols: &[Mol<A, B>]) -> MergedMol<A, B> {
    let mut merged = Mol::new();
    let mut origins = Vec::new();
    for (m, mol) in mols.iter().enumerate() {
        let offset = merged.atom_count();
        for atom in mol.atoms() {
            merged.add_atom(mol.atom(atom).clone());
            origins.push((m, atom));
        }
        for edge in mol.bonds() {
            if let Some((a, b)) = mol.bond_endpoints(edge) {
                merged.add_bond(
                    NodeIndex::new(a.index() + offset),
                    NodeIndex::new(b.index() + offset),
                    mol.bond(edge).clone(),
                );
            }
        }
    }
    MergedMol {
        mol: merged,
        origins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn components_of_salt() {
        let mol = from_smiles("[Na+].[Cl-]").unwrap();
        let comps = connected_components(&mol);
        assert_eq!(comps, vec![vec![n(0)], vec![n(1)]]);
    }

    #[test]
    fn fragment_numbers_follow_first_atom() {
        let mol = from_smiles("CC.O.CCO").unwrap();
        assert_eq!(fragment_numbers(&mol), vec![0, 0, 1, 2, 2, 2]);
    }

    #[test]
    fn merge_offsets_indices() {
        let a = from_smiles("CO").unwrap();
        let b = from_smiles("CCN").unwrap();
        let merged = merge(&[a, b]);
        assert_eq!(merged.mol.atom_count(), 5);
        assert_eq!(merged.mol.bond_count(), 3);
        assert!(merged.mol.bond_between(n(2), n(3)).is_some());
        assert!(merged.mol.bond_between(n(1), n(2)).is_none());
        assert_eq!(merged.origins[3], (1, n(1)));
        assert_eq!(fragment_numbers(&merged.mol), vec![0, 0, 1, 1, 1]);
    }
}
