use petgraph::graph::NodeIndex;

use crate::atom::{Atom, Parity};
use crate::bond::{Bond, BondOrder};
use crate::element::default_valences;
use crate::mol::{permutation_parity, Mol};
use crate::smiles::parse_tree::{ParseAtom, ParseTree};
use crate::smiles::tokenizer::{BondToken, ChiralityToken};

pub fn build_mol(tree: &ParseTree) -> Mol<Atom, Bond> {
    let mut mol = Mol::new();

    for parse_atom in &tree.atoms {
        mol.add_atom(Atom {
            atomic_num: parse_atom.atomic_num,
            formal_charge: parse_atom.charge,
            isotope: parse_atom.isotope,
            hydrogen_count: parse_atom.hcount.unwrap_or(0),
            is_aromatic: parse_atom.is_aromatic,
            map_no: parse_atom.atom_class,
            ..Atom::default()
        });
    }

    for pb in &tree.bonds {
        let bond = resolve_bond(
            pb.bond,
            tree.atoms[pb.a].is_aromatic,
            tree.atoms[pb.b].is_aromatic,
        );
        mol.add_bond(NodeIndex::new(pb.a), NodeIndex::new(pb.b), bond);
    }

    resolve_implicit_hydrogens(&mut mol, tree);
    resolve_parity(&mut mol, tree);

    mol
}

fn resolve_bond(bond_tok: Option<BondToken>, from_aromatic: bool, to_aromatic: bool) -> Bond {
    match bond_tok {
        Some(BondToken::Single) | Some(BondToken::Up) | Some(BondToken::Down) => {
            Bond::with_order(BondOrder::Single)
        }
        Some(BondToken::Double) => Bond::with_order(BondOrder::Double),
        Some(BondToken::Triple) => Bond::with_order(BondOrder::Triple),
        Some(BondToken::Aromatic) => Bond {
            is_aromatic: true,
            ..Bond::default()
        },
        Some(BondToken::Any) => Bond {
            any_order: true,
            ..Bond::default()
        },
        None => Bond {
            is_aromatic: from_aromatic && to_aromatic,
            ..Bond::default()
        },
    }
}

/// Bare atoms take the smallest default valence that fits their bonds.
/// Aromatic bonds count one each, plus one for the atom's pi contribution.
fn resolve_implicit_hydrogens(mol: &mut Mol<Atom, Bond>, tree: &ParseTree) {
    for (i, parse_atom) in tree.atoms.iter().enumerate() {
        if parse_atom.hcount.is_some() {
            continue;
        }
        let idx = NodeIndex::new(i);
        let mut used: u8 = mol
            .bonds_of(idx)
            .map(|e| {
                let bond = mol.bond(e);
                if bond.is_aromatic {
                    1
                } else {
                    bond.order.as_u8()
                }
            })
            .sum();
        if parse_atom.is_aromatic {
            if !matches!(parse_atom.atomic_num, 5 | 6 | 7) {
                continue;
            }
            used += 1;
        }
        let implicit = default_valences(parse_atom.atomic_num)
            .iter()
            .find(|&&v| v >= used)
            .map_or(0, |&v| v - used);
        mol.atom_mut(idx).hydrogen_count = implicit;
    }
}

/// Converts `@`/`@@`, written relative to the SMILES neighbor order, into a
/// [`Parity`] relative to ascending neighbor index with implicit H last.
fn resolve_parity(mol: &mut Mol<Atom, Bond>, tree: &ParseTree) {
    const IMPLICIT_H: usize = usize::MAX;

    for (i, parse_atom) in tree.atoms.iter().enumerate() {
        if parse_atom.chirality == ChiralityToken::None {
            continue;
        }
        let h_count = mol.atom(NodeIndex::new(i)).hydrogen_count;
        if h_count > 1 || parse_atom.neighbors.len() + (h_count as usize) < 3 {
            continue;
        }

        let smiles_order = smiles_neighbor_order(parse_atom, h_count == 1, IMPLICIT_H);
        let mut index_order = parse_atom.neighbors.clone();
        index_order.sort_unstable();
        if h_count == 1 {
            index_order.push(IMPLICIT_H);
        }

        let written = match parse_atom.chirality {
            ChiralityToken::CounterClockwise => Parity::Odd,
            _ => Parity::Even,
        };
        let parity = if permutation_parity(&smiles_order, &index_order) {
            written
        } else {
            written.inverted()
        };
        mol.atom_mut(NodeIndex::new(i)).parity = parity;
    }
}

fn smiles_neighbor_order(parse_atom: &ParseAtom, has_h: bool, h: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(parse_atom.neighbors.len() + 1);
    if has_h && parse_atom.has_preceding {
        order.push(parse_atom.neighbors[0]);
        order.push(h);
        order.extend_from_slice(&parse_atom.neighbors[1..]);
    } else if has_h {
        order.push(h);
        order.extend_from_slice(&parse_atom.neighbors);
    } else {
        order.extend_from_slice(&parse_atom.neighbors);
    }
    order
}
