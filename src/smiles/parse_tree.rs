use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::{AtomToken, BondToken, ChiralityToken, Token};

#[derive(Debug, Clone)]
pub struct ParseAtom {
    pub atomic_num: u8,
    pub is_aromatic: bool,
    pub isotope: u16,
    pub chirality: ChiralityToken,
    pub hcount: Option<u8>,
    pub charge: i8,
    pub atom_class: u16,
    /// Whether the atom was bonded to an atom written before it (not a
    /// ring closure). Decides where an implicit H sits in stereo order.
    pub has_preceding: bool,
    /// Neighbor atom indices in the order they are written around this
    /// atom. Ring-closure partners occupy the position of their digit.
    pub neighbors: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct ParseBond {
    pub a: usize,
    pub b: usize,
    pub bond: Option<BondToken>,
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    pub atoms: Vec<ParseAtom>,
    /// Bonds in the order they are completed in the text.
    pub bonds: Vec<ParseBond>,
}

struct OpenRing {
    atom: usize,
    bond: Option<BondToken>,
    slot: usize,
}

const RING_SLOT_PENDING: usize = usize::MAX;

pub fn build_parse_tree(tokens: &[Token]) -> Result<ParseTree, SmilesError> {
    let mut atoms: Vec<ParseAtom> = Vec::new();
    let mut bonds: Vec<ParseBond> = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<usize> = None;
    let mut pending_bond: Option<BondToken> = None;
    let mut ring_opens: Vec<Option<OpenRing>> = (0..100).map(|_| None).collect();

    for token in tokens {
        match token {
            Token::Atom(atom_tok) => {
                let idx = atoms.len();
                atoms.push(parse_atom_from_token(atom_tok));

                if let Some(cur) = current {
                    let bond = pending_bond.take();
                    atoms[cur].neighbors.push(idx);
                    atoms[idx].neighbors.push(cur);
                    atoms[idx].has_preceding = true;
                    bonds.push(ParseBond { a: cur, b: idx, bond });
                } else {
                    pending_bond = None;
                }

                current = Some(idx);
            }
            Token::Bond(b) => {
                pending_bond = Some(*b);
            }
            Token::RingClosure { bond, digit, pos } => {
                let d = *digit as usize;
                let cur = current.ok_or(SmilesError::InvalidRingBond {
                    digit: *digit,
                    pos: *pos,
                })?;
                let bond = bond.or(pending_bond.take());

                if let Some(open) = ring_opens[d].take() {
                    let ring_bond = match (bond, open.bond) {
                        (None, None) => None,
                        (Some(b), None) | (None, Some(b)) => Some(b),
                        (Some(b1), Some(b2)) => {
                            if b1 == b2 {
                                Some(b1)
                            } else {
                                return Err(SmilesError::RingBondConflict { digit: *digit });
                            }
                        }
                    };
                    if open.atom == cur || atoms[cur].neighbors.contains(&open.atom) {
                        return Err(SmilesError::DuplicateRingBond { digit: *digit });
                    }

                    atoms[open.atom].neighbors[open.slot] = cur;
                    atoms[cur].neighbors.push(open.atom);
                    bonds.push(ParseBond {
                        a: open.atom,
                        b: cur,
                        bond: ring_bond,
                    });
                } else {
                    let slot = atoms[cur].neighbors.len();
                    atoms[cur].neighbors.push(RING_SLOT_PENDING);
                    ring_opens[d] = Some(OpenRing {
                        atom: cur,
                        bond,
                        slot,
                    });
                }
            }
            Token::OpenParen(pos) => {
                let cur = current.ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                stack.push((cur, *pos));
            }
            Token::CloseParen(pos) => {
                let (cur, _) = stack.pop().ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                current = Some(cur);
                pending_bond = None;
            }
            Token::Dot(_) => {
                current = None;
                pending_bond = None;
            }
        }
    }

    if let Some(&(_, pos)) = stack.last() {
        return Err(SmilesError::UnmatchedParen { pos });
    }

    for (digit, entry) in ring_opens.iter().enumerate() {
        if entry.is_some() {
            return Err(SmilesError::UnclosedRing {
                digit: digit as u16,
            });
        }
    }

    Ok(ParseTree { atoms, bonds })
}

fn parse_atom_from_token(tok: &AtomToken) -> ParseAtom {
    ParseAtom {
        atomic_num: tok.atomic_num,
        is_aromatic: tok.is_aromatic,
        isotope: tok.isotope,
        chirality: tok.chirality,
        hcount: tok.hcount,
        charge: tok.charge,
        atom_class: tok.atom_class,
        has_preceding: false,
        neighbors: Vec::new(),
    }
}
