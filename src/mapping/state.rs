use petgraph::graph::NodeIndex;

/// Mapping state of one atom during a mapping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtomState {
    #[default]
    Unmapped,
    Mapped(u16),
    /// Offered as a seed and turned down; skipped until the pass ends.
    Rejected,
}

impl AtomState {
    pub fn map_no(self) -> u16 {
        match self {
            AtomState::Mapped(n) => n,
            _ => 0,
        }
    }
}

/// Per-atom states of both reaction sides plus the count of map numbers
/// handed out.
///
/// Each map number is handed out once, to exactly one reactant and one
/// product atom, so no number repeats on either side. Numbers run from 1 to
/// `u16::MAX`; after that `assign` refuses.
#[derive(Debug, Clone)]
pub struct MapState {
    reactant: Vec<AtomState>,
    product: Vec<AtomState>,
    assigned: u16,
}

impl MapState {
    pub fn new(reactant_atoms: usize, product_atoms: usize) -> Self {
        Self {
            reactant: vec![AtomState::Unmapped; reactant_atoms],
            product: vec![AtomState::Unmapped; product_atoms],
            assigned: 0,
        }
    }

    pub fn reactant(&self, atom: NodeIndex) -> AtomState {
        self.reactant[atom.index()]
    }

    pub fn product(&self, atom: NodeIndex) -> AtomState {
        self.product[atom.index()]
    }

    pub fn is_reactant_unmapped(&self, atom: NodeIndex) -> bool {
        self.reactant[atom.index()] == AtomState::Unmapped
    }

    pub fn is_product_unmapped(&self, atom: NodeIndex) -> bool {
        self.product[atom.index()] == AtomState::Unmapped
    }

    /// Pairs two unmapped atoms under the next map number. `None` once the
    /// numbers are used up; both atoms then stay unmapped.
    pub fn assign(&mut self, reactant: NodeIndex, product: NodeIndex) -> Option<u16> {
        debug_assert!(self.is_reactant_unmapped(reactant));
        debug_assert!(self.is_product_unmapped(product));
        let n = self.assigned.checked_add(1)?;
        self.assigned = n;
        self.reactant[reactant.index()] = AtomState::Mapped(n);
        self.product[product.index()] = AtomState::Mapped(n);
        Some(n)
    }

    pub fn is_exhausted(&self) -> bool {
        self.assigned == u16::MAX
    }

    pub fn reject(&mut self, reactant: NodeIndex, product: NodeIndex) {
        if self.is_reactant_unmapped(reactant) {
            self.reactant[reactant.index()] = AtomState::Rejected;
        }
        if self.is_product_unmapped(product) {
            self.product[product.index()] = AtomState::Rejected;
        }
    }

    pub fn clear_rejections(&mut self) {
        for s in self.reactant.iter_mut().chain(self.product.iter_mut()) {
            if *s == AtomState::Rejected {
                *s = AtomState::Unmapped;
            }
        }
    }

    /// Number of map numbers handed out so far.
    pub fn mapped_count(&self) -> u16 {
        self.assigned
    }

    pub fn reactant_map_numbers(&self) -> Vec<u16> {
        self.reactant.iter().map(|s| s.map_no()).collect()
    }

    pub fn product_map_numbers(&self) -> Vec<u16> {
        self.product.iter().map(|s| s.map_no()).collect()
    }

    /// Product atom carrying each map number, indexed by map number.
    pub fn product_atoms_by_map_no(&self) -> Vec<Option<NodeIndex>> {
        let mut by_map = vec![None; usize::from(self.assigned) + 1];
        for (i, s) in self.product.iter().enumerate() {
            if let AtomState::Mapped(n) = s {
                by_map[*n as usize] = Some(NodeIndex::new(i));
            }
        }
        by_map
    }
}
