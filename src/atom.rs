/// Tetrahedral stereo parity of an atom.
///
/// Parity is defined relative to the atom's neighbors listed in ascending
/// atom-index order, with an implicit hydrogen (if any) counted last. `Odd`
/// means that, looking from the first neighbor, the remaining neighbors run
/// anticlockwise; `Even` means clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    /// A stereocenter whose configuration is not known, e.g. after a rule
    /// rewired its bonds.
    Unknown,
}

impl Parity {
    pub fn is_defined(self) -> bool {
        matches!(self, Parity::Odd | Parity::Even)
    }

    pub fn inverted(self) -> Self {
        match self {
            Parity::Odd => Parity::Even,
            Parity::Even => Parity::Odd,
            other => other,
        }
    }
}

/// Where an atom's map number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MapOrigin {
    /// Supplied with the reaction record.
    #[default]
    Manual,
    /// Assigned by similarity-guided graph growth.
    Graph,
    /// Assigned while completing the reaction center.
    ReactionCenter,
}

/// Default atom type for a molecular graph node.
///
/// Stores what is read off a reaction record: element, charge, isotope,
/// hydrogens, aromaticity, radical state and stereo parity, plus the map
/// number linking the atom to its partner on the other side of a reaction.
///
/// # Examples
///
/// ```
/// use rxnmap::Atom;
///
/// let carbon = Atom {
///     atomic_num: 6,
///     hydrogen_count: 3,
///     ..Atom::default()
/// };
/// assert_eq!(carbon.map_no, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    pub atomic_num: u8,
    pub formal_charge: i8,
    /// Mass number. `0` means natural isotopic abundance.
    pub isotope: u16,
    /// Implicit hydrogens. These are not graph nodes.
    pub hydrogen_count: u8,
    pub is_aromatic: bool,
    /// Number of unpaired electrons.
    pub radical: u8,
    pub parity: Parity,
    /// `0` means unmapped.
    pub map_no: u16,
    pub map_origin: MapOrigin,
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.formal_charge
    }
}

impl crate::traits::HasIsotope for Atom {
    fn isotope(&self) -> u16 {
        self.isotope
    }
}

impl crate::traits::HasHydrogenCount for Atom {
    fn hydrogen_count(&self) -> u8 {
        self.hydrogen_count
    }
}

impl crate::traits::HasAromaticity for Atom {
    fn is_aromatic(&self) -> bool {
        self.is_aromatic
    }
}
