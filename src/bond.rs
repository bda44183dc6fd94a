#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
}

impl BondOrder {
    pub fn as_u8(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

/// Bond classification used when comparing bonds across a reaction.
/// Aromatic and delocalized bonds collapse into one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimpleBondType {
    Single,
    Double,
    Triple,
    Delocalized,
}

/// Aromatic systems are not kekulized: an aromatic bond keeps
/// [`BondOrder::Single`] and sets `is_aromatic`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub is_aromatic: bool,
    pub is_delocalized: bool,
    /// Query wildcard (`~` in a template): matches any bond order.
    pub any_order: bool,
}

impl Bond {
    pub fn with_order(order: BondOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn simple_type(&self) -> SimpleBondType {
        if self.is_aromatic || self.is_delocalized {
            return SimpleBondType::Delocalized;
        }
        match self.order {
            BondOrder::Single => SimpleBondType::Single,
            BondOrder::Double => SimpleBondType::Double,
            BondOrder::Triple => SimpleBondType::Triple,
        }
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}
