//! Periodic-table lookups needed by the SMILES reader and the mapping
//! heuristics: symbols, default valences and the metal classification used
//! when pricing bond breaks.

static SYMBOLS: [&str; 119] = [
    "*", //
    "H", "He", //
    "Li", "Be", "B", "C", "N", "O", "F", "Ne", //
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", //
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se",
    "Br", "Kr", //
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb",
    "Te", "I", "Xe", //
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm",
    "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po",
    "At", "Rn", //
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md",
    "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv",
    "Ts", "Og",
];

pub const CARBON: u8 = 6;
pub const NITROGEN: u8 = 7;
pub const OXYGEN: u8 = 8;
pub const SULFUR: u8 = 16;

/// Atomic number for an element symbol. Case sensitive, `"*"` is not an element.
pub fn atomic_num_from_symbol(symbol: &str) -> Option<u8> {
    SYMBOLS
        .iter()
        .skip(1)
        .position(|&s| s == symbol)
        .map(|i| (i + 1) as u8)
}

pub fn symbol(atomic_num: u8) -> &'static str {
    SYMBOLS.get(atomic_num as usize).copied().unwrap_or("*")
}

/// Valences used to derive implicit hydrogens of bare organic-subset atoms.
pub fn default_valences(atomic_num: u8) -> &'static [u8] {
    match atomic_num {
        1 => &[1],
        5 => &[3],
        6 => &[4],
        7 | 15 | 33 => &[3, 5],
        8 => &[2],
        9 | 17 | 35 | 85 => &[1],
        14 | 32 => &[4],
        16 | 34 | 52 => &[2, 4, 6],
        53 => &[1, 3, 5, 7],
        _ => &[],
    }
}

/// Boron, silicon, germanium, arsenic, antimony and tellurium count as
/// non-metals here.
pub fn is_metal(atomic_num: u8) -> bool {
    matches!(
        atomic_num,
        3 | 4 | 11 | 12 | 13 | 19..=31 | 37..=50 | 55..=84 | 87..=118
    )
}
