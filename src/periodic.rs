//! Periodic-table lookup for the elements the transformation models use.
//!
//! Compositions are stored as fixed-length weight-% arrays indexed by the
//! element constants below. The index order is the order the equilibrium
//! solver iterates in; iron is always last.

/// Number of recognised elements.
pub const NUM_ELEMENTS: usize = 19;

pub const CARBON: usize = 0;
pub const MANGANESE: usize = 1;
pub const NICKEL: usize = 2;
pub const CHROMIUM: usize = 3;
pub const MOLYBDENUM: usize = 4;
pub const SILICON: usize = 5;
pub const COBALT: usize = 6;
pub const TUNGSTEN: usize = 7;
pub const ARSENIC: usize = 8;
pub const PHOSPHORUS: usize = 9;
pub const SULPHUR: usize = 10;
pub const ALUMINIUM: usize = 11;
pub const TITANIUM: usize = 12;
pub const VANADIUM: usize = 13;
pub const COPPER: usize = 14;
pub const NIOBIUM: usize = 15;
pub const BORON: usize = 16;
pub const NITROGEN: usize = 17;
pub const IRON: usize = 18;

/// Element symbols in index order.
pub const SYMBOLS: [&str; NUM_ELEMENTS] = [
    "C", "Mn", "Ni", "Cr", "Mo", "Si", "Co", "W", "As", "P", "S", "Al", "Ti",
    "V", "Cu", "Nb", "B", "N", "Fe",
];

/// Standard atomic masses in g/mol, index order matching [`SYMBOLS`].
pub const ATOMIC_MASS: [f64; NUM_ELEMENTS] = [
    12.0107,     // C
    54.938044,   // Mn
    58.6934,     // Ni
    51.9961,     // Cr
    95.95,       // Mo
    28.0855,     // Si
    58.933194,   // Co
    183.84,      // W
    74.921595,   // As
    30.973762,   // P
    32.065,      // S
    26.9815385,  // Al
    47.867,      // Ti
    50.9415,     // V
    63.546,      // Cu
    92.90637,    // Nb
    10.811,      // B
    14.0067,     // N
    55.845,      // Fe
];

/// Elements every composition must supply explicitly (iron included, even
/// though its weight is always re-derived by difference).
pub const REQUIRED: [usize; 10] = [
    CARBON, MANGANESE, NICKEL, CHROMIUM, MOLYBDENUM, SILICON, COBALT,
    TUNGSTEN, ARSENIC, IRON,
];

/// Look up the index for an element symbol. Case-sensitive.
pub fn index_of(symbol: &str) -> Option<usize> {
    SYMBOLS.iter().position(|s| *s == symbol)
}

/// The symbol for an element index.
pub fn symbol(index: usize) -> &'static str {
    SYMBOLS[index]
}

/// The atomic mass for an element index, in g/mol.
pub fn atomic_mass(index: usize) -> f64 {
    ATOMIC_MASS[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip() {
        for (i, s) in SYMBOLS.iter().enumerate() {
            assert_eq!(index_of(s), Some(i), "index lookup for {} failed", s);
            assert_eq!(symbol(i), *s);
        }
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        assert_eq!(index_of("Xx"), None);
        assert_eq!(index_of("fe"), None, "symbol lookup is case-sensitive");
        assert_eq!(index_of(""), None);
    }

    #[test]
    fn iron_is_the_last_index() {
        assert_eq!(IRON, NUM_ELEMENTS - 1);
        assert_eq!(symbol(IRON), "Fe");
    }

    #[test]
    fn masses_are_physical() {
        for (i, m) in ATOMIC_MASS.iter().enumerate() {
            assert!(*m > 1.0 && *m < 250.0, "mass for {} out of range", symbol(i));
        }
        // spot checks against the standard table
        assert!((atomic_mass(CARBON) - 12.0107).abs() < 1e-12);
        assert!((atomic_mass(IRON) - 55.845).abs() < 1e-12);
    }
}
