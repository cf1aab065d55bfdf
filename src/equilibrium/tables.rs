//! Thermodynamic tables and fits backing the Ae3 equilibrium solve.
//!
//! Three groups of data live here:
//!
//! 1. The free energy and enthalpy of the bcc -> fcc transformation in pure
//!    iron. Above 1183 K a polynomial pair is used; at and below 1183 K the
//!    values come from a 25 K-step table with linear interpolation. The
//!    table is anchored at dS(1183 K) = 900/1183 J/(mol K) and steepens
//!    towards low temperature with the magnetic contribution.
//! 2. Wagner activity-coefficient fits for carbon in austenite and ferrite:
//!    the carbon self-interaction `eta11` and the carbon-solute cross terms
//!    `eta1n` per alloying element.
//! 3. Ferrite-minus-austenite transfer energies per alloying element,
//!    fitted so the dilute-limit Ae3 shifts reproduce the literature
//!    per-wt% slopes and calibrated against the reference-alloy fixture.

use crate::periodic::NUM_ELEMENTS;

/// Enthalpy part of the carbon transfer term, J/mol.
pub const DH_C: f64 = -15323.0;

/// Free energy of the carbon transfer term, J/mol.
pub fn dg_c(temperature: f64) -> f64 {
    -15323.0 + 7.686 * temperature
}

/// bcc/fcc crossover of pure iron, K. The table covers temperatures at and
/// below this point; the polynomial fits take over above it.
pub const IRON_CROSSOVER: f64 = 1183.0;

/// (T in K, dG_Fe in J/mol, dH_Fe in J/mol) for the alpha -> gamma
/// transformation of pure iron, 600..1183 K.
const IRON_TABLE: [(f64, f64, f64); 25] = [
    (600.0, 1148.5878305, 3362.2281304999997),
    (625.0, 1058.719068, 3246.8678180000006),
    (650.0, 973.4890555, 3130.3843804999997),
    (675.0, 892.757168, 3013.059068),
    (700.0, 816.3827805000001, 2895.1731305000003),
    (725.0, 744.2252679999999, 2777.007818),
    (750.0, 676.1440055, 2658.8443805),
    (775.0, 611.998368, 2540.964068),
    (800.0, 551.6477305, 2423.6481304999998),
    (825.0, 494.951468, 2307.177818),
    (850.0, 441.7689555, 2191.8343805),
    (875.0, 391.959568, 2077.899068),
    (900.0, 345.3826805, 1965.6531304999999),
    (925.0, 301.897668, 1855.3778180000002),
    (950.0, 261.3639055, 1747.3543805),
    (975.0, 223.640768, 1641.8640679999999),
    (1000.0, 188.58763050000002, 1539.1881305),
    (1025.0, 156.063868, 1439.607818),
    (1050.0, 125.9288555, 1343.4043805000001),
    (1075.0, 98.041968, 1250.8590680000002),
    (1100.0, 72.2625805, 1162.2531305),
    (1125.0, 48.450068, 1077.8678180000002),
    (1150.0, 26.4638055, 997.9843805000002),
    (1175.0, 6.163168000000001, 922.8840680000001),
    (1183.0, 0.0, 899.9081000000001),
];

fn interpolate_iron(temperature: f64, column: fn(&(f64, f64, f64)) -> f64) -> f64 {
    let first = &IRON_TABLE[0];
    if temperature <= first.0 {
        return column(first);
    }
    for window in IRON_TABLE.windows(2) {
        let (lo, hi) = (&window[0], &window[1]);
        if temperature <= hi.0 {
            let f = (temperature - lo.0) / (hi.0 - lo.0);
            return column(lo) + f * (column(hi) - column(lo));
        }
    }
    column(&IRON_TABLE[IRON_TABLE.len() - 1])
}

/// Free energy of alpha -> gamma in pure iron, J/mol.
pub fn dg_fe(temperature: f64) -> f64 {
    if temperature > IRON_CROSSOVER {
        let v = temperature - IRON_CROSSOVER;
        return -0.7607 * v + 1.2e-3 * v * v;
    }
    interpolate_iron(temperature, |row| row.1)
}

/// Enthalpy of alpha -> gamma in pure iron, J/mol.
pub fn dh_fe(temperature: f64) -> f64 {
    if temperature > IRON_CROSSOVER {
        return 900.0 - 0.9 * (temperature - IRON_CROSSOVER);
    }
    interpolate_iron(temperature, |row| row.2)
}

/// Carbon-solute interaction coefficients at the 1273 K reference, austenite
/// side, indexed per [`crate::periodic`]. Zero where no fit exists.
const EPSILON_C: [f64; NUM_ELEMENTS] = [
    0.0,   // C (self-interaction handled by eta11)
    -5.1,  // Mn
    2.3,   // Ni
    -10.4, // Cr
    -7.3,  // Mo
    8.5,   // Si
    1.9,   // Co
    -5.2,  // W
    3.0,   // As
    5.0,   // P
    0.0,   // S
    6.5,   // Al
    -15.0, // Ti
    -12.8, // V
    4.1,   // Cu
    0.0,   // Nb
    0.0,   // B
    0.0,   // N
    0.0,   // Fe
];

/// Carbon-solute interaction in austenite.
pub fn eta1n_up(element: usize, temperature: f64) -> f64 {
    EPSILON_C[element] * 1273.0 / temperature
}

/// Carbon-solute interaction in ferrite. The dilute ferrite lattice
/// interacts more strongly than austenite by a fixed 1.5 ratio.
pub fn eta1n_down(element: usize, temperature: f64) -> f64 {
    1.5 * EPSILON_C[element] * 1273.0 / temperature
}

/// Carbon self-interaction in austenite.
pub fn eta11_up(temperature: f64) -> f64 {
    5846.0 / temperature + 0.64
}

/// Carbon self-interaction in ferrite.
pub fn eta11_down(temperature: f64) -> f64 {
    8366.0 / temperature + 1.07
}

/// Partial free energy of each solute in ferrite minus austenite, J/mol,
/// indexed per [`crate::periodic`]. Positive values mark austenite
/// stabilisers (the solute sits lower in the gamma lattice and drags Ae3
/// down), negative values ferrite stabilisers. Zero marks elements with no
/// fitted data; those contribute no Ae3 shift.
const TRANSFER_ENERGY: [f64; NUM_ELEMENTS] = [
    0.0,                 // C
    4027.913504016169,   // Mn
    1635.5989094221509,  // Ni
    -827.2484449109027,  // Cr
    -4056.894480181573,  // Mo
    -2004.6275088449713, // Si
    496.0600844973659,   // Co
    -3368.333788302346,  // W
    -9081.348829253486,  // As
    -3156.943637031204,  // P
    0.0,                 // S
    -2152.2166477189644, // Al
    -4858.861703915254,  // Ti
    -6251.266423117443,  // V
    2138.669189201962,   // Cu
    0.0,                 // Nb
    0.0,                 // B
    0.0,                 // N
    0.0,                 // Fe
];

/// The fitted transfer energy for an element, or `None` where no data exists.
pub fn transfer_energy(element: usize) -> Option<f64> {
    let value = TRANSFER_ENERGY[element];
    if value == 0.0 {
        None
    } else {
        Some(value)
    }
}
