//! Iterative Ae3 equilibrium solver.
//!
//! Finds the austenite-finish temperature for an alloy at a given carbon
//! content by balancing the free energy of the alpha/gamma transformation
//! against the alloying-element interaction terms.
//!
//! # Algorithm
//!
//! 1. Rewrite the composition's C slot to the requested carbon and the Fe
//!    slot by difference to 100 wt%, then convert every weight to moles per
//!    100 g and normalise to mole fractions.
//! 2. Seed the iteration at the binary Fe-C boundary temperature
//!    $$T_0 = 1115 - 154 c + 17.5 (1.2 - c)^{7.5}$$ (c in wt%, T in K).
//! 3. Fixed-point iterate $T \leftarrow T_0 + z(T)$ where
//!    $z = \sum_i x_i a_i(T)$ accumulates the van 't Hoff boundary shift of
//!    every non-carbon, non-iron solute. Convergence is an update smaller
//!    than 0.5 K; the cap is 100 iterations.
//!
//! All arithmetic here is in Kelvin; callers convert at the boundary.

pub mod tables;

use crate::composition::AlloyComposition;
use crate::errors::{PhasekinError, PhasekinResult};
use crate::periodic::{self, NUM_ELEMENTS};
use log::{debug, trace};

/// Molar gas constant, J/(mol K).
pub const GAS_CONSTANT: f64 = 8.314462618;

/// Kelvin/Celsius offset used at the solver boundary.
pub const KELVIN_OFFSET: f64 = 273.0;

/// Convergence window for the fixed-point update, K.
pub const CONVERGENCE_WINDOW: f64 = 0.5;

/// Iteration cap for one solve.
pub const MAX_ITERATIONS: usize = 100;

/// In-flight state of one Ae3 solve, attached to failure diagnostics.
///
/// Created per call and discarded on return; never shared across calls.
#[derive(Debug, Clone)]
pub struct EquilibriumSolverState {
    /// Candidate boundary temperature, K.
    pub temperature: f64,
    /// Accumulated solute shift at the candidate temperature, K.
    pub z: f64,
    /// Free-energy terms at the candidate temperature, J/mol.
    pub dg_c: f64,
    pub dg_fe: f64,
    pub dh_c: f64,
    pub dh_fe: f64,
    /// Iterations consumed so far.
    pub iterations: usize,
    /// Normalised mole fractions, indexed per [`crate::periodic`].
    pub mole_fractions: [f64; NUM_ELEMENTS],
}

/// Convert a composition to normalised mole fractions at the given carbon
/// content. The C slot is overwritten and Fe is re-derived by difference,
/// which is why the solver owns its composition copy.
pub fn mole_fractions(
    mut composition: AlloyComposition,
    carbon_wt_pct: f64,
) -> PhasekinResult<[f64; NUM_ELEMENTS]> {
    if !carbon_wt_pct.is_finite() || carbon_wt_pct < 0.0 {
        return Err(PhasekinError::Configuration(format!(
            "carbon content must be non-negative, got {}",
            carbon_wt_pct
        )));
    }
    composition.set_weight(periodic::CARBON, carbon_wt_pct);
    composition.rebalance_iron()?;

    let mut moles = [0.0_f64; NUM_ELEMENTS];
    let mut total = 0.0;
    for (index, weight) in composition.iter() {
        moles[index] = weight / periodic::atomic_mass(index);
        total += moles[index];
    }
    for value in moles.iter_mut() {
        *value /= total;
    }
    Ok(moles)
}

/// Binary Fe-C austenite boundary temperature, K, as a function of the
/// carbon content in wt%.
pub fn tzero(carbon_wt_pct: f64) -> f64 {
    1115.0 - 154.0 * carbon_wt_pct + 17.5 * (1.2 - carbon_wt_pct).powf(7.5)
}

/// Effective transformation entropy at `temperature`, J/(mol K): the iron
/// term plus the carbon corrections from the transfer free energy and the
/// carbon self-interaction difference between the two phases.
fn effective_entropy(temperature: f64, x_carbon: f64) -> f64 {
    let ds_fe = (tables::dh_fe(temperature) - tables::dg_fe(temperature)) / temperature;
    let ds_c = (tables::dg_c(temperature) - tables::DH_C) / temperature;
    let d_eta11 = tables::eta11_up(temperature) - tables::eta11_down(temperature);
    ds_fe + x_carbon * ds_c + GAS_CONSTANT * d_eta11 * x_carbon * x_carbon
}

/// Boundary-temperature shift contributed by one solute per unit mole
/// fraction, K. Van 't Hoff partitioning of the solute between ferrite and
/// austenite, corrected by the carbon cross-interaction difference.
fn element_shift(element: usize, temperature: f64, x_carbon: f64) -> f64 {
    let dgi = match tables::transfer_energy(element) {
        Some(value) => value,
        None => return 0.0,
    };
    let f = GAS_CONSTANT * temperature / effective_entropy(temperature, x_carbon);
    let partition = (-dgi / (GAS_CONSTANT * temperature)).exp();
    let d_eta = tables::eta1n_up(element, temperature) - tables::eta1n_down(element, temperature);
    f * ((partition - 1.0) + x_carbon * d_eta)
}

fn state_at(
    temperature: f64,
    z: f64,
    iterations: usize,
    x: &[f64; NUM_ELEMENTS],
) -> EquilibriumSolverState {
    EquilibriumSolverState {
        temperature,
        z,
        dg_c: tables::dg_c(temperature),
        dg_fe: tables::dg_fe(temperature),
        dh_c: tables::DH_C,
        dh_fe: tables::dh_fe(temperature),
        iterations,
        mole_fractions: *x,
    }
}

/// Solve for the Ae3 temperature of `composition` at `carbon_wt_pct`,
/// returned in Kelvin.
pub fn solve(composition: AlloyComposition, carbon_wt_pct: f64) -> PhasekinResult<f64> {
    let x = mole_fractions(composition, carbon_wt_pct)?;
    let x_carbon = x[periodic::CARBON];
    let t0 = tzero(carbon_wt_pct);
    if !t0.is_finite() || t0 <= 0.0 {
        return Err(PhasekinError::InvalidEquilibriumState {
            temperature: t0,
            detail: format!("seed temperature for carbon {} wt%", carbon_wt_pct),
        });
    }

    let mut temperature = t0;
    let mut z = 0.0;
    for iteration in 0..MAX_ITERATIONS {
        z = 0.0;
        for (element, &fraction) in x.iter().enumerate() {
            if element == periodic::CARBON || element == periodic::IRON {
                continue;
            }
            if fraction != 0.0 {
                z += fraction * element_shift(element, temperature, x_carbon);
            }
        }
        let updated = t0 + z;
        trace!(
            "ae3 iteration {}: T = {:.4} K, z = {:.4}, T' = {:.4} K",
            iteration,
            temperature,
            z,
            updated
        );
        if !updated.is_finite() || updated <= 0.0 {
            return Err(PhasekinError::InvalidEquilibriumState {
                temperature: updated,
                detail: format!("iteration {} produced a non-physical temperature", iteration),
            });
        }
        if (updated - temperature).abs() < CONVERGENCE_WINDOW {
            debug!(
                "ae3 converged at {:.3} K after {} iterations (carbon {} wt%)",
                updated,
                iteration + 1,
                carbon_wt_pct
            );
            return Ok(updated);
        }
        temperature = updated;
    }

    let state = state_at(temperature, z, MAX_ITERATIONS, &x);
    debug!("ae3 failed to converge: {:?}", state);
    Err(PhasekinError::EquilibriumNotConverged {
        temperature: state.temperature,
        z: state.z,
        iterations: state.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::reference_alloy;
    use approx::assert_relative_eq;

    #[test]
    fn reference_alloy_mole_fractions() {
        let x = mole_fractions(reference_alloy(), 0.044).unwrap();
        assert_relative_eq!(x[periodic::CARBON], 0.0020397490929127764, epsilon = 1e-8);
        assert_relative_eq!(x[periodic::IRON], 0.9745566524629741, epsilon = 1e-8);
        let total: f64 = x.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn tzero_reference_value() {
        assert_relative_eq!(tzero(0.044), 1160.1305069880798, epsilon = 1e-8);
    }

    #[test]
    fn tzero_of_pure_iron_is_the_a3_point() {
        // 910 C, the alpha/gamma transition of carbon-free iron
        assert_relative_eq!(tzero(0.0) - KELVIN_OFFSET, 910.69, epsilon = 0.01);
    }

    #[test]
    fn reference_alloy_converges_to_the_fixture() {
        let ae3 = solve(reference_alloy(), 0.044).unwrap();
        assert_relative_eq!(ae3 - KELVIN_OFFSET, 845.838, epsilon = 1e-4);
    }

    #[test]
    fn solve_is_deterministic() {
        let a = solve(reference_alloy(), 0.044).unwrap();
        let b = solve(reference_alloy(), 0.044).unwrap();
        assert_eq!(a.to_bits(), b.to_bits(), "repeated solves must be bit-identical");
    }

    #[test]
    fn austenite_stabilisers_lower_ae3() {
        let binary = solve(reference_alloy(), 0.3).unwrap();
        // the reference alloy already carries Mn; push it further
        let rich = AlloyComposition::from_entries(&crate::composition::base_entries(&[
            ("C", 0.044),
            ("Mn", 3.0),
            ("Si", 0.22),
            ("Mo", 0.26),
        ]))
        .unwrap();
        let shifted = solve(rich, 0.3).unwrap();
        assert!(
            shifted < binary,
            "more Mn must depress Ae3: {} vs {}",
            shifted,
            binary
        );
    }

    #[test]
    fn ferrite_stabilisers_raise_ae3() {
        let base = solve(reference_alloy(), 0.2).unwrap();
        let rich = AlloyComposition::from_entries(&crate::composition::base_entries(&[
            ("C", 0.044),
            ("Mn", 1.73),
            ("Si", 1.5),
            ("Mo", 0.26),
        ]))
        .unwrap();
        let shifted = solve(rich, 0.2).unwrap();
        assert!(
            shifted > base,
            "more Si must raise Ae3: {} vs {}",
            shifted,
            base
        );
    }

    #[test]
    fn negative_carbon_is_rejected() {
        let err = solve(reference_alloy(), -0.1).unwrap_err();
        assert!(matches!(err, PhasekinError::Configuration(_)));
    }

    #[test]
    fn carbon_beyond_the_tzero_fit_is_a_solver_error() {
        // (1.2 - c)^7.5 leaves the real domain past 1.2 wt%
        let err = solve(reference_alloy(), 1.4).unwrap_err();
        assert!(matches!(err, PhasekinError::InvalidEquilibriumState { .. }));
    }
}
