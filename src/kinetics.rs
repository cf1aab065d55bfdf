//! Isothermal transformation kinetics.
//!
//! Implements the time-to-fraction relation $\tau(T, X) = f(T) \cdot S(X)$
//! for the diffusional phases in both supported model families. The thermal
//! part $f(T)$ combines an alloy composition factor, an austenite grain
//! size term, an undercooling power law and an Arrhenius diffusion term;
//! the sigmoidal part $S(X)$ is the phase-fraction integral evaluated with
//! a fixed-resolution midpoint rule.
//!
//! Li98 uses per-phase grain exponents with a shared activation energy of
//! 27500 cal/mol; Kirkaldy83 shares one grain term of $2^{(G-1)/2}$ and
//! varies the diffusion term per phase, including a two-path effective
//! diffusion for pearlite where Cr and Mo retard the boundary reaction.

use crate::composition::AlloyComposition;
use crate::configuration::TransformationMethod;
use crate::errors::{PhasekinError, PhasekinResult};
use crate::periodic;
use serde::{Deserialize, Serialize};

/// Gas constant in cal/(mol K), matching the regression fits.
pub const R_CAL: f64 = 1.987;

/// Shared Arrhenius activation energy, cal/mol.
const ACTIVATION_ENERGY: f64 = 27500.0;

/// Midpoint-rule resolution for the sigmoidal integrals.
const SIGMOID_INTERVALS: usize = 400;

/// Keeps the singular integrand endpoints out of reach.
const FRACTION_FLOOR: f64 = 1e-10;

/// The diffusional product phases. Martensite is athermal and handled
/// separately by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Ferrite,
    Pearlite,
    Bainite,
}

/// Precomputed kinetics for one alloy, grain size and model family.
///
/// Construction front-loads everything that does not depend on temperature
/// or fraction, so the inner simulation loops only pay for the power law,
/// one exponential and the sigmoidal term.
#[derive(Debug, Clone)]
pub struct KineticsModel {
    method: TransformationMethod,
    ferrite_factor: f64,
    pearlite_factor: f64,
    bainite_factor: f64,
    /// Per-phase 2^(n G) terms; identical across phases for Kirkaldy83.
    grain_terms: [f64; 3],
    ae1: f64,
    ae3: f64,
    bs: f64,
    /// Retained for the Kirkaldy83 pearlite diffusion term.
    chromium: f64,
    molybdenum: f64,
}

impl KineticsModel {
    pub fn new(
        method: TransformationMethod,
        comp: &AlloyComposition,
        grain_astm: f64,
        ae1: f64,
        ae3: f64,
        bs: f64,
    ) -> PhasekinResult<Self> {
        let c = comp.weight(periodic::CARBON);
        let mn = comp.weight(periodic::MANGANESE);
        let si = comp.weight(periodic::SILICON);
        let ni = comp.weight(periodic::NICKEL);
        let cr = comp.weight(periodic::CHROMIUM);
        let mo = comp.weight(periodic::MOLYBDENUM);

        let (ferrite_factor, pearlite_factor, bainite_factor, grain_terms) = match method {
            TransformationMethod::Li98 => (
                (1.00 + 6.31 * c + 1.78 * mn + 0.31 * si + 1.12 * ni + 2.70 * cr + 4.06 * mo)
                    .exp(),
                (-4.25 + 4.12 * c + 4.36 * mn + 0.44 * si + 1.71 * ni + 3.33 * cr
                    + 5.19 * mo.sqrt())
                .exp(),
                (-10.23 + 10.18 * c + 0.85 * mn + 0.55 * ni + 0.90 * cr + 0.36 * mo).exp(),
                [
                    2f64.powf(0.41 * grain_astm),
                    2f64.powf(0.32 * grain_astm),
                    2f64.powf(0.29 * grain_astm),
                ],
            ),
            TransformationMethod::Kirkaldy83 => {
                let shared = 2f64.powf((grain_astm - 1.0) / 2.0);
                (
                    59.6 * mn + 1.45 * ni + 67.7 * cr + 244.0 * mo,
                    1.79 + 5.42 * (cr + mo + 4.0 * mo * ni),
                    (2.34 + 10.1 * c + 3.8 * cr + 19.0 * mo) * 1e-4,
                    [shared; 3],
                )
            }
        };

        let model = Self {
            method,
            ferrite_factor,
            pearlite_factor,
            bainite_factor,
            grain_terms,
            ae1,
            ae3,
            bs,
            chromium: cr,
            molybdenum: mo,
        };
        for phase in [Phase::Ferrite, Phase::Pearlite, Phase::Bainite] {
            let factor = model.composition_factor(phase);
            if !factor.is_finite() || factor <= 0.0 {
                return Err(PhasekinError::Numeric(format!(
                    "{:?} composition factor must be positive and finite, got {}",
                    phase, factor
                )));
            }
        }
        Ok(model)
    }

    fn composition_factor(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Ferrite => self.ferrite_factor,
            Phase::Pearlite => self.pearlite_factor,
            Phase::Bainite => self.bainite_factor,
        }
    }

    /// The temperature above which the phase cannot form, degrees C.
    pub fn boundary(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Ferrite => self.ae3,
            Phase::Pearlite => self.ae1,
            Phase::Bainite => self.bs,
        }
    }

    fn undercooling_exponent(&self, phase: Phase) -> f64 {
        match (self.method, phase) {
            (TransformationMethod::Li98, Phase::Bainite) => 2.0,
            (TransformationMethod::Li98, _) => 3.0,
            (TransformationMethod::Kirkaldy83, Phase::Bainite) => 2.0,
            (TransformationMethod::Kirkaldy83, _) => 3.0,
        }
    }

    fn diffusion(&self, phase: Phase, kelvin: f64) -> f64 {
        match self.method {
            TransformationMethod::Li98 => (-ACTIVATION_ENERGY / (R_CAL * kelvin)).exp(),
            TransformationMethod::Kirkaldy83 => match phase {
                Phase::Ferrite => (-23500.0 / (R_CAL * kelvin)).exp(),
                Phase::Pearlite => {
                    let boundary = (-ACTIVATION_ENERGY / (R_CAL * kelvin)).exp();
                    let alloy = (-37000.0 / (R_CAL * kelvin)).exp();
                    1.0 / (1.0 / boundary
                        + (0.01 * self.chromium + 0.52 * self.molybdenum) / alloy)
                }
                Phase::Bainite => (-ACTIVATION_ENERGY / (R_CAL * kelvin)).exp(),
            },
        }
    }

    /// Temperature-only part of the time-to-fraction relation, seconds per
    /// unit of sigmoidal progress. Fails above the phase boundary where
    /// the undercooling vanishes.
    pub fn thermal_factor(&self, phase: Phase, temperature: f64) -> PhasekinResult<f64> {
        let undercooling = self.boundary(phase) - temperature;
        if undercooling <= 0.0 {
            return Err(PhasekinError::Numeric(format!(
                "{:?} has no driving force at {} C (boundary {} C)",
                phase,
                temperature,
                self.boundary(phase)
            )));
        }
        let kelvin = temperature + 273.0;
        let grain = self.grain_terms[phase as usize];
        let q = self.undercooling_exponent(phase);
        Ok(self.composition_factor(phase)
            / (grain * undercooling.powf(q) * self.diffusion(phase, kelvin)))
    }

    fn exponents(&self, fraction: f64) -> (f64, f64) {
        match self.method {
            TransformationMethod::Li98 => (0.4 * (1.0 - fraction), 0.4 * fraction),
            TransformationMethod::Kirkaldy83 => {
                (2.0 * (1.0 - fraction) / 3.0, 2.0 * fraction / 3.0)
            }
        }
    }

    /// The sigmoidal integral S(X), midpoint rule over (0, X). The
    /// integrand is singular at both endpoints but integrable; midpoint
    /// sampling never touches them.
    pub fn sigmoidal(&self, fraction: f64) -> f64 {
        let upper = fraction.clamp(FRACTION_FLOOR, 1.0 - FRACTION_FLOOR);
        let width = upper / SIGMOID_INTERVALS as f64;
        let mut sum = 0.0;
        for k in 0..SIGMOID_INTERVALS {
            let u = upper * (k as f64 + 0.5) / SIGMOID_INTERVALS as f64;
            sum += self.sigmoidal_derivative(u);
        }
        sum * width
    }

    /// The integrand dS/dX, used directly by fraction-growth stepping.
    pub fn sigmoidal_derivative(&self, fraction: f64) -> f64 {
        let u = fraction.clamp(FRACTION_FLOOR, 1.0 - FRACTION_FLOOR);
        let (a, b) = self.exponents(u);
        1.0 / (u.powf(a) * (1.0 - u).powf(b))
    }

    /// Isothermal time to reach `fraction` at `temperature`, seconds.
    pub fn tau(&self, phase: Phase, temperature: f64, fraction: f64) -> PhasekinResult<f64> {
        Ok(self.thermal_factor(phase, temperature)? * self.sigmoidal(fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::reference_alloy;
    use approx::assert_relative_eq;

    fn li98_model() -> KineticsModel {
        KineticsModel::new(
            TransformationMethod::Li98,
            &reference_alloy(),
            8.0,
            700.902,
            845.838,
            563.238,
        )
        .unwrap()
    }

    fn kirkaldy_model() -> KineticsModel {
        KineticsModel::new(
            TransformationMethod::Kirkaldy83,
            &reference_alloy(),
            8.0,
            700.902,
            845.838,
            582.238,
        )
        .unwrap()
    }

    #[test]
    fn li98_composition_factors() {
        let model = li98_model();
        assert_relative_eq!(model.ferrite_factor, 240.04826325006593, epsilon = 1e-9);
        assert_relative_eq!(model.pearlite_factor, 501.33328907210995, epsilon = 1e-9);
        assert_relative_eq!(model.bainite_factor, 0.0002697594289593596, epsilon = 1e-15);
    }

    #[test]
    fn kirkaldy_composition_factors() {
        let model = kirkaldy_model();
        assert_relative_eq!(model.ferrite_factor, 166.548, epsilon = 1e-9);
        assert_relative_eq!(model.pearlite_factor, 3.1992, epsilon = 1e-9);
        assert_relative_eq!(model.bainite_factor, 7.7244e-4, epsilon = 1e-12);
    }

    #[test]
    fn li98_sigmoidal_reference_values() {
        let model = li98_model();
        assert_relative_eq!(model.sigmoidal(0.01), 0.10371205459006759, max_relative = 1e-12);
        assert_relative_eq!(model.sigmoidal(0.5), 1.0193084745330743, max_relative = 1e-12);
        assert_relative_eq!(model.sigmoidal(0.999), 2.0141883843709474, max_relative = 1e-12);
    }

    #[test]
    fn kirkaldy_sigmoidal_is_steeper() {
        let model = kirkaldy_model();
        assert_relative_eq!(model.sigmoidal(0.5), 2.0245498337876935, max_relative = 1e-12);
        assert!(model.sigmoidal(0.5) > li98_model().sigmoidal(0.5));
    }

    #[test]
    fn sigmoidal_derivative_matches_the_integrand() {
        let model = li98_model();
        assert_relative_eq!(
            model.sigmoidal_derivative(0.5),
            1.3195079107728944,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            model.sigmoidal_derivative(0.01),
            6.194659779407263,
            max_relative = 1e-12
        );
    }

    #[test]
    fn li98_thermal_factors_at_reference_temperatures() {
        let model = li98_model();
        assert_relative_eq!(
            model.thermal_factor(Phase::Ferrite, 700.0).unwrap(),
            11.987155580101144,
            max_relative = 1e-5
        );
        assert_relative_eq!(
            model.thermal_factor(Phase::Pearlite, 650.0).unwrap(),
            2095.7084976157366,
            max_relative = 1e-5
        );
        assert_relative_eq!(
            model.thermal_factor(Phase::Bainite, 500.0).unwrap(),
            0.8059970190199375,
            max_relative = 1e-5
        );
    }

    #[test]
    fn kirkaldy_thermal_factors_at_reference_temperatures() {
        let model = kirkaldy_model();
        assert_relative_eq!(
            model.thermal_factor(Phase::Ferrite, 700.0).unwrap(),
            0.9019828912228218,
            max_relative = 1e-5
        );
        assert_relative_eq!(
            model.thermal_factor(Phase::Pearlite, 650.0).unwrap(),
            174.41487291288982,
            max_relative = 1e-5
        );
        assert_relative_eq!(
            model.thermal_factor(Phase::Bainite, 500.0).unwrap(),
            0.6023062017202832,
            max_relative = 1e-5
        );
    }

    #[test]
    fn tau_combines_thermal_and_sigmoidal_parts() {
        let model = li98_model();
        let tau = model.tau(Phase::Ferrite, 700.0, 0.01).unwrap();
        assert_relative_eq!(tau, 1.243212533903083, max_relative = 1e-5);
        // More transformation always takes longer at a fixed temperature.
        assert!(model.tau(Phase::Ferrite, 700.0, 0.5).unwrap() > tau);
    }

    #[test]
    fn no_driving_force_above_the_boundary() {
        let model = li98_model();
        let err = model.thermal_factor(Phase::Pearlite, 720.0).unwrap_err();
        assert!(matches!(err, PhasekinError::Numeric(_)));
    }

    #[test]
    fn zero_ferrite_factor_is_rejected() {
        use crate::composition::{base_entries, AlloyComposition};
        // Plain iron-carbon: the Kirkaldy ferrite factor has no alloying
        // terms to draw on and collapses to zero.
        let comp = AlloyComposition::from_entries(&base_entries(&[("C", 0.1)])).unwrap();
        let err = KineticsModel::new(
            TransformationMethod::Kirkaldy83,
            &comp,
            8.0,
            710.0,
            850.0,
            600.0,
        )
        .unwrap_err();
        assert!(matches!(err, PhasekinError::Numeric(_)));
    }
}
