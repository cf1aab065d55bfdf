//! Simulation configuration and the derived boundary temperatures.
//!
//! Owns the user-facing knobs of one run plus the four temperatures the
//! curve generation hangs off: Ms and Bs from the Li98/Kirkaldy83 linear
//! regressions, Ae1 as the unweighted mean of three literature regressions
//! (Andrews 1965; Eldis, in Barralis 1982; Grange 1961, converted from
//! Fahrenheit), and Ae3 from the iterative equilibrium solver. The
//! equilibrium ferrite fraction Xfe comes from a lever rule on the swept
//! Ae3(carbon) curve.
//!
//! All derivation operations are deterministic, idempotent pure functions
//! of the composition (plus the already-computed Ae1 where noted).

use crate::composition::AlloyComposition;
use crate::equilibrium::{self, KELVIN_OFFSET};
use crate::errors::{PhasekinError, PhasekinResult};
use crate::periodic;
use log::debug;
use serde::{Deserialize, Serialize};

/// Assumed carbon content of ferrite for the lever rule, wt%.
pub const FERRITE_CARBON: f64 = 0.012;

/// Which empirical model family drives the kinetics and the Ms/Bs
/// regressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformationMethod {
    Li98,
    Kirkaldy83,
}

impl Default for TransformationMethod {
    fn default() -> Self {
        TransformationMethod::Li98
    }
}

/// How the grain size value is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrainSizeKind {
    /// ASTM E112 grain size number.
    Astm,
    /// Mean grain diameter in micrometres.
    Diameter,
}

/// Austenite grain size, type plus value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrainSize {
    pub kind: GrainSizeKind,
    pub value: f64,
}

impl GrainSize {
    /// The ASTM grain size number, converting from a mean diameter where
    /// needed (d = 254 * 2^(-(G-1)/2) micrometres).
    pub fn astm(&self) -> f64 {
        match self.kind {
            GrainSizeKind::Astm => self.value,
            GrainSizeKind::Diameter => 1.0 + 2.0 * (254.0 / self.value).log2(),
        }
    }
}

impl Default for GrainSize {
    fn default() -> Self {
        Self {
            kind: GrainSizeKind::Astm,
            value: 8.0,
        }
    }
}

/// Sweep bounds for the Xfe eutectoid search. The carbon bound is the
/// retry knob for alloys whose Ae3 curve meets Ae1 late.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XfeOptions {
    /// Upper bound of the swept carbon grid
    /// unit: wt%
    /// default: 1.0
    pub carbon_limit: f64,
    /// Number of uniform grid steps
    /// default: 1000
    pub steps: usize,
}

impl Default for XfeOptions {
    fn default() -> Self {
        Self {
            carbon_limit: 1.0,
            steps: 1000,
        }
    }
}

/// Outcome of the lever-rule sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XfeResult {
    /// Equilibrium ferrite fraction, 0..1.
    pub ferrite_fraction: f64,
    /// First grid carbon where Ae3 dropped to Ae1, wt%.
    pub eutectic_carbon: f64,
}

/// Full input to a simulation run.
///
/// Mutated only by [`SimulationConfiguration::ensure_derived`], which
/// resolves the auto-calculated fields; read-only during orchestration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfiguration {
    pub method: TransformationMethod,
    pub grain_size: GrainSize,
    /// Transformed fraction marking a nucleation curve
    /// unit: %
    /// default: 1.0
    pub nucleation_start: f64,
    /// Transformed fraction marking a completion curve
    /// unit: %
    /// default: 99.9
    pub nucleation_finish: f64,
    /// Recompute Ms and Bs from the composition before running
    /// default: true
    pub auto_calculate_ms_bs: bool,
    /// Martensite start, degrees C (resolved if auto-calculated)
    pub ms_temperature: f64,
    /// Bainite start, degrees C (resolved if auto-calculated)
    pub bs_temperature: f64,
    /// Recompute Ae1 and Ae3 from the composition before running
    /// default: true
    pub auto_calculate_ae: bool,
    /// Lower critical temperature, degrees C
    pub ae1_temperature: f64,
    /// Upper critical temperature, degrees C
    pub ae3_temperature: f64,
    /// Recompute the equilibrium ferrite fraction before running
    /// default: true
    pub auto_calculate_xfe: bool,
    /// Equilibrium ferrite fraction, 0..1
    pub xfe: f64,
    /// Temperature the cooling paths start from
    /// unit: degrees C
    /// default: 900.0
    pub start_temperature: f64,
    /// User cooling rate
    /// unit: degrees C per second
    /// default: 10.0
    pub cooling_rate: f64,
    pub xfe_options: XfeOptions,
}

impl Default for SimulationConfiguration {
    fn default() -> Self {
        Self {
            method: TransformationMethod::default(),
            grain_size: GrainSize::default(),
            nucleation_start: 1.0,
            nucleation_finish: 99.9,
            auto_calculate_ms_bs: true,
            ms_temperature: 0.0,
            bs_temperature: 0.0,
            auto_calculate_ae: true,
            ae1_temperature: 0.0,
            ae3_temperature: 0.0,
            auto_calculate_xfe: true,
            xfe: 0.0,
            start_temperature: 900.0,
            cooling_rate: 10.0,
            xfe_options: XfeOptions::default(),
        }
    }
}

/// Bainite start temperature, degrees C.
pub fn get_bs(method: TransformationMethod, comp: &AlloyComposition) -> f64 {
    let c = comp.weight(periodic::CARBON);
    let mn = comp.weight(periodic::MANGANESE);
    let ni = comp.weight(periodic::NICKEL);
    let cr = comp.weight(periodic::CHROMIUM);
    let mo = comp.weight(periodic::MOLYBDENUM);
    match method {
        TransformationMethod::Li98 => {
            637.0 - 58.0 * c - 35.0 * mn - 15.0 * ni - 34.0 * cr - 41.0 * mo
        }
        TransformationMethod::Kirkaldy83 => {
            656.0 - 58.0 * c - 35.0 * mn - 15.0 * ni - 34.0 * cr - 41.0 * mo
        }
    }
}

/// Martensite start temperature, degrees C.
pub fn get_ms(method: TransformationMethod, comp: &AlloyComposition) -> f64 {
    let c = comp.weight(periodic::CARBON);
    let mn = comp.weight(periodic::MANGANESE);
    let ni = comp.weight(periodic::NICKEL);
    let cr = comp.weight(periodic::CHROMIUM);
    let mo = comp.weight(periodic::MOLYBDENUM);
    match method {
        TransformationMethod::Li98 => {
            let co = comp.weight(periodic::COBALT);
            let si = comp.weight(periodic::SILICON);
            539.0 - 423.0 * c - 30.4 * mn - 17.7 * ni - 12.1 * cr - 7.5 * mo + 10.0 * co
                - 7.5 * si
        }
        TransformationMethod::Kirkaldy83 => {
            561.0 - 474.0 * c - 33.0 * mn - 17.0 * ni - 17.0 * cr - 21.0 * mo
        }
    }
}

/// Lower and upper critical temperatures, degrees C. Ae1 averages three
/// independent literature regressions with equal weight; Ae3 delegates to
/// the equilibrium solver at the alloy's actual carbon content.
pub fn calc_ae1_ae3(comp: &AlloyComposition) -> PhasekinResult<(f64, f64)> {
    let mn = comp.weight(periodic::MANGANESE);
    let ni = comp.weight(periodic::NICKEL);
    let si = comp.weight(periodic::SILICON);
    let cr = comp.weight(periodic::CHROMIUM);
    let mo = comp.weight(periodic::MOLYBDENUM);
    let w = comp.weight(periodic::TUNGSTEN);
    let arsenic = comp.weight(periodic::ARSENIC);

    let andrews =
        723.0 - 10.7 * mn - 16.9 * ni + 29.1 * si + 16.9 * cr + 290.0 * arsenic + 6.38 * w;
    let eldis = 712.0 - 17.8 * mn - 19.1 * ni + 20.1 * si + 11.9 * cr + 9.8 * mo;
    let grange = (1333.0 - 25.0 * mn + 40.0 * si + 42.0 * cr - 26.0 * ni - 32.0) / 1.8;
    let ae1 = (andrews + eldis + grange) / 3.0;

    let ae3 = equilibrium::solve(comp.clone(), comp.carbon())? - KELVIN_OFFSET;
    Ok((ae1, ae3))
}

/// Equilibrium ferrite fraction by the lever rule.
///
/// Sweeps the equilibrium solver over a uniform carbon grid holding the
/// other elements fixed, takes the eutectic carbon as the first grid point
/// where Ae3 drops to Ae1, and interpolates between it and the assumed
/// ferrite carbon content [`FERRITE_CARBON`].
pub fn xfe_method2(
    comp: &AlloyComposition,
    ae1: f64,
    options: &XfeOptions,
) -> PhasekinResult<XfeResult> {
    if options.steps == 0 || options.carbon_limit <= 0.0 {
        return Err(PhasekinError::Configuration(
            "xfe sweep needs a positive carbon bound and step count".to_string(),
        ));
    }
    for i in 1..=options.steps {
        let carbon = options.carbon_limit * i as f64 / options.steps as f64;
        let ae3 = equilibrium::solve(comp.clone(), carbon)? - KELVIN_OFFSET;
        if ae3 <= ae1 {
            let ferrite_fraction = (carbon - comp.carbon()) / (carbon - FERRITE_CARBON);
            debug!(
                "eutectoid crossing at {} wt% C (ae3 = {:.3}, ae1 = {:.3}), xfe = {:.6}",
                carbon, ae3, ae1, ferrite_fraction
            );
            return Ok(XfeResult {
                ferrite_fraction,
                eutectic_carbon: carbon,
            });
        }
    }
    Err(PhasekinError::EutectoidNotFound {
        carbon_limit: options.carbon_limit,
    })
}

impl SimulationConfiguration {
    /// Resolve every auto-calculated field from the composition. Must run
    /// before any curve generation; fields with the flag unset keep their
    /// supplied values.
    pub fn ensure_derived(&mut self, comp: &AlloyComposition) -> PhasekinResult<()> {
        if self.auto_calculate_ms_bs {
            self.ms_temperature = get_ms(self.method, comp);
            self.bs_temperature = get_bs(self.method, comp);
        }
        if self.auto_calculate_ae {
            let (ae1, ae3) = calc_ae1_ae3(comp)?;
            self.ae1_temperature = ae1;
            self.ae3_temperature = ae3;
        }
        if self.auto_calculate_xfe {
            let result = xfe_method2(comp, self.ae1_temperature, &self.xfe_options)?;
            self.xfe = result.ferrite_fraction;
        }
        self.validate()
    }

    /// Entry precondition for the orchestrator.
    pub fn validate(&self) -> PhasekinResult<()> {
        let check = |ok: bool, message: String| {
            if ok {
                Ok(())
            } else {
                Err(PhasekinError::Configuration(message))
            }
        };
        check(
            self.ms_temperature > 0.0,
            format!("Ms must be positive, got {}", self.ms_temperature),
        )?;
        check(
            self.bs_temperature > 0.0,
            format!("Bs must be positive, got {}", self.bs_temperature),
        )?;
        check(
            self.ae1_temperature > 0.0,
            format!("Ae1 must be positive, got {}", self.ae1_temperature),
        )?;
        check(
            self.ae3_temperature > self.ae1_temperature,
            format!(
                "Ae1 must lie below Ae3, got {} vs {}",
                self.ae1_temperature, self.ae3_temperature
            ),
        )?;
        check(
            self.nucleation_start > 0.0 && self.nucleation_start < self.nucleation_finish,
            format!(
                "nucleation window must satisfy 0 < start < finish, got {}..{}",
                self.nucleation_start, self.nucleation_finish
            ),
        )?;
        check(
            self.nucleation_finish < 100.0,
            format!(
                "nucleation finish must stay below 100%, got {}",
                self.nucleation_finish
            ),
        )?;
        check(
            self.grain_size.value > 0.0,
            format!("grain size must be positive, got {}", self.grain_size.value),
        )?;
        check(
            self.cooling_rate > 0.0,
            format!("cooling rate must be positive, got {}", self.cooling_rate),
        )?;
        check(
            self.start_temperature > 0.0,
            format!(
                "start temperature must be positive, got {}",
                self.start_temperature
            ),
        )?;
        check(
            self.xfe > 0.0 && self.xfe <= 1.0,
            format!("xfe must lie in (0, 1], got {}", self.xfe),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{base_entries, reference_alloy};
    use approx::assert_relative_eq;

    #[test]
    fn ms_bs_reference_values() {
        let comp = reference_alloy();
        assert_relative_eq!(
            get_ms(TransformationMethod::Li98, &comp),
            464.196,
            epsilon = 1e-4
        );
        assert_relative_eq!(
            get_bs(TransformationMethod::Li98, &comp),
            563.238,
            epsilon = 1e-4
        );
        assert_relative_eq!(
            get_ms(TransformationMethod::Kirkaldy83, &comp),
            477.594,
            epsilon = 1e-4
        );
        assert_relative_eq!(
            get_bs(TransformationMethod::Kirkaldy83, &comp),
            582.238,
            epsilon = 1e-4
        );
    }

    #[test]
    fn derivations_are_deterministic() {
        let comp = reference_alloy();
        let a = get_ms(TransformationMethod::Li98, &comp);
        let b = get_ms(TransformationMethod::Li98, &comp);
        assert_eq!(a.to_bits(), b.to_bits());
        let (ae1_a, ae3_a) = calc_ae1_ae3(&comp).unwrap();
        let (ae1_b, ae3_b) = calc_ae1_ae3(&comp).unwrap();
        assert_eq!(ae1_a.to_bits(), ae1_b.to_bits());
        assert_eq!(ae3_a.to_bits(), ae3_b.to_bits());
    }

    #[test]
    fn ae1_ae3_reference_values() {
        let (ae1, ae3) = calc_ae1_ae3(&reference_alloy()).unwrap();
        assert_relative_eq!(ae1, 700.902, epsilon = 1e-3);
        assert_relative_eq!(ae3, 845.838, epsilon = 1e-4);
    }

    #[test]
    fn xfe_reference_value() {
        let comp = reference_alloy();
        let (ae1, _) = calc_ae1_ae3(&comp).unwrap();
        let result = xfe_method2(&comp, ae1, &XfeOptions::default()).unwrap();
        assert_relative_eq!(result.eutectic_carbon, 0.823, epsilon = 1e-12);
        assert_relative_eq!(result.ferrite_fraction, 0.9605425400739827, epsilon = 1e-6);
    }

    #[test]
    fn ae1_stays_below_ae3_across_a_corpus() {
        let corpus: [(&[(&str, f64)], f64); 5] = [
            (&[("Mn", 1.73), ("Si", 0.22), ("Mo", 0.26)], 0.044),
            (
                &[("Mn", 0.8), ("Si", 0.3), ("Cr", 1.0), ("Ni", 0.5), ("Mo", 0.2)],
                0.1,
            ),
            (&[("Mn", 0.45), ("Si", 0.25)], 0.2),
            (
                &[
                    ("Mn", 1.4),
                    ("Si", 0.25),
                    ("Cr", 0.5),
                    ("Mo", 0.25),
                    ("Ni", 1.5),
                ],
                0.17,
            ),
            (
                &[("Mn", 0.75), ("Si", 0.3), ("Cr", 0.8), ("Mo", 0.15)],
                0.38,
            ),
        ];
        for (alloying, carbon) in corpus {
            let mut overrides = alloying.to_vec();
            overrides.push(("C", carbon));
            let comp = AlloyComposition::from_entries(&base_entries(&overrides)).unwrap();
            let (ae1, ae3) = calc_ae1_ae3(&comp).unwrap();
            assert!(
                ae1 < ae3,
                "Ae1 {} must lie below Ae3 {} for carbon {}",
                ae1,
                ae3,
                carbon
            );
        }
    }

    #[test]
    fn tight_sweep_bound_reports_no_crossing() {
        let comp = reference_alloy();
        let options = XfeOptions {
            carbon_limit: 0.1,
            steps: 50,
        };
        let err = xfe_method2(&comp, 700.902, &options).unwrap_err();
        assert!(matches!(
            err,
            PhasekinError::EutectoidNotFound { carbon_limit } if carbon_limit == 0.1
        ));
    }

    #[test]
    fn ensure_derived_resolves_auto_fields() {
        let comp = reference_alloy();
        let mut config = SimulationConfiguration::default();
        config.ensure_derived(&comp).unwrap();
        assert_relative_eq!(config.ms_temperature, 464.196, epsilon = 1e-4);
        assert_relative_eq!(config.ae3_temperature, 845.838, epsilon = 1e-4);
        assert!(config.xfe > 0.9 && config.xfe < 1.0);
    }

    #[test]
    fn manual_fields_survive_derivation() {
        let comp = reference_alloy();
        let mut config = SimulationConfiguration {
            auto_calculate_ms_bs: false,
            ms_temperature: 400.0,
            bs_temperature: 550.0,
            auto_calculate_xfe: false,
            xfe: 0.8,
            ..SimulationConfiguration::default()
        };
        config.ensure_derived(&comp).unwrap();
        assert_eq!(config.ms_temperature, 400.0);
        assert_eq!(config.bs_temperature, 550.0);
        assert_eq!(config.xfe, 0.8);
        // Ae values were still auto-calculated
        assert_relative_eq!(config.ae1_temperature, 700.902, epsilon = 1e-3);
    }

    #[test]
    fn inverted_critical_temperatures_fail_validation() {
        let config = SimulationConfiguration {
            auto_calculate_ms_bs: false,
            auto_calculate_ae: false,
            auto_calculate_xfe: false,
            ms_temperature: 400.0,
            bs_temperature: 550.0,
            ae1_temperature: 800.0,
            ae3_temperature: 700.0,
            xfe: 0.9,
            ..SimulationConfiguration::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PhasekinError::Configuration(_)));
    }

    #[test]
    fn diameter_grain_size_converts_to_astm() {
        let grain = GrainSize {
            kind: GrainSizeKind::Diameter,
            value: 22.4,
        };
        // 22.4 um is close to ASTM 8
        assert_relative_eq!(grain.astm(), 8.0, epsilon = 0.05);
        let astm = GrainSize {
            kind: GrainSizeKind::Astm,
            value: 9.0,
        };
        assert_eq!(astm.astm(), 9.0);
    }
}
