//! Phase simulation orchestration.
//!
//! Runs the three curve families of one simulation (the isothermal TTT
//! diagram, the continuous-cooling CCT diagram and the user cooling
//! profile) and assembles them into [`SimulationResults`]. The three
//! computations share nothing mutable: each reads the same resolved
//! configuration and owns its own result buffers, so they run on the
//! rayon pool and meet at a single join barrier. CCT is launched first
//! because it is by far the most expensive family.
//!
//! Every family is bounded by a shared wall-clock deadline; a run that
//! exceeds it fails with [`PhasekinError::Timeout`] instead of returning
//! partial results.

use crate::buffer::ResultBuffer;
use crate::composition::AlloyComposition;
use crate::configuration::SimulationConfiguration;
use crate::errors::{PhasekinError, PhasekinResult};
use crate::kinetics::{KineticsModel, Phase};
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Temperature step for the isothermal TTT scan, degrees C.
const TTT_TEMPERATURE_STEP: f64 = 1.0;

/// Temperature step for the additivity integration, degrees C.
const CCT_TEMPERATURE_STEP: f64 = 0.5;

/// Koistinen-Marburger rate constant for martensite, per degree C.
const MARTENSITE_RATE: f64 = 0.011;

/// Time span of the horizontal martensite line, log10 seconds.
const MARTENSITE_TIME_DECADES: (f64, f64) = (-3.0, 4.0);
const MARTENSITE_POINTS: usize = 50;

/// Ambient floor for the user cooling path, degrees C.
const AMBIENT_TEMPERATURE: f64 = 25.0;

/// Run-wide knobs that are not part of the metallurgical configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Wall-clock bound on the whole run
    /// default: 30 s
    pub timeout: Duration,
    /// Number of log-spaced cooling rates in the CCT scan
    /// default: 100
    pub cooling_rate_count: usize,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cooling_rate_count: 100,
        }
    }
}

/// One finished curve segment. For TTT and CCT the second column is a
/// temperature; for the user-cooling phase series it carries the phase
/// fraction, matching the shared buffer layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub time: Vec<f64>,
    pub temp: Vec<f64>,
}

impl Curve {
    fn from_buffer(buffer: ResultBuffer) -> Self {
        let (time, temp) = buffer.trim();
        Self { time, temp }
    }
}

/// Named curve segments of one family.
pub type CurveSet = IndexMap<String, Curve>;

/// Aggregate output of one orchestrated run. Only ever constructed with
/// all three families complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    #[serde(rename = "TTT")]
    pub ttt: CurveSet,
    #[serde(rename = "CCT")]
    pub cct: CurveSet,
    #[serde(rename = "USER")]
    pub user: CurveSet,
}

/// Shared wall-clock bound, checked from every computation loop.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self, stage: &'static str) -> PhasekinResult<()> {
        if self.started.elapsed() > self.limit {
            Err(PhasekinError::Timeout {
                stage,
                limit: self.limit,
            })
        } else {
            Ok(())
        }
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Ferrite => "ferrite",
        Phase::Pearlite => "pearlite",
        Phase::Bainite => "bainite",
    }
}

const DIFFUSIONAL_PHASES: [Phase; 3] = [Phase::Ferrite, Phase::Pearlite, Phase::Bainite];

/// A fully-resolved simulation, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfiguration,
    kinetics: KineticsModel,
    options: SimulationOptions,
}

impl Simulation {
    /// Resolve the configuration against the composition and precompute
    /// the kinetics. All input validation happens here; [`Self::run`]
    /// can only fail on numeric grounds or on the deadline.
    pub fn new(
        comp: &AlloyComposition,
        mut config: SimulationConfiguration,
        options: SimulationOptions,
    ) -> PhasekinResult<Self> {
        config.ensure_derived(comp)?;
        let kinetics = KineticsModel::new(
            config.method,
            comp,
            config.grain_size.astm(),
            config.ae1_temperature,
            config.ae3_temperature,
            config.bs_temperature,
        )?;
        info!(
            "simulation ready: ms = {:.3} C, bs = {:.3} C, ae1 = {:.3} C, ae3 = {:.3} C, xfe = {:.4}",
            config.ms_temperature,
            config.bs_temperature,
            config.ae1_temperature,
            config.ae3_temperature,
            config.xfe
        );
        Ok(Self {
            config,
            kinetics,
            options,
        })
    }

    pub fn configuration(&self) -> &SimulationConfiguration {
        &self.config
    }

    /// Compute all three curve families. CCT goes onto the pool first;
    /// assembly waits for all three, and any failure discards the rest.
    pub fn run(&self) -> PhasekinResult<SimulationResults> {
        let deadline = Deadline::new(self.options.timeout);
        let (cct, (ttt, user)) = rayon::join(
            || self.run_cct(&deadline),
            || {
                rayon::join(
                    || self.run_ttt(&deadline),
                    || self.run_user_cooling(&deadline),
                )
            },
        );
        Ok(SimulationResults {
            ttt: ttt?,
            cct: cct?,
            user: user?,
        })
    }

    /// One horizontal line at Ms spanning the diagram's time decades.
    fn martensite_curve(&self) -> Curve {
        let ms = self.config.ms_temperature;
        let (lo, hi) = MARTENSITE_TIME_DECADES;
        let mut buffer = ResultBuffer::new(MARTENSITE_POINTS);
        for i in 0..MARTENSITE_POINTS {
            let exponent = lo + (hi - lo) * i as f64 / (MARTENSITE_POINTS - 1) as f64;
            buffer.append(10f64.powf(exponent), ms);
        }
        Curve::from_buffer(buffer)
    }

    /// Isothermal diagram: per phase, the time to the nucleation and
    /// completion fractions at every whole degree between the phase
    /// boundary and Ms.
    fn run_ttt(&self, deadline: &Deadline) -> PhasekinResult<CurveSet> {
        let ms = self.config.ms_temperature;
        let start_fraction = self.config.nucleation_start / 100.0;
        let finish_fraction = self.config.nucleation_finish / 100.0;

        let mut curves = CurveSet::new();
        for phase in DIFFUSIONAL_PHASES {
            let mut nucleation = ResultBuffer::new(256);
            let mut completion = ResultBuffer::new(256);
            let mut temperature = self.kinetics.boundary(phase) - TTT_TEMPERATURE_STEP;
            while temperature > ms {
                deadline.check("TTT")?;
                nucleation.append(
                    self.kinetics.tau(phase, temperature, start_fraction)?,
                    temperature,
                );
                completion.append(
                    self.kinetics.tau(phase, temperature, finish_fraction)?,
                    temperature,
                );
                temperature -= TTT_TEMPERATURE_STEP;
            }
            debug!(
                "TTT {}: {} isothermal levels",
                phase_label(phase),
                nucleation.len()
            );
            curves.insert(
                format!("{}_nucleation", phase_label(phase)),
                Curve::from_buffer(nucleation),
            );
            curves.insert(
                format!("{}_completion", phase_label(phase)),
                Curve::from_buffer(completion),
            );
        }
        curves.insert("martensite".to_string(), self.martensite_curve());
        Ok(curves)
    }

    /// The log-spaced cooling rates of the CCT scan, degrees C per second.
    fn cct_rates(&self) -> Vec<f64> {
        let n = self.options.cooling_rate_count.max(2);
        (0..n)
            .map(|i| 10f64.powf(-2.0 + 4.0 * i as f64 / (n - 1) as f64))
            .collect()
    }

    /// Continuous-cooling diagram via Scheil additivity: along each
    /// constant-rate path, consume incubation as `dt / tau(T, X)` and
    /// record the (time, temperature) point where the sum reaches one.
    fn run_cct(&self, deadline: &Deadline) -> PhasekinResult<CurveSet> {
        let ms = self.config.ms_temperature;
        let start_temperature = self.config.start_temperature;
        let start_fraction = self.config.nucleation_start / 100.0;
        let finish_fraction = self.config.nucleation_finish / 100.0;
        // the sigmoidal part does not vary along a cooling path
        let start_sigmoid = self.kinetics.sigmoidal(start_fraction);
        let finish_sigmoid = self.kinetics.sigmoidal(finish_fraction);
        let rates = self.cct_rates();

        let mut curves = CurveSet::new();
        for phase in DIFFUSIONAL_PHASES {
            // incubation only accumulates over temperatures the cooling
            // path actually visits, so a quench starting below the phase
            // boundary enters the scan at its own start temperature
            let scan_top = self.kinetics.boundary(phase).min(start_temperature);
            let mut nucleation = ResultBuffer::new(rates.len());
            let mut completion = ResultBuffer::new(rates.len());
            for &rate in &rates {
                let dt = CCT_TEMPERATURE_STEP / rate;
                let mut nucleation_sum = 0.0;
                let mut completion_sum = 0.0;
                let mut nucleation_hit = false;
                let mut completion_hit = false;
                let mut temperature = scan_top - CCT_TEMPERATURE_STEP;
                while temperature > ms && !(nucleation_hit && completion_hit) {
                    deadline.check("CCT")?;
                    let elapsed = (start_temperature - temperature) / rate;
                    if !nucleation_hit {
                        nucleation_sum += dt
                            / (self.kinetics.thermal_factor(phase, temperature)? * start_sigmoid);
                        if nucleation_sum >= 1.0 {
                            nucleation.append(elapsed, temperature);
                            nucleation_hit = true;
                        }
                    }
                    if !completion_hit {
                        completion_sum += dt
                            / (self.kinetics.thermal_factor(phase, temperature)? * finish_sigmoid);
                        if completion_sum >= 1.0 {
                            completion.append(elapsed, temperature);
                            completion_hit = true;
                        }
                    }
                    temperature -= CCT_TEMPERATURE_STEP;
                }
            }
            debug!(
                "CCT {}: {} of {} rates reached nucleation",
                phase_label(phase),
                nucleation.len(),
                rates.len()
            );
            curves.insert(
                format!("{}_nucleation", phase_label(phase)),
                Curve::from_buffer(nucleation),
            );
            curves.insert(
                format!("{}_completion", phase_label(phase)),
                Curve::from_buffer(completion),
            );
        }
        curves.insert("martensite".to_string(), self.martensite_curve());
        Ok(curves)
    }

    /// Project the user's constant cooling rate through the kinetics:
    /// Scheil incubation first, then fraction growth by inverting the
    /// time-to-fraction relation, ferrite capped by the equilibrium
    /// fraction and pearlite by its complement. Below Ms the retained
    /// austenite converts athermally by Koistinen-Marburger.
    fn run_user_cooling(&self, deadline: &Deadline) -> PhasekinResult<CurveSet> {
        let rate = self.config.cooling_rate;
        let ms = self.config.ms_temperature;
        let start_fraction = self.config.nucleation_start / 100.0;
        let start_sigmoid = self.kinetics.sigmoidal(start_fraction);
        let dt = CCT_TEMPERATURE_STEP / rate;

        let mut cooling = ResultBuffer::new(1024);
        let mut fraction_buffers: [ResultBuffer; 3] =
            [ResultBuffer::new(256), ResultBuffer::new(256), ResultBuffer::new(256)];
        let mut martensite = ResultBuffer::new(256);

        #[derive(Clone, Copy)]
        struct GrowthState {
            incubation: f64,
            fraction: f64,
            nucleated: bool,
        }
        let mut states = [GrowthState {
            incubation: 0.0,
            fraction: 0.0,
            nucleated: false,
        }; 3];

        let mut temperature = self.config.start_temperature;
        let mut time = 0.0;
        let mut retained_austenite = None;
        cooling.append(time, temperature);

        while temperature - CCT_TEMPERATURE_STEP > AMBIENT_TEMPERATURE {
            deadline.check("USER")?;
            temperature -= CCT_TEMPERATURE_STEP;
            time += dt;
            cooling.append(time, temperature);

            if temperature > ms {
                for (index, phase) in DIFFUSIONAL_PHASES.into_iter().enumerate() {
                    if temperature >= self.kinetics.boundary(phase) {
                        continue;
                    }
                    let equilibrium_cap = match phase {
                        Phase::Ferrite => self.config.xfe,
                        Phase::Pearlite => 1.0 - self.config.xfe,
                        Phase::Bainite => 1.0,
                    };
                    // the phases draw on one shared pool of untransformed
                    // austenite, so each increment is bounded by both the
                    // phase's equilibrium cap and what is left of the pool
                    let transformed: f64 = states.iter().map(|s| s.fraction).sum();
                    let state = &mut states[index];
                    let headroom = (equilibrium_cap - state.fraction)
                        .min(1.0 - transformed)
                        .max(0.0);
                    if !state.nucleated {
                        state.incubation += dt
                            / (self.kinetics.thermal_factor(phase, temperature)? * start_sigmoid);
                        if state.incubation >= 1.0 {
                            state.nucleated = true;
                            state.fraction = start_fraction.min(headroom);
                            fraction_buffers[index].append(time, state.fraction);
                        }
                    } else if headroom > 0.0 {
                        let growth = (dt
                            / (self.kinetics.thermal_factor(phase, temperature)?
                                * self.kinetics.sigmoidal_derivative(state.fraction)))
                        .min(headroom);
                        state.fraction += growth;
                        fraction_buffers[index].append(time, state.fraction);
                    }
                }
            } else {
                let austenite = *retained_austenite.get_or_insert_with(|| {
                    (1.0 - states.iter().map(|s| s.fraction).sum::<f64>()).max(0.0)
                });
                let fraction = austenite * (1.0 - (-MARTENSITE_RATE * (ms - temperature)).exp());
                martensite.append(time, fraction);
            }
        }

        let mut curves = CurveSet::new();
        curves.insert("cooling".to_string(), Curve::from_buffer(cooling));
        for (index, phase) in DIFFUSIONAL_PHASES.into_iter().enumerate() {
            let buffer = std::mem::replace(&mut fraction_buffers[index], ResultBuffer::new(1));
            curves.insert(phase_label(phase).to_string(), Curve::from_buffer(buffer));
        }
        curves.insert("martensite".to_string(), Curve::from_buffer(martensite));
        Ok(curves)
    }
}
