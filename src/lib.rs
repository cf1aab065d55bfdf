//! Steel phase-transformation kinetics.
//!
//! Predicts how a steel alloy transforms on cooling from austenite:
//! the isothermal TTT and continuous-cooling CCT diagrams, plus the
//! phase evolution along a user-supplied cooling path, all derived from
//! an alloy composition and a handful of configuration knobs.
//!
//! The pipeline runs leaf-first:
//!
//! 1. [`composition`] parses and validates the raw element entries.
//! 2. [`configuration`] derives the boundary temperatures (Ms and Bs
//!    from closed-form regressions, Ae1 from a three-model literature
//!    average and Ae3 from the iterative [`equilibrium`] solver), plus
//!    the equilibrium ferrite fraction by a lever rule over a swept
//!    Ae3(carbon) curve.
//! 3. [`kinetics`] turns the resolved boundaries into isothermal
//!    time-to-fraction relations for the selected model family.
//! 4. [`simulation`] orchestrates the three concurrent curve families
//!    and assembles [`SimulationResults`].
//!
//! ```no_run
//! use phasekin::{AlloyComposition, ElementEntry, Simulation,
//!                SimulationConfiguration, SimulationOptions};
//!
//! # fn main() -> phasekin::PhasekinResult<()> {
//! let entries: Vec<ElementEntry> = serde_json::from_str(
//!     r#"[{"symbol": "C", "weight": 0.044}, {"symbol": "Mn", "weight": 1.73},
//!         {"symbol": "Si", "weight": 0.22}, {"symbol": "Mo", "weight": 0.26},
//!         {"symbol": "Ni", "weight": 0.0}, {"symbol": "Cr", "weight": 0.0},
//!         {"symbol": "Co", "weight": 0.0}, {"symbol": "W", "weight": 0.0},
//!         {"symbol": "As", "weight": 0.0}, {"symbol": "Fe", "weight": 0.0}]"#,
//! )
//! .unwrap();
//! let comp = AlloyComposition::from_entries(&entries)?;
//! let sim = Simulation::new(
//!     &comp,
//!     SimulationConfiguration::default(),
//!     SimulationOptions::default(),
//! )?;
//! let results = sim.run()?;
//! println!("{}", serde_json::to_string(&results).unwrap());
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod composition;
pub mod configuration;
pub mod equilibrium;
pub mod errors;
pub mod kinetics;
pub mod periodic;
pub mod simulation;

pub use composition::{AlloyComposition, ElementEntry};
pub use configuration::{
    GrainSize, GrainSizeKind, SimulationConfiguration, TransformationMethod, XfeOptions,
};
pub use errors::{PhasekinError, PhasekinResult};
pub use kinetics::{KineticsModel, Phase};
pub use simulation::{Curve, CurveSet, Simulation, SimulationOptions, SimulationResults};
