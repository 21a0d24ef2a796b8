pub mod archive;
pub mod attenuation;
pub mod composite;
pub mod propagation;
pub mod ratios;
pub mod serialization;
pub mod table;
pub mod temperature;

mod traits;

pub use propagation::{
    DerivedQuantities, DeterministicPass, EnsemblePropagation, PropagationReport,
    derive_properties, run_propagation, strategy_for,
};
pub use traits::PropagationStrategy;
