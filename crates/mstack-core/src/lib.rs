//! Uncertainty propagation for stacked emission-line spectra: flux-ratio
//! building, dust attenuation, electron temperatures and oxygen abundances
//! over nominal measurements or Monte Carlo ensembles.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
