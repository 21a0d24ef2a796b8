pub mod errors;

pub use errors::{StackError, StackErrorCategory, StackResult, TableResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const BIN_ID_COLUMN: &str = "bin_ID";
pub const DETECTION_COLUMN: &str = "Detection";

/// Emission lines measured in every stacked spectrum, in fitting order.
///
/// The position of a line in [`EmissionLine::ALL`] is also its sampling seed
/// offset, so the order must stay fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmissionLine {
    Oii3727,
    HDelta,
    HGamma,
    Oiii4363,
    HBeta,
    Oiii4958,
    Oiii5007,
}

impl EmissionLine {
    pub const ALL: [EmissionLine; 7] = [
        Self::Oii3727,
        Self::HDelta,
        Self::HGamma,
        Self::Oiii4363,
        Self::HBeta,
        Self::Oiii4958,
        Self::Oiii5007,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Oii3727 => "OII_3727",
            Self::HDelta => "HDELTA",
            Self::HGamma => "HGAMMA",
            Self::Oiii4363 => "OIII_4363",
            Self::HBeta => "HBETA",
            Self::Oiii4958 => "OIII_4958",
            Self::Oiii5007 => "OIII_5007",
        }
    }

    /// Rest-frame wavelength in Angstrom.
    pub const fn wavelength(self) -> f64 {
        match self {
            Self::Oii3727 => 3726.18,
            Self::HDelta => 4101.73,
            Self::HGamma => 4340.46,
            Self::Oiii4363 => 4363.21,
            Self::HBeta => 4861.32,
            Self::Oiii4958 => 4958.91,
            Self::Oiii5007 => 5006.84,
        }
    }

    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|line| *line == self)
            .unwrap_or_default()
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|line| line.as_str().eq_ignore_ascii_case(label.trim()))
    }

    pub fn flux_column(self) -> String {
        format!("{}_Flux_Gaussian", self.as_str())
    }

    pub fn observed_flux_column(self) -> String {
        format!("{}_Flux_Observed", self.as_str())
    }

    pub fn rms_column(self) -> String {
        format!("{}_RMS", self.as_str())
    }
}

impl Display for EmissionLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Named flux ratios produced by the ratio builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FluxRatio {
    LogR23,
    LogO32,
    TwoBeta,
    ThreeBeta,
    R,
    HgHb,
    HdHb,
}

impl FluxRatio {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogR23 => "logR23",
            Self::LogO32 => "logO32",
            Self::TwoBeta => "two_beta",
            Self::ThreeBeta => "three_beta",
            Self::R => "R",
            Self::HgHb => "HgHb",
            Self::HdHb => "HdHb",
        }
    }
}

impl Display for FluxRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Temperature and metallicity-family quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DerivedProperty {
    Temperature,
    LogOxygenAbundance,
    LogSinglyIonized,
    LogDoublyIonized,
    SinglyIonized,
    DoublyIonized,
}

impl DerivedProperty {
    pub const ALL: [DerivedProperty; 6] = [
        Self::Temperature,
        Self::LogOxygenAbundance,
        Self::LogSinglyIonized,
        Self::LogDoublyIonized,
        Self::SinglyIonized,
        Self::DoublyIonized,
    ];

    pub const METALLICITY: [DerivedProperty; 5] = [
        Self::LogOxygenAbundance,
        Self::LogSinglyIonized,
        Self::LogDoublyIonized,
        Self::SinglyIonized,
        Self::DoublyIonized,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "T_e",
            Self::LogOxygenAbundance => "12+log(O/H)",
            Self::LogSinglyIonized => "log(O+/H)",
            Self::LogDoublyIonized => "log(O++/H)",
            Self::SinglyIonized => "O+/H",
            Self::DoublyIonized => "O++/H",
        }
    }
}

impl Display for DerivedProperty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Balmer decrement used to infer nebular attenuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BalmerSource {
    #[default]
    HgHb,
    HdHb,
}

impl BalmerSource {
    pub const fn ratio(self) -> FluxRatio {
        match self {
            Self::HgHb => FluxRatio::HgHb,
            Self::HdHb => FluxRatio::HdHb,
        }
    }

    pub const fn numerator(self) -> EmissionLine {
        match self {
            Self::HgHb => EmissionLine::HGamma,
            Self::HdHb => EmissionLine::HDelta,
        }
    }
}

/// Value of the validation table's `Detection` column for a bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionFlag {
    Reliable,
    Marginal,
    NonDetection,
    Other(f64),
}

impl DetectionFlag {
    pub fn from_value(value: f64) -> Self {
        if value == 1.0 {
            Self::Reliable
        } else if value == 0.5 {
            Self::Marginal
        } else if value == 0.0 {
            Self::NonDetection
        } else {
            Self::Other(value)
        }
    }

    pub const fn is_reliable(self) -> bool {
        matches!(self, Self::Reliable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RunMode {
    /// Formulas evaluated once on nominal fluxes.
    Deterministic,
    /// Monte Carlo randomization of every line.
    #[default]
    Ensemble,
}

impl RunMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Ensemble => "ensemble",
        }
    }
}

impl Display for RunMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationRequest {
    pub directory: PathBuf,
    pub mode: RunMode,
    pub apply_dust: bool,
    pub revised_validation: bool,
}

impl PropagationRequest {
    pub fn new(directory: impl Into<PathBuf>, mode: RunMode) -> Self {
        Self {
            directory: directory.into(),
            mode,
            apply_dust: false,
            revised_validation: true,
        }
    }

    pub fn with_dust(mut self, apply_dust: bool) -> Self {
        self.apply_dust = apply_dust;
        self
    }

    pub fn with_revised_validation(mut self, revised: bool) -> Self {
        self.revised_validation = revised;
        self
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub overwritten: bool,
}

impl OutputArtifact {
    pub fn new(path: impl Into<PathBuf>, overwritten: bool) -> Self {
        Self {
            path: path.into(),
            overwritten,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}
