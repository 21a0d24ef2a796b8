pub mod elementwise;
pub mod sampling;
pub mod summary;

pub use elementwise::combine;
pub use sampling::{SamplingError, random_pdf};
pub use summary::{PeakEstimate, compute_onesig_pdf, percentile, summarize_draws};
