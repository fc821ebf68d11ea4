//! Lifecycle detector: flags candidate documents a baseline document appears to have
//! superseded, absorbed or duplicated.
//!
//! Classification of the best match score `s`:
//!
//! | score                         | tier   | verification  |
//! |-------------------------------|--------|---------------|
//! | `s >= high` (0.70 transient)  | HIGH   | `NotNeeded`   |
//! | `0.40 <= s < high`            | MEDIUM | `Pending`     |
//! | `s < 0.40`                    | -      | discarded     |

mod error;
pub mod naming;
mod scanner;
mod types;

#[cfg(test)]
mod tests;

pub use error::DetectorError;
pub use naming::transient_pattern;
pub use scanner::{DetectorConfig, LifecycleDetector};
pub use types::{Candidate, DetectionType, ScanReport, Tier, VerificationStatus};
pub(crate) use types::output_order;
