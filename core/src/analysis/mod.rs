//! Player-visible analysis: what can be deduced from numbers and flags alone.

pub use constraints::*;
pub use observation::*;
pub use oracle::*;

mod constraints;
mod observation;
mod oracle;
