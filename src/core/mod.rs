pub mod error;
pub mod roles;
pub mod types;

pub use error::{Result, SummaryError};
pub use roles::CoordinateRoles;
pub use types::{AxisLabel, GroupKey};
