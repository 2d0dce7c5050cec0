//! Input loading: whitespace tables, radial profiles, the observed
//! correlation grid and the covariance matrix.

pub mod corr;
pub mod covariance;
pub mod profiles;
pub mod table;
