//! Numerical utilities: interpolation, quadrature, smoothing, root finding
//! and Legendre multipole projection.

pub mod integrate;
pub mod multipole;
pub mod root;
pub mod smooth;
pub mod spline;

pub use integrate::*;
pub use multipole::*;
pub use root::*;
pub use smooth::*;
pub use spline::*;
