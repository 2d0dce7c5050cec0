//! Background cosmology: growth factor, growth rate and Hubble factors.
//!
//! The model only needs a handful of quantities at the effective redshift of
//! the void sample: the linear growth factor D(z) (to normalize the sampled
//! fs8 against the fiducial sigma8), the growth rate f(z) (for reporting),
//! and the inverse comoving Hubble distance used to convert velocities into
//! displacements. Flat LambdaCDM throughout.

use crate::math::integrate::simpson_fn;

/// Sub-intervals for the growth-factor integral.
const GROWTH_STEPS: usize = 512;

/// Flat LambdaCDM background.
#[derive(Debug, Clone, Copy)]
pub struct Cosmology {
    /// Matter density parameter at z = 0.
    pub om_m: f64,
    /// Fiducial sigma8 at z = 0.
    pub s8: f64,
}

impl Cosmology {
    pub fn new(om_m: f64, s8: f64) -> Self {
        Self { om_m, s8 }
    }

    /// Dimensionless Hubble rate E(z) = H(z)/H0.
    pub fn ez(&self, z: f64) -> f64 {
        (self.om_m * (1.0 + z).powi(3) + 1.0 - self.om_m).sqrt()
    }

    /// Matter density parameter at redshift z.
    pub fn omega_m(&self, z: f64) -> f64 {
        self.om_m * (1.0 + z).powi(3) / self.ez(z).powi(2)
    }

    /// Linear growth factor D(z), normalized to D(0) = 1.
    ///
    /// Computed from the standard integral
    /// `D(a) ~ (5 Om/2) E(a) * int_0^a da' / (a' E(a'))^3`.
    pub fn growth_factor(&self, z: f64) -> f64 {
        self.growth_unnormalized(1.0 / (1.0 + z)) / self.growth_unnormalized(1.0)
    }

    /// Growth rate f(z) = dlnD/dlna, in the Omega_m(z)^0.55 approximation.
    pub fn growth_rate(&self, z: f64) -> f64 {
        self.omega_m(z).powf(0.55)
    }

    /// fsigma8 at redshift z for the fiducial cosmology.
    pub fn fs8(&self, z: f64) -> f64 {
        self.growth_rate(z) * self.s8 * self.growth_factor(z)
    }

    /// sigma8 scaled to redshift z, the normalization for the sampled fs8.
    pub fn s8norm(&self, z: f64) -> f64 {
        self.s8 * self.growth_factor(z)
    }

    /// Inverse comoving Hubble distance (1 + z) / (100 E(z)), in Mpc/h per km/s.
    pub fn inv_ahubble(&self, z: f64) -> f64 {
        (1.0 + z) / (100.0 * self.ez(z))
    }

    fn growth_unnormalized(&self, a: f64) -> f64 {
        let ez_of_a = |a: f64| {
            (self.om_m / a.powi(3) + 1.0 - self.om_m).sqrt()
        };
        // The integrand vanishes as a'^(3/2) at a' = 0, but evaluating it
        // exactly at zero produces 0 * inf; start at a tiny positive value.
        let integral = simpson_fn(
            |ap| {
                let e = ez_of_a(ap);
                1.0 / (ap * e).powi(3)
            },
            1e-8,
            a,
            GROWTH_STEPS,
        );
        2.5 * self.om_m * ez_of_a(a) * integral
    }
}
