//! Prior, likelihood and combined log-probability.
//!
//! The sampler only ever sees two pure functions of the parameter vector.
//! The likelihood uses the Sellentin-Heavens form: because the covariance is
//! estimated from a finite number of mock realizations, the Gaussian
//! chi-squared is replaced by a Student-t-like expression
//! `-(nmocks/2) ln(1 + chi2/(nmocks-1))`.

use nalgebra::DVector;

use crate::error::AppError;
use crate::model::RsdModel;

impl RsdModel {
    /// Flat prior: exactly 0.0 strictly inside every bound, -inf otherwise.
    pub fn log_prior(&self, theta: &[f64]) -> f64 {
        let bounds = self.variant().prior_bounds();
        if theta.len() != bounds.len() {
            return f64::NEG_INFINITY;
        }
        for (&v, &(lo, hi)) in theta.iter().zip(bounds.iter()) {
            if !(v > lo && v < hi) {
                return f64::NEG_INFINITY;
            }
        }
        0.0
    }

    /// Log-likelihood, with numerical failures surfaced as errors.
    ///
    /// The only runtime failure mode is numerical (a displacement root that
    /// does not converge for an extreme proposal); [`Self::log_likelihood`]
    /// maps it to rejection.
    pub fn try_log_likelihood(&self, theta: &[f64]) -> Result<f64, AppError> {
        let (mono, quad) = self.theory(theta)?;

        let model_vec = if self.full_fit() {
            DVector::from_iterator(mono.len() + quad.len(), mono.into_iter().chain(quad))
        } else {
            DVector::from_vec(quad)
        };

        let diff = model_vec - self.data_vector();
        let chi2 = self.cov().chi2(&diff);
        let n = self.nmocks() as f64;
        Ok(-n / 2.0 * (1.0 + chi2 / (n - 1.0)).ln())
    }

    /// Log-likelihood as the sampler sees it: failed evaluations reject.
    pub fn log_likelihood(&self, theta: &[f64]) -> f64 {
        self.try_log_likelihood(theta).unwrap_or(f64::NEG_INFINITY)
    }

    /// Combined log-probability with the prior short-circuit: an out-of-prior
    /// point never pays for a model evaluation.
    pub fn log_probability(&self, theta: &[f64]) -> f64 {
        let lp = self.log_prior(theta);
        if !lp.is_finite() {
            return f64::NEG_INFINITY;
        }
        lp + self.log_likelihood(theta)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DMatrix;

    use crate::domain::{FittingWindow, ModelVariant};
    use crate::io::corr::CorrelationGrid;
    use crate::io::covariance::Covariance;
    use crate::io::profiles::{integrated_contrast, RadialProfile};
    use crate::math::integrate::linspace;
    use crate::math::smooth::gradient;
    use crate::model::{ModelOptions, ProfileSet, RsdModel};

    fn profile(f: impl Fn(f64) -> f64) -> RadialProfile {
        let r: Vec<f64> = (1..=120).map(|i| i as f64).collect();
        let y: Vec<f64> = r.iter().map(|&ri| f(ri)).collect();
        RadialProfile::new(r, y).unwrap()
    }

    fn null_profiles() -> ProfileSet {
        let delta_r = profile(|_| 0.0);
        let big_delta_r = integrated_contrast(&delta_r).unwrap();
        ProfileSet {
            xi_r: profile(|_| 0.0),
            delta_r,
            big_delta_r,
            sv: Some(profile(|_| 1.0)),
            vr: None,
            dvr: None,
        }
    }

    fn null_grid(s: &[f64]) -> CorrelationGrid {
        let mu = linspace(-1.0, 1.0, 40);
        let xi = vec![vec![0.0; mu.len()]; s.len()];
        CorrelationGrid::new(s.to_vec(), mu, xi).unwrap()
    }

    fn options(n: usize) -> (Covariance, ModelOptions) {
        let cov = Covariance::new(DMatrix::identity(n, n)).unwrap();
        let opts = ModelOptions {
            window: FittingWindow { smin: 0.0, smax: 200.0 },
            full_fit: true,
            s8norm: 0.628,
            iah: 0.0066,
            nmocks: 300,
            mu_points: 1000,
        };
        (cov, opts)
    }

    fn null_model(variant: ModelVariant) -> RsdModel {
        let s = [10.0, 20.0, 30.0, 40.0];
        let (cov, opts) = options(2 * s.len());
        RsdModel::new(variant, null_profiles(), &null_grid(&s), cov, opts).unwrap()
    }

    #[test]
    fn prior_is_zero_inside_and_neg_inf_on_bounds() {
        let m = null_model(ModelVariant::Streaming);
        assert_eq!(m.log_prior(&[0.5, 360.0, 1.0]), 0.0);
        // Bounds are exclusive.
        assert_eq!(m.log_prior(&[0.1, 360.0, 1.0]), f64::NEG_INFINITY);
        assert_eq!(m.log_prior(&[0.1 + 1e-9, 360.0, 1.0]), 0.0);
        assert_eq!(m.log_prior(&[2.0, 360.0, 1.0]), f64::NEG_INFINITY);
        assert_eq!(m.log_prior(&[0.5, 1.0, 1.0]), f64::NEG_INFINITY);
        assert_eq!(m.log_prior(&[0.5, 360.0, 1.2]), f64::NEG_INFINITY);
        // Wrong dimensionality rejects.
        assert_eq!(m.log_prior(&[0.5, 1.0]), f64::NEG_INFINITY);
    }

    #[test]
    fn null_kaiser_model_predicts_zero_moments() {
        let s = [10.0, 20.0, 30.0, 40.0];
        let (cov, opts) = options(2 * s.len());
        let m = RsdModel::new(ModelVariant::Kaiser, null_profiles(), &null_grid(&s), cov, opts)
            .unwrap();

        let (mono, quad) = m.theory(&[0.0, 1.0]).unwrap();
        for (a, b) in mono.iter().zip(quad.iter()) {
            assert!(a.abs() < 1e-12, "monopole {a}");
            assert!(b.abs() < 1e-12, "quadrupole {b}");
        }
    }

    #[test]
    fn null_streaming_model_predicts_zero_moments() {
        // The +/-3 sigma displacement window truncates ~0.27% of the Gaussian
        // mass, which shows up as a small constant offset in the monopole;
        // the quadrupole of a mu-independent offset still vanishes. A small
        // dispersion keeps the geometric O((sigma_v/s)^2) remainder below
        // the quadrupole tolerance.
        let m = null_model(ModelVariant::Streaming);
        let (mono, quad) = m.theory(&[0.0, 5.0, 1.0]).unwrap();
        for (a, b) in mono.iter().zip(quad.iter()) {
            assert!(*a < 0.0 && a.abs() < 4e-3, "monopole {a}");
            assert!(b.abs() < 1e-4, "quadrupole {b}");
        }
    }

    fn infall_profiles(vr_fn: impl Fn(f64) -> f64) -> ProfileSet {
        let r: Vec<f64> = (1..=120).map(|i| i as f64).collect();
        let vr_values: Vec<f64> = r.iter().map(|&ri| vr_fn(ri)).collect();
        let dvr_values = gradient(&r, &vr_values);
        let mut set = null_profiles();
        set.vr = Some(RadialProfile::new(r.clone(), vr_values).unwrap());
        set.dvr = Some(RadialProfile::new(r, dvr_values).unwrap());
        set
    }

    #[test]
    fn null_infall_model_predicts_zero_moments() {
        // With a zero velocity profile the displacement equation collapses to
        // rpar = spar and the kernel Jacobian is 1, so the prediction is the
        // pure (wider, +/-5 sigma) Gaussian integral: both moments vanish to
        // quadrature accuracy.
        let s = [10.0, 20.0, 30.0, 40.0];
        let (cov, opts) = options(2 * s.len());
        let m = RsdModel::new(
            ModelVariant::Infall,
            infall_profiles(|_| 0.0),
            &null_grid(&s),
            cov,
            opts,
        )
        .unwrap();

        let (mono, quad) = m.theory(&[0.0, 5.0, 1.0]).unwrap();
        for (a, b) in mono.iter().zip(quad.iter()) {
            assert!(a.abs() < 1e-5, "monopole {a}");
            assert!(b.abs() < 1e-5, "quadrupole {b}");
        }
    }

    #[test]
    fn infall_model_with_smooth_velocity_profile_evaluates_finitely() {
        // A smooth void-like velocity profile: the root solve, the
        // velocity-divergence Jacobian and the likelihood all stay finite at
        // an interior parameter point, including under anisotropic rescaling.
        let profiles = infall_profiles(|r| -80.0 * (r / 25.0) * (-(r / 25.0).powi(2)).exp());
        let s = [10.0, 20.0, 30.0, 40.0];
        let (cov, opts) = options(2 * s.len());
        let m = RsdModel::new(ModelVariant::Infall, profiles, &null_grid(&s), cov, opts).unwrap();

        let (mono, quad) = m.theory(&[0.45, 50.0, 1.05]).unwrap();
        assert!(mono.iter().chain(quad.iter()).all(|v| v.is_finite()));
        let lp = m.log_probability(&[0.45, 50.0, 1.05]);
        assert!(lp.is_finite(), "log-probability {lp}");
    }

    #[test]
    fn infall_evaluation_failure_rejects_the_proposal() {
        // A negative dispersion profile makes the local Gaussian width
        // invalid; the evaluation error must reject the proposal instead of
        // propagating a best-effort value.
        let mut profiles = infall_profiles(|_| 0.0);
        let r: Vec<f64> = (1..=120).map(|i| i as f64).collect();
        profiles.sv = Some(RadialProfile::new(r.clone(), vec![-1.0; r.len()]).unwrap());

        let s = [10.0, 20.0, 30.0, 40.0];
        let (cov, opts) = options(2 * s.len());
        let m = RsdModel::new(ModelVariant::Infall, profiles, &null_grid(&s), cov, opts).unwrap();

        assert!(m.try_log_likelihood(&[0.45, 50.0, 1.0]).is_err());
        assert_eq!(m.log_likelihood(&[0.45, 50.0, 1.0]), f64::NEG_INFINITY);
        assert_eq!(m.log_probability(&[0.45, 50.0, 1.0]), f64::NEG_INFINITY);
    }

    #[test]
    fn likelihood_is_zero_when_model_equals_data() {
        let s = [10.0, 20.0, 30.0, 40.0];
        let (cov, opts) = options(2 * s.len());
        let m = RsdModel::new(ModelVariant::Kaiser, null_profiles(), &null_grid(&s), cov, opts)
            .unwrap();
        // Theory and data are both exactly zero, so chi2 = 0 and
        // log L = -(n/2) ln(1) = 0 regardless of the covariance.
        let ll = m.try_log_likelihood(&[0.0, 1.0]).unwrap();
        assert!(ll.abs() < 1e-12, "log-likelihood {ll}");
    }

    #[test]
    fn kaiser_reduces_to_real_space_correlation_without_growth() {
        let xi_r = profile(|r| 0.8 * (-r / 25.0).exp() - 0.05);
        let delta_r = profile(|r| -0.9 * (-r / 15.0).exp());
        let big_delta_r = integrated_contrast(&delta_r).unwrap();
        let profiles = ProfileSet {
            xi_r: xi_r.clone(),
            delta_r,
            big_delta_r,
            sv: None,
            vr: None,
            dvr: None,
        };

        let s = [12.0, 25.0, 50.0];
        let (cov, opts) = options(2 * s.len());
        let m = RsdModel::new(ModelVariant::Kaiser, profiles, &null_grid(&s), cov, opts).unwrap();

        // fs8 = 0, epsilon = 1: the prediction is xi_r(s) at every angle, so
        // the monopole recovers xi_r and the quadrupole vanishes.
        let (mono, quad) = m.theory(&[0.0, 1.0]).unwrap();
        for (i, &si) in s.iter().enumerate() {
            assert!((mono[i] - xi_r.eval(si)).abs() < 1e-9, "mono[{i}]");
            assert!(quad[i].abs() < 1e-9, "quad[{i}]");
        }
    }

    #[test]
    fn prior_short_circuit_skips_model_evaluation() {
        let m = null_model(ModelVariant::Streaming);
        // Out-of-prior point: log_probability must be -inf.
        assert_eq!(m.log_probability(&[5.0, 360.0, 1.0]), f64::NEG_INFINITY);
        // In-prior point on the null model: prior 0 + likelihood 0.
        let lp = m.log_probability(&[0.5, 5.0, 1.0]);
        assert!(lp.is_finite());
    }

    #[test]
    fn covariance_dimension_mismatch_is_fatal_at_construction() {
        let s = [10.0, 20.0, 30.0, 40.0];
        let (cov, opts) = options(3); // wrong size
        let err = RsdModel::new(ModelVariant::Kaiser, null_profiles(), &null_grid(&s), cov, opts)
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
