//! Linear (Kaiser-like) variant.
//!
//! Closed-form prediction with no displacement convolution: the real-space
//! radius is shifted by the mean infall, then the correlation is corrected
//! by the linear-theory density terms.

use crate::error::AppError;
use crate::model::{true_point, TheoryContext};

/// Predict (monopole, quadrupole) on the observed separation grid.
pub(crate) fn predict(
    ctx: &TheoryContext<'_>,
    s_grid: &[f64],
    mu_grid: &[f64],
) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let mut monopole = Vec::with_capacity(s_grid.len());
    let mut quadrupole = Vec::with_capacity(s_grid.len());
    let mut true_mu = vec![0.0; mu_grid.len()];
    let mut xi_model = vec![0.0; mu_grid.len()];

    for &s in s_grid {
        for (j, &mu) in mu_grid.iter().enumerate() {
            let tp = true_point(s, mu, ctx.alphas);
            true_mu[j] = tp.mu;

            let r = tp.s
                * (1.0
                    + ctx.scaled_fs8 / 3.0
                        * ctx.profiles.big_delta_r.eval(tp.s)
                        * tp.mu
                        * tp.mu);

            let xi_r = ctx.profiles.xi_r.eval(r);
            let big_d = ctx.profiles.big_delta_r.eval(r);
            let small_d = ctx.profiles.delta_r.eval(r);

            xi_model[j] = xi_r
                + ctx.scaled_fs8 / 3.0 * big_d * (1.0 + xi_r)
                + ctx.scaled_fs8 * tp.mu * tp.mu * (small_d - big_d) * (1.0 + xi_r);
        }

        let (m, q) = ctx.basis.project(&true_mu, &xi_model)?;
        monopole.push(m);
        quadrupole.push(q);
    }

    Ok((monopole, quadrupole))
}
