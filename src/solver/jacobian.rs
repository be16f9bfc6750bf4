//! Central-difference Jacobian and zero-stiffness detection.

use log::trace;
use nalgebra::DMatrix;

use crate::{elements::EvalMode, error::StaticsResult, solver::problem::Problem};

impl Problem<'_> {
    /// `∂R/∂x` at `x` by central differences; the scene is left at `x`.
    pub fn jacobian(&mut self, x: &[f64], mode: EvalMode) -> StaticsResult<DMatrix<f64>> {
        let n = self.dim();
        self.profile.jacobian_evaluations += 1;

        #[cfg(feature = "parallel")]
        let columns = self.parallel_columns(x, mode)?;
        #[cfg(not(feature = "parallel"))]
        let columns = (0..n)
            .map(|j| self.column(x, j, mode))
            .collect::<StaticsResult<Vec<_>>>()?;

        self.apply(x)?;
        Ok(DMatrix::from_fn(n, n, |i, j| columns[j][i]))
    }

    /// Like [`Problem::jacobian`], but a difference stencil that touches degenerate
    /// geometry gives `None` instead of failing. The scene is left at `x` either way.
    pub fn try_jacobian(&mut self, x: &[f64], mode: EvalMode) -> StaticsResult<Option<DMatrix<f64>>> {
        match self.jacobian(x, mode) {
            Ok(jacobian) => Ok(Some(jacobian)),
            Err(err) if err.is_geometry() => {
                trace!("jacobian rejected: {err}");
                self.apply(x)?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Column `j`; every probe writes the exact original values back before the next one.
    #[cfg_attr(feature = "parallel", allow(dead_code))]
    fn column(&mut self, x: &[f64], j: usize, mode: EvalMode) -> StaticsResult<Vec<f64>> {
        let h = self.fd_step;
        let mut probe = x.to_vec();
        probe[j] = x[j] + h;
        let plus = self.residual_at(&probe, mode)?;
        probe[j] = x[j] - h;
        let minus = self.residual_at(&probe, mode)?;
        Ok(plus
            .iter()
            .zip(&minus)
            .map(|(p, m)| (p - m) / (2.0 * h))
            .collect())
    }

    /// Columns evaluated on private scene copies; the arithmetic per column is unchanged.
    #[cfg(feature = "parallel")]
    fn parallel_columns(&mut self, x: &[f64], mode: EvalMode) -> StaticsResult<Vec<Vec<f64>>> {
        use crate::assembly;
        use rayon::prelude::*;

        let h = self.fd_step;
        let scene = &*self.scene;
        let map = &self.map;
        let columns: Vec<StaticsResult<Vec<f64>>> = (0..map.len())
            .into_par_iter()
            .map(|j| {
                let mut local = scene.clone();
                let mut probe = x.to_vec();
                probe[j] = x[j] + h;
                map.set_dofs(&mut local, &probe)?;
                let plus = assembly::residual(&local, map, mode)?;
                probe[j] = x[j] - h;
                map.set_dofs(&mut local, &probe)?;
                let minus = assembly::residual(&local, map, mode)?;
                Ok(plus
                    .iter()
                    .zip(&minus)
                    .map(|(p, m)| (p - m) / (2.0 * h))
                    .collect())
            })
            .collect();
        self.profile.residual_evaluations += 2 * columns.len();
        columns.into_iter().collect()
    }
}

/// DOFs whose Jacobian row and column both vanish: nothing restores them.
pub fn unconstrained_dofs(jacobian: &DMatrix<f64>, relative_tolerance: f64) -> Vec<usize> {
    let limit = relative_tolerance * jacobian.amax().max(1.0);
    (0..jacobian.nrows())
        .filter(|&i| jacobian.row(i).amax() <= limit && jacobian.column(i).amax() <= limit)
        .collect()
}
