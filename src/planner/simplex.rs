//! Dense Primal Simplex
//!
//! Solves `max c'x` subject to `Ax <= b`, `x >= 0` with `b >= 0`, which is
//! all the power-allocation program needs: every right-hand side is a
//! non-negative budget and the slack basis is immediately feasible. Bland's
//! rule is used for both the entering and leaving choice, so the iteration
//! cannot cycle.

use ndarray::Array2;

const EPS: f64 = 1e-9;

/// The program has a direction of unbounded improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unbounded;

/// Maximize `objective . x` over `constraints` (coefficient row, rhs) with
/// `x >= 0`. Returns the optimal point and the objective value.
pub(crate) fn maximize(
    objective: &[f64],
    constraints: &[(Vec<f64>, f64)],
) -> Result<(Vec<f64>, f64), Unbounded> {
    let n = objective.len();
    let m = constraints.len();
    let rhs_col = n + m;

    // Slack-form tableau: constraint rows, then the reduced-cost row.
    let mut tableau = Array2::<f64>::zeros((m + 1, n + m + 1));
    for (i, (coeffs, rhs)) in constraints.iter().enumerate() {
        for (j, &a) in coeffs.iter().enumerate() {
            tableau[[i, j]] = a;
        }
        tableau[[i, n + i]] = 1.0;
        tableau[[i, rhs_col]] = *rhs;
    }
    for (j, &c) in objective.iter().enumerate() {
        tableau[[m, j]] = c;
    }

    let mut basis: Vec<usize> = (n..n + m).collect();

    loop {
        // Entering: lowest-index column that still improves the objective
        let entering = match (0..n + m).find(|&j| tableau[[m, j]] > EPS) {
            Some(j) => j,
            None => break,
        };

        // Leaving: minimum ratio, ties toward the smallest basis variable
        let mut leaving: Option<(usize, f64)> = None;
        for i in 0..m {
            let coeff = tableau[[i, entering]];
            if coeff <= EPS {
                continue;
            }
            let ratio = tableau[[i, rhs_col]] / coeff;
            let better = match leaving {
                None => true,
                Some((prev_row, prev_ratio)) => {
                    ratio < prev_ratio - EPS
                        || (ratio < prev_ratio + EPS && basis[i] < basis[prev_row])
                }
            };
            if better {
                leaving = Some((i, ratio));
            }
        }
        let pivot_row = match leaving {
            Some((i, _)) => i,
            None => return Err(Unbounded),
        };

        let pivot = tableau[[pivot_row, entering]];
        let normalized = tableau.row(pivot_row).to_owned() / pivot;
        tableau.row_mut(pivot_row).assign(&normalized);

        for r in 0..=m {
            if r == pivot_row {
                continue;
            }
            let factor = tableau[[r, entering]];
            if factor.abs() > EPS {
                let updated = tableau.row(r).to_owned() - &(&normalized * factor);
                tableau.row_mut(r).assign(&updated);
            }
        }

        basis[pivot_row] = entering;
    }

    let mut solution = vec![0.0; n];
    for (row, &var) in basis.iter().enumerate() {
        if var < n {
            solution[var] = tableau[[row, rhs_col]];
        }
    }

    Ok((solution, -tableau[[m, rhs_col]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_maximize_with_shared_resource() {
        // max 3x + 2y  s.t.  x + y <= 4, x <= 2, y <= 3
        let (x, value) = maximize(
            &[3.0, 2.0],
            &[
                (vec![1.0, 1.0], 4.0),
                (vec![1.0, 0.0], 2.0),
                (vec![0.0, 1.0], 3.0),
            ],
        )
        .unwrap();

        assert_relative_eq!(x[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(value, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_objective_stays_at_origin() {
        let (x, value) = maximize(&[-1.0, -2.0], &[(vec![1.0, 1.0], 5.0)]).unwrap();

        assert_relative_eq!(x[0], 0.0);
        assert_relative_eq!(x[1], 0.0);
        assert_relative_eq!(value, 0.0);
    }

    #[test]
    fn test_detects_unbounded_program() {
        // max x with no constraint limiting x
        assert_eq!(maximize(&[1.0], &[]), Err(Unbounded));
    }

    #[test]
    fn test_fractional_optimum() {
        // max x  s.t.  2x <= 1
        let (x, value) = maximize(&[1.0], &[(vec![2.0], 1.0)]).unwrap();

        assert_relative_eq!(x[0], 0.5, epsilon = 1e-9);
        assert_relative_eq!(value, 0.5, epsilon = 1e-9);
    }
}
