use serde::Serialize;

/// Slope and intercept of an ordinary least squares line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Value of the fitted line at `x`.
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope * x + intercept` by ordinary least squares.
///
/// `xs` and `ys` must have the same non-zero length. When every x is
/// identical the denominator is zero and both fields come back NaN;
/// guard with [`can_project`] first.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> LinearFit {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len().min(ys.len()) as f64;

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys) {
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denom = n * sum_xx - sum_x * sum_x;
    let slope = if denom == 0.0 {
        f64::NAN
    } else {
        (n * sum_xy - sum_x * sum_y) / denom
    };
    let intercept = (sum_y - slope * sum_x) / n;
    LinearFit { slope, intercept }
}

/// A series is projected only with more than two points spanning at
/// least two distinct x values.
pub fn can_project(xs: &[f64]) -> bool {
    xs.len() > 2 && xs.iter().any(|&x| x != xs[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fits_an_exact_line() {
        let fit = linear_fit(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 0.0));
        assert!(close(fit.at(10.0), 20.0));
    }

    #[test]
    fn fits_noisy_year_series() {
        let xs = [2000.0, 2001.0, 2002.0, 2003.0];
        let ys = [10.1, 10.4, 11.1, 11.4];
        let fit = linear_fit(&xs, &ys);
        assert!((fit.slope - 0.46).abs() < 1e-6);
        assert!(fit.at(2003.0) > fit.at(2000.0));
    }

    #[test]
    fn identical_x_is_nan_and_not_projectable() {
        let xs = [2020.0, 2020.0, 2020.0];
        let fit = linear_fit(&xs, &[1.0, 2.0, 3.0]);
        assert!(fit.slope.is_nan());
        assert!(fit.intercept.is_nan());
        assert!(!can_project(&xs));
    }

    #[test]
    fn projection_needs_more_than_two_points() {
        assert!(!can_project(&[]));
        assert!(!can_project(&[2020.0, 2021.0]));
        assert!(can_project(&[2020.0, 2021.0, 2022.0]));
    }
}
