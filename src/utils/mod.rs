use ndarray::{Array1, ArrayView1, ArrayView2, Zip};

pub mod validation;

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Dot product of each row of `a` with the matching row of `b`.
pub fn row_dot(a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array1<f64> {
    let mut out = Array1::zeros(a.nrows());
    Zip::from(&mut out)
        .and(a.rows())
        .and(b.rows())
        .for_each(|out, a, b| *out = a.dot(&b));
    out
}

/// Squared Frobenius norm.
pub fn squared_norm(a: ArrayView2<f64>) -> f64 {
    a.iter().map(|x| x * x).sum()
}

pub fn mean(values: ArrayView1<f64>) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.sum() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(40.0) <= 1.0);
        assert!(sigmoid(-40.0) >= 0.0);
    }

    #[test]
    fn test_row_dot() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [0.0, 0.0]];
        let b = array![[5.0, 6.0], [-1.0, 1.0], [9.0, 9.0]];
        assert_eq!(row_dot(a.view(), b.view()), array![17.0, 1.0, 0.0]);
    }

    #[test]
    fn test_squared_norm_and_mean() {
        let a = array![[3.0, 4.0], [0.0, 1.0]];
        assert_eq!(squared_norm(a.view()), 26.0);
        assert_eq!(mean(array![0.25, 0.75].view()), 0.5);
        assert_eq!(mean(Array1::<f64>::zeros(0).view()), 0.0);
    }
}
