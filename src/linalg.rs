//! Conversions between ndarray and nalgebra matrices, for the solvers the
//! crate borrows from nalgebra.

use crate::Matrix;
use nalgebra::DMatrix;

pub(crate) fn to_nalgebra(m: &Matrix) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)])
}

pub(crate) fn from_nalgebra(m: &DMatrix<f64>) -> Matrix {
    Matrix::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}
