use crate::domain::{StackError, StackResult};
use ndarray::{Array, Dimension, Zip};

/// Applies `op` pairwise over two same-shaped arrays.
///
/// Works identically for a nominal vector and an (object x draw) ensemble.
pub fn combine<D, F>(lhs: &Array<f64, D>, rhs: &Array<f64, D>, op: F) -> StackResult<Array<f64, D>>
where
    D: Dimension,
    F: Fn(f64, f64) -> f64,
{
    if lhs.shape() != rhs.shape() {
        return Err(StackError::internal(
            "SYS.ARRAY_SHAPE",
            format!(
                "paired arrays must share a shape, got {:?} and {:?}",
                lhs.shape(),
                rhs.shape()
            ),
        ));
    }
    Ok(Zip::from(lhs).and(rhs).map_collect(|a, b| op(*a, *b)))
}
