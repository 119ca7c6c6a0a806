//! RBF kernel evaluation
//!
//! The solver never holds the full Gram matrix. Rows are computed on demand
//! and kept in a least-recently-used cache bounded by a byte budget.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Rows of test data scored against the support vectors per block
const DECISION_BLOCK_ROWS: usize = 256;

/// exp(-gamma * ||a_i - b_j||^2) for every pair of rows
pub(crate) fn rbf_kernel(a: &ArrayView2<'_, f64>, b: &Array2<f64>, gamma: f64) -> Array2<f64> {
    let a_sq: Array1<f64> = a.rows().into_iter().map(|r| r.dot(&r)).collect();
    let b_sq: Array1<f64> = b.rows().into_iter().map(|r| r.dot(&r)).collect();

    let mut kernel = a.dot(&b.t());
    kernel.indexed_iter_mut().for_each(|((i, j), v)| {
        let distance = (a_sq[i] + b_sq[j] - 2.0 * *v).max(0.0);
        *v = (-gamma * distance).exp();
    });
    kernel
}

/// K(x, support) · coef, scored in fixed-size row blocks
pub(crate) fn kernel_expansion(
    x: &Array2<f64>,
    support: &Array2<f64>,
    coef: &Array1<f64>,
    gamma: f64,
) -> Array1<f64> {
    let mut out = Vec::with_capacity(x.nrows());
    for block in x.axis_chunks_iter(Axis(0), DECISION_BLOCK_ROWS) {
        out.extend(rbf_kernel(&block, support, gamma).dot(coef).iter().copied());
    }
    Array1::from(out)
}

/// Lazily evaluated rows of the training Gram matrix
pub(crate) struct KernelCache<'a> {
    x: &'a Array2<f64>,
    squared_norms: Array1<f64>,
    gamma: f64,
    capacity: usize,
    rows: HashMap<usize, Rc<[f64]>>,
    recency: VecDeque<usize>,
}

impl<'a> KernelCache<'a> {
    /// Keep as many rows as fit in `budget_bytes`, never fewer than two
    pub(crate) fn new(x: &'a Array2<f64>, gamma: f64, budget_bytes: usize) -> Self {
        let row_bytes = (x.nrows() * std::mem::size_of::<f64>()).max(1);
        let capacity = (budget_bytes / row_bytes).clamp(2, x.nrows().max(2));

        Self {
            x,
            squared_norms: x.rows().into_iter().map(|r| r.dot(&r)).collect(),
            gamma,
            capacity,
            rows: HashMap::with_capacity(capacity),
            recency: VecDeque::with_capacity(capacity),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    /// K(x_i, x_i); always 1 for the RBF kernel
    pub(crate) fn diagonal(&self, _i: usize) -> f64 {
        1.0
    }

    /// K(x_i, x_k) for every training row k
    pub(crate) fn row(&mut self, i: usize) -> Rc<[f64]> {
        if let Some(row) = self.rows.get(&i) {
            let row = Rc::clone(row);
            if let Some(pos) = self.recency.iter().position(|&r| r == i) {
                self.recency.remove(pos);
            }
            self.recency.push_back(i);
            return row;
        }

        if self.rows.len() >= self.capacity {
            if let Some(evicted) = self.recency.pop_front() {
                self.rows.remove(&evicted);
            }
        }

        let dots = self.x.dot(&self.x.row(i));
        let sq_i = self.squared_norms[i];
        let row: Rc<[f64]> = dots
            .iter()
            .zip(self.squared_norms.iter())
            .map(|(&dot, &sq_k)| (-self.gamma * (sq_i + sq_k - 2.0 * dot).max(0.0)).exp())
            .collect();

        self.rows.insert(i, Rc::clone(&row));
        self.recency.push_back(i);
        row
    }
}
