//! Iteration number to per-variable row index resolution.
//!
//! Iteration numbers are 1-based (they name cache files); row indices handed
//! back to callers are 0-based.

use serde::Serialize;

use crate::combine::Combination;
use crate::variable::{Variable, VARIABLE_COUNT};

/// Decompose a 0-based linear index into 0-based subscripts.
///
/// Mixed-radix expansion with the first dimension cycling fastest. Zero-sized
/// dimensions are treated as size 1. Indices past the end wrap within the last
/// dimension.
pub fn unravel_index<const N: usize>(index: usize, dims: &[usize; N]) -> [usize; N] {
    let mut subscripts = [0; N];
    let mut rest = index;
    for (subscript, dim) in subscripts.iter_mut().zip(dims.iter()) {
        let dim = (*dim).max(1);
        *subscript = rest % dim;
        rest /= dim;
    }
    subscripts
}

/// Resolved 0-based row index of every variable for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IterationIndices {
    pub targets: usize,
    pub interferers: usize,
    pub hrtfs: usize,
    pub tirs: usize,
    pub azimuths: usize,
    pub elevations: usize,
}

impl IterationIndices {
    fn from_array(indices: [usize; VARIABLE_COUNT]) -> Self {
        Self {
            targets: indices[Variable::Targets.position()],
            interferers: indices[Variable::Interferers.position()],
            hrtfs: indices[Variable::Hrtfs.position()],
            tirs: indices[Variable::Tirs.position()],
            azimuths: indices[Variable::Azimuths.position()],
            elevations: indices[Variable::Elevations.position()],
        }
    }

    pub fn get(&self, variable: Variable) -> usize {
        match variable {
            Variable::Targets => self.targets,
            Variable::Interferers => self.interferers,
            Variable::Hrtfs => self.hrtfs,
            Variable::Tirs => self.tirs,
            Variable::Azimuths => self.azimuths,
            Variable::Elevations => self.elevations,
        }
    }
}

impl Combination {
    /// Row indices for 1-based iteration `iteration`.
    ///
    /// Row combination wraps each variable by its own row count, so scalar
    /// variables always resolve to row 0. Cross-product combination unravels
    /// the iteration over the variable dimensions.
    pub fn indices(&self, iteration: usize) -> IterationIndices {
        let k = iteration.saturating_sub(1);
        let indices = match self {
            Combination::Rows { rows, .. } => {
                let mut indices = [0; VARIABLE_COUNT];
                for (index, rows) in indices.iter_mut().zip(rows.iter()) {
                    *index = k % (*rows).max(1);
                }
                indices
            }
            Combination::All { dims } => unravel_index(k, dims),
        };
        IterationIndices::from_array(indices)
    }
}
