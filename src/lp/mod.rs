//! Linear-program description layer and solver backend.
//!
//! Formulations describe their programs with [`LinearProgram`]: bounded
//! variables, a linear objective and `≤ / ≥ / =` rows. The description is plain
//! data (`Send + Sync`, cheap to rebuild); [`LinearProgram::solve`] translates
//! it into a `minilp` problem, solves it and maps the outcome onto a
//! [`SolveStatus`]. The `minilp` handle never leaves the calling thread.

mod program;
mod status;

pub use program::{Comparison, LinearProgram, LpSolution, Sense, VarId};
pub use status::{SolveStatus, Tolerances};
