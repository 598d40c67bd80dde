//! Learning using privileged information.

use super::layout::BuildContext;
use super::{
    ClassificationFormulation, FormulationBuilder, OrdinalFormulation, RegressionFormulation,
};

/// Base task of a LUPI formulation.
#[derive(Debug, Clone, PartialEq)]
pub enum LupiTask {
    Classification(ClassificationFormulation),
    Regression(RegressionFormulation),
    Ordinal(OrdinalFormulation),
}

/// A base family whose slacks are replaced by the privileged function
/// `s_i = w*·x*_i + b* ≥ 0`, with its own L1 budget on `w*`.
///
/// Ordinal samples use a single `s_i` for both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct LupiFormulation {
    task: LupiTask,
}

impl LupiFormulation {
    pub fn new(task: LupiTask) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &LupiTask {
        &self.task
    }
}

impl FormulationBuilder for LupiFormulation {
    fn name(&self) -> &'static str {
        match &self.task {
            LupiTask::Classification(_) => "lupi_classification",
            LupiTask::Regression(_) => "lupi_regression",
            LupiTask::Ordinal(_) => "lupi_ordinal_regression",
        }
    }

    fn is_lupi(&self) -> bool {
        true
    }

    fn add_rows(&self, ctx: &mut BuildContext<'_>) {
        match &self.task {
            LupiTask::Classification(inner) => inner.add_rows(ctx),
            LupiTask::Regression(inner) => inner.add_rows(ctx),
            LupiTask::Ordinal(inner) => inner.add_rows(ctx),
        }
    }
}
