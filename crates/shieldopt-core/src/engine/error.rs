use crate::core::feasibility::FeasibilityError;
use crate::core::io::GeometryError;
use crate::core::kpi::KpiError;
use crate::core::materials::CatalogError;
use crate::core::space::SpaceError;
use crate::engine::history::HistoryError;
use crate::engine::simulator::SimulationError;
use thiserror::Error;

/// Fatal errors of the optimization engine. Iteration-scope problems
/// (simulation failures, constraint violations, invalid candidates) never
/// surface here: they are converted into the penalty value inside the loop.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Materials configuration error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Search space error: {0}")]
    Space(#[from] SpaceError),

    #[error("Feasibility error: {0}")]
    Feasibility(#[from] FeasibilityError),

    #[error("Geometry configuration error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("KPI handling error: {0}")]
    Kpi(#[from] KpiError),

    #[error("History persistence error: {0}")]
    History(#[from] HistoryError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
}
