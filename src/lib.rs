// Biblioteca raíz del crate `courseplan`.
// Dos motores independientes: grafo de prerequisitos (catálogo, validación,
// recomendaciones) y conflictos de horario (detección, ventanas, carga, altas/bajas).
pub mod algorithm;
pub mod api_json;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use algorithm::{
    ConflictDetector, DegreeAudit, PrerequisiteValidator, RecommendationEngine, ScheduleMutator,
};
pub use catalog::{CatalogBuilder, CourseGraph, GraphCache};
pub use config::{EngineConfig, GroupSemantics, SlotMatching};
pub use error::{EngineError, EngineResult, InvalidGraphReason};
pub use logging::init_tracing;
