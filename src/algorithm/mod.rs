// Motores de cálculo: prerequisitos, recomendaciones, auditoría de grado,
// conflictos de horario y altas/bajas.
pub mod audit;
pub mod conflict;
pub mod mutator;
pub mod recommend;
pub mod validator;

pub use audit::DegreeAudit;
pub use conflict::ConflictDetector;
pub use mutator::ScheduleMutator;
pub use recommend::RecommendationEngine;
pub use validator::PrerequisiteValidator;
