//! Errores de los motores de prerequisitos y de horarios.
//!
//! `InvalidGraph` es fatal para la construcción del grafo y se lanza antes de
//! cualquier recorrido. Ciclos y órdenes topológicos parciales NO son errores
//! salvo que el llamador pida la variante estricta.

use thiserror::Error;

use crate::models::{Conflict, CourseCode, GroupId, OfferingId, Term};

pub type EngineResult<T> = Result<T, EngineError>;

/// Motivo concreto por el que un catálogo no forma un grafo válido.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidGraphReason {
    #[error("course {course} referenced by {referenced_by} is not in the catalog")]
    UnknownCourse { course: CourseCode, referenced_by: String },
    #[error("course {course} cannot be its own prerequisite")]
    SelfLoop { course: CourseCode },
    #[error("course {course} appears more than once in the catalog")]
    DuplicateCourse { course: CourseCode },
    #[error("prerequisite group {group} is not declared")]
    UnknownGroup { group: GroupId },
    #[error("prerequisite group {group} is declared more than once")]
    DuplicateGroup { group: GroupId },
    #[error("prerequisite group {group} belongs to {owner}, not to {course}")]
    ForeignGroup {
        group: GroupId,
        course: CourseCode,
        owner: CourseCode,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid course graph: {reason}")]
    InvalidGraph { reason: InvalidGraphReason },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid course code '{0}'")]
    InvalidCourseCode(String),

    #[error("invalid time slot '{input}': {reason}")]
    InvalidTimeSlot { input: String, reason: String },

    #[error("prerequisite graph has a cycle; {} courses left out of the order", courses.len())]
    CycleDetected { courses: Vec<CourseCode> },

    #[error("offering {offering} belongs to {offering_term}, schedule is for {schedule_term}")]
    TermMismatch {
        offering: OfferingId,
        offering_term: Term,
        schedule_term: Term,
    },

    #[error("offering {0} is already in the schedule")]
    DuplicateOffering(OfferingId),

    #[error("course {course} is already scheduled through offering {existing}")]
    CourseAlreadyScheduled { course: CourseCode, existing: OfferingId },

    #[error("cannot add offering {offering}: {} conflicts", conflicts.len())]
    ScheduleConflict {
        offering: OfferingId,
        conflicts: Vec<Conflict>,
    },

    #[error("student has already completed {0}")]
    AlreadyCompleted(CourseCode),

    #[error("prerequisites not met for {course}: missing {}", join_codes(missing))]
    PrerequisitesNotMet {
        course: CourseCode,
        missing: Vec<CourseCode>,
    },

    #[error("{course} is an antirequisite of completed course {antirequisite}")]
    AntirequisiteCompleted {
        course: CourseCode,
        antirequisite: CourseCode,
    },

    #[error("invalid configuration {key}={value}")]
    Config { key: String, value: String },

    #[error("failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid_graph(reason: InvalidGraphReason) -> Self {
        EngineError::InvalidGraph { reason }
    }
}

fn join_codes(codes: &[CourseCode]) -> String {
    codes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
