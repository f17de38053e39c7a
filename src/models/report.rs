// Resultados derivados (no persistidos) que devuelven los motores.
use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::Serialize;

use super::time::{Day, TimeRange, hhmm};
use super::{CourseCode, OfferingId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanTakeResult {
    pub eligible: bool,
    pub missing: Vec<CourseCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationStep {
    pub course: CourseCode,
    pub eligible: bool,
    pub missing: Vec<CourseCode>,
    pub credits: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_position: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ConflictKind {
    #[serde(rename = "time_conflict")]
    Time,
    #[serde(rename = "location_conflict")]
    Location,
    #[serde(rename = "instructor_conflict")]
    Instructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// Choque entre dos bloques. Los campos extra dependen del tipo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub severity: Severity,
    pub description: String,
    pub courses: Vec<CourseCode>,
    pub offerings: Vec<OfferingId>,
    pub day: Day,
    pub time_range: TimeRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
}

impl Conflict {
    pub fn involves(&self, offering: OfferingId) -> bool {
        self.offerings.contains(&offering)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanAddResult {
    pub can_add: bool,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gap {
    pub day: Day,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub duration_minutes: i64,
}

/// Carga por día. En JSON los campos de tiempo se llaman `*_hours` aunque
/// los valores son minutos.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Workload {
    pub daily_credits: BTreeMap<Day, f64>,
    #[serde(rename = "daily_hours")]
    pub daily_minutes: BTreeMap<Day, i64>,
    pub total_credits: f64,
    #[serde(rename = "total_hours")]
    pub total_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    ResolveConflicts,
    FillGaps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub priority: SuggestionPriority,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub conflicts: Vec<Conflict>,
    pub gaps: Vec<Gap>,
    pub workload: Workload,
    pub recommendations: Vec<Suggestion>,
}

/// Curso aprobado que cuenta para un requisito.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatisfiedCourse {
    pub course: CourseCode,
    pub title: String,
    pub credits: f64,
}

/// Estado de un bloque de requisitos del programa.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementStatus {
    pub requirement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_type: Option<String>,
    pub credits_required: f64,
    pub credits_earned: f64,
    pub is_satisfied: bool,
    pub satisfied_courses: Vec<SatisfiedCourse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegreeProgress {
    pub program: String,
    pub total_credits_required: f64,
    pub credits_earned: f64,
    pub credits_remaining: f64,
    pub percentage_complete: f64,
    pub completed_courses: usize,
}

/// Curso aprobado que además cumple requisitos de otros programas declarados.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossProgramCourse {
    pub course: CourseCode,
    pub title: String,
    pub satisfies_programs: Vec<String>,
    pub credits_shared: f64,
}
