use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::CourseGraph;
use crate::error::{EngineError, EngineResult};
use crate::models::{
	CompletedCourse, CompletedCourseSet, Course, CourseCode, Offering, PrerequisiteEdge,
	PrerequisiteGroup, ProgramRequirements, Schedule, StudentRecord,
};

/// Snapshot del catálogo tal como lo entrega el almacén externo.
///
/// # Estructura del JSON esperado:
/// ```json
/// {
///   "courses": [
///     { "code": "CS101", "title": "Intro", "credits": 3 },
///     { "code": "CS201", "title": "Data Structures", "credits": 4, "terms_offered": ["fall"] }
///   ],
///   "prerequisites": [
///     { "course": "CS201", "prerequisite": "CS101", "group": null }
///   ],
///   "groups": [],
///   "corequisites": [["CS201", "CS202"]],
///   "antirequisites": [],
///   "programs": [{
///     "program": "BSc CS", "total_credits_required": 120,
///     "requirements": [{
///       "name": "Core", "credits_required": 7,
///       "courses": [{ "course": "CS101" }, { "course": "CS201", "required": true }]
///     }]
///   }]
/// }
/// ```
///
/// Todo salvo `courses` es opcional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
	pub courses: Vec<Course>,
	#[serde(default)]
	pub prerequisites: Vec<PrerequisiteEdge>,
	#[serde(default)]
	pub groups: Vec<PrerequisiteGroup>,
	#[serde(default)]
	pub corequisites: Vec<(CourseCode, CourseCode)>,
	#[serde(default)]
	pub antirequisites: Vec<(CourseCode, CourseCode)>,
	#[serde(default)]
	pub programs: Vec<ProgramRequirements>,
}

impl CatalogSnapshot {
	/// Construye el grafo; falla con `InvalidGraph` antes de cualquier recorrido.
	pub fn build_graph(&self) -> EngineResult<CourseGraph> {
		CourseGraph::builder()
			.courses(self.courses.iter().cloned())
			.prerequisites(self.prerequisites.iter().cloned())
			.groups(self.groups.iter().cloned())
			.corequisites(self.corequisites.iter().cloned())
			.antirequisites(self.antirequisites.iter().cloned())
			.build()
	}

	pub fn program(&self, name: &str) -> Option<&ProgramRequirements> {
		self.programs.iter().find(|p| p.program == name)
	}
}

/// Historial del estudiante: registros con nota y nombres de programas declarados.
///
/// ```json
/// { "completed": [{ "course": "CS101", "grade": "B+", "semester": "fall", "year": 2024 }],
///   "programs": ["BSc CS"] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentSnapshot {
	#[serde(default)]
	pub completed: Vec<CompletedCourse>,
	#[serde(default)]
	pub programs: Vec<String>,
}

impl StudentSnapshot {
	pub fn completed_set(&self) -> CompletedCourseSet {
		CompletedCourseSet::from_records(&self.completed)
	}

	/// Resuelve los programas declarados contra el catálogo (`NotFound` si alguno no existe).
	pub fn into_record(self, catalog: &CatalogSnapshot) -> EngineResult<StudentRecord> {
		let mut record = StudentRecord::new(self.completed_set());
		for name in &self.programs {
			let program = catalog
				.program(name)
				.ok_or_else(|| EngineError::not_found("program", name))?;
			record = record.with_program(program.clone());
		}
		Ok(record)
	}
}

/// Horario del estudiante más el conjunto de ofertas del término (para alternativas).
///
/// ```json
/// {
///   "schedule": {
///     "student": "s-001",
///     "term": { "semester": "fall", "year": 2025 },
///     "offerings": [{
///       "id": 10, "course": "CS101", "credits": 3,
///       "term": { "semester": "fall", "year": 2025 },
///       "instructor": "Dr. Ruiz",
///       "time_slots": [{ "day": "monday", "start": "09:00", "end": "10:30", "location": "Room 101" }]
///     }]
///   },
///   "offerings": []
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
	pub schedule: Schedule,
	#[serde(default)]
	pub offerings: Vec<Offering>,
}

/// Lee un snapshot desde disco. Los fallos de E/S se propagan tal cual.
pub fn read_snapshot(path: impl AsRef<Path>) -> EngineResult<String> {
	Ok(fs::read_to_string(path)?)
}

pub fn parse_catalog(json: &str) -> EngineResult<CatalogSnapshot> {
	let snapshot: CatalogSnapshot = serde_json::from_str(json)?;
	tracing::debug!(
		courses = snapshot.courses.len(),
		prerequisites = snapshot.prerequisites.len(),
		"snapshot de catálogo leído"
	);
	Ok(snapshot)
}

pub fn parse_student(json: &str) -> EngineResult<StudentSnapshot> {
	Ok(serde_json::from_str(json)?)
}

pub fn parse_schedule(json: &str) -> EngineResult<ScheduleSnapshot> {
	let snapshot: ScheduleSnapshot = serde_json::from_str(json)?;
	tracing::debug!(
		offerings = snapshot.schedule.offerings.len(),
		pool = snapshot.offerings.len(),
		"snapshot de horario leído"
	);
	Ok(snapshot)
}
