// Estructuras de datos principales: catálogo, historial del estudiante y horarios.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub mod report;
pub mod time;

pub use report::{
    CanAddResult, CanTakeResult, Conflict, ConflictKind, CrossProgramCourse, DegreeProgress, Gap,
    OptimizationReport, RecommendationStep, RequirementStatus, SatisfiedCourse, Severity,
    Suggestion, SuggestionKind, SuggestionPriority, Workload,
};
pub use time::{Day, TimeRange, TimeSlot};

/// Identidad estable de un curso: (departamento, número). Se muestra compacta: "CS201".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode {
    pub department: String,
    pub number: String,
}

fn course_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]+)\s*(\d+[A-Z]*)$").expect("course code regex"))
}

impl CourseCode {
    pub fn new(department: impl Into<String>, number: impl Into<String>) -> Self {
        CourseCode {
            department: department.into().to_uppercase(),
            number: number.into().to_uppercase(),
        }
    }
}

impl FromStr for CourseCode {
    type Err = EngineError;

    /// "CS230" -> ("CS", "230"); también "cs 230" o "MATH 101A".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let caps = course_code_re()
            .captures(&upper)
            .ok_or_else(|| EngineError::InvalidCourseCode(s.to_string()))?;
        Ok(CourseCode::new(&caps[1], &caps[2]))
    }
}

impl TryFrom<String> for CourseCode {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CourseCode> for String {
    fn from(code: CourseCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.department, self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    Fall,
    Winter,
    Spring,
    Summer,
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Semester::Fall => "Fall",
            Semester::Winter => "Winter",
            Semester::Spring => "Spring",
            Semester::Summer => "Summer",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    pub semester: Semester,
    pub year: u16,
}

impl Term {
    pub fn new(semester: Semester, year: u16) -> Self {
        Term { semester, year }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.semester, self.year)
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: CourseCode,
    pub title: String,
    pub credits: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub terms_offered: Vec<Semester>,
}

impl Course {
    pub fn new(code: CourseCode, title: impl Into<String>, credits: f64) -> Self {
        Course {
            code,
            title: title.into(),
            credits,
            active: true,
            terms_offered: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arista prerequisito -> curso dependiente. `group` la asocia a un conjunto "cualquiera de".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    pub course: CourseCode,
    pub prerequisite: CourseCode,
    #[serde(default)]
    pub group: Option<GroupId>,
}

impl PrerequisiteEdge {
    pub fn new(prerequisite: CourseCode, course: CourseCode) -> Self {
        PrerequisiteEdge { course, prerequisite, group: None }
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteGroup {
    pub id: GroupId,
    pub course: CourseCode,
    pub name: String,
    #[serde(default = "default_active")]
    pub required: bool,
}

/// Calificaciones. Todas aprueban salvo F, W e INC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    Pass,
    Fail,
    Withdrawn,
    Incomplete,
}

impl Grade {
    pub fn is_passing(&self) -> bool {
        !matches!(self, Grade::Fail | Grade::Withdrawn | Grade::Incomplete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::Pass => "P",
            Grade::Fail => "F",
            Grade::Withdrawn => "W",
            Grade::Incomplete => "INC",
        }
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let g = match s.trim().to_uppercase().as_str() {
            "A+" => Grade::APlus,
            "A" => Grade::A,
            "A-" => Grade::AMinus,
            "B+" => Grade::BPlus,
            "B" => Grade::B,
            "B-" => Grade::BMinus,
            "C+" => Grade::CPlus,
            "C" => Grade::C,
            "C-" => Grade::CMinus,
            "D+" => Grade::DPlus,
            "D" => Grade::D,
            "D-" => Grade::DMinus,
            "P" => Grade::Pass,
            "F" => Grade::Fail,
            "W" => Grade::Withdrawn,
            "INC" => Grade::Incomplete,
            other => return Err(format!("unknown grade '{}'", other)),
        };
        Ok(g)
    }
}

impl TryFrom<String> for Grade {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Grade> for String {
    fn from(g: Grade) -> Self {
        g.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedCourse {
    pub course: CourseCode,
    pub grade: Grade,
    #[serde(default)]
    pub semester: Option<Semester>,
    #[serde(default)]
    pub year: Option<u16>,
}

/// Oráculo de satisfacción: cursos aprobados por un estudiante. Inmutable durante una validación.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedCourseSet {
    courses: HashSet<CourseCode>,
}

impl CompletedCourseSet {
    /// Sólo entran los registros con nota aprobatoria.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CompletedCourse>) -> Self {
        let courses = records
            .into_iter()
            .filter(|r| r.grade.is_passing())
            .map(|r| r.course.clone())
            .collect();
        CompletedCourseSet { courses }
    }

    pub fn contains(&self, code: &CourseCode) -> bool {
        self.courses.contains(code)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn is_subset(&self, other: &CompletedCourseSet) -> bool {
        self.courses.is_subset(&other.courses)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseCode> {
        self.courses.iter()
    }
}

impl FromIterator<CourseCode> for CompletedCourseSet {
    fn from_iter<I: IntoIterator<Item = CourseCode>>(iter: I) -> Self {
        CompletedCourseSet { courses: iter.into_iter().collect() }
    }
}

/// Curso enlazado a un requisito. `required = false` marca opciones electivas,
/// que no cuentan para la auditoría.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRequirement {
    pub course: CourseCode,
    #[serde(default = "default_active")]
    pub required: bool,
}

/// Bloque de un programa (troncales, electivos, formación general...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeRequirement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_type: Option<String>,
    #[serde(default)]
    pub credits_required: f64,
    #[serde(default)]
    pub courses: Vec<CourseRequirement>,
}

impl DegreeRequirement {
    pub fn new(name: impl Into<String>, credits_required: f64) -> Self {
        DegreeRequirement {
            name: name.into(),
            requirement_type: None,
            credits_required,
            courses: Vec::new(),
        }
    }

    pub fn with_course(mut self, course: CourseCode, required: bool) -> Self {
        self.courses.push(CourseRequirement { course, required });
        self
    }

    /// Cursos obligatorios del bloque, en orden de declaración.
    pub fn required_courses(&self) -> impl Iterator<Item = &CourseCode> {
        self.courses.iter().filter(|c| c.required).map(|c| &c.course)
    }
}

/// Programa declarado: créditos totales y sus bloques de requisitos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRequirements {
    pub program: String,
    #[serde(default)]
    pub total_credits_required: f64,
    #[serde(default)]
    pub requirements: Vec<DegreeRequirement>,
}

impl ProgramRequirements {
    pub fn new(program: impl Into<String>, total_credits_required: f64) -> Self {
        ProgramRequirements {
            program: program.into(),
            total_credits_required,
            requirements: Vec::new(),
        }
    }

    pub fn with_requirement(mut self, requirement: DegreeRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// ¿`code` cumple algún requisito obligatorio del programa?
    pub fn is_satisfied_by(&self, code: &CourseCode) -> bool {
        self.requirements
            .iter()
            .any(|r| r.required_courses().any(|c| c == code))
    }
}

/// Historial del estudiante + programas declarados.
#[derive(Debug, Clone, Default)]
pub struct StudentRecord {
    pub completed: CompletedCourseSet,
    pub programs: Vec<ProgramRequirements>,
}

impl StudentRecord {
    pub fn new(completed: CompletedCourseSet) -> Self {
        StudentRecord { completed, programs: Vec::new() }
    }

    pub fn with_program(mut self, program: ProgramRequirements) -> Self {
        self.programs.push(program);
        self
    }

    pub fn satisfies_program_requirement(&self, code: &CourseCode) -> bool {
        self.programs.iter().any(|p| p.is_satisfied_by(code))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferingId(pub u64);

impl fmt::Display for OfferingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_section() -> String {
    "001".to_string()
}

/// Instancia de un curso en (semestre, año, sección). `credits` viene del curso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub id: OfferingId,
    pub course: CourseCode,
    pub credits: f64,
    pub term: Term,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub enrolled: u32,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

impl Offering {
    pub fn new(id: u64, course: CourseCode, credits: f64, term: Term) -> Self {
        Offering {
            id: OfferingId(id),
            course,
            credits,
            term,
            section: default_section(),
            instructor: None,
            capacity: 0,
            enrolled: 0,
            time_slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, slot: TimeSlot) -> Self {
        self.time_slots.push(slot);
        self
    }

    pub fn with_instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = Some(instructor.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Profesor efectivo: `None` si viene vacío.
    pub fn instructor_name(&self) -> Option<&str> {
        self.instructor.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Horario de un estudiante para un término. Nunca contiene dos veces la misma oferta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub student: String,
    pub term: Term,
    #[serde(default = "default_schedule_name")]
    pub name: String,
    #[serde(default)]
    pub offerings: Vec<Offering>,
}

fn default_schedule_name() -> String {
    "My Schedule".to_string()
}

impl Schedule {
    pub fn new(student: impl Into<String>, term: Term) -> Self {
        Schedule {
            student: student.into(),
            term,
            name: default_schedule_name(),
            offerings: Vec::new(),
        }
    }

    pub fn contains_offering(&self, id: OfferingId) -> bool {
        self.offerings.iter().any(|o| o.id == id)
    }

    pub fn offering_for_course(&self, course: &CourseCode) -> Option<&Offering> {
        self.offerings.iter().find(|o| &o.course == course)
    }

    /// Créditos del horario: una vez por oferta, no por bloque.
    pub fn total_credits(&self) -> f64 {
        self.offerings.iter().map(|o| o.credits).sum()
    }
}
