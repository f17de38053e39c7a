//! Resolución en lote de códigos de curso escritos a mano (p.ej. al cargar
//! requisitos de un programa). Cada entrada produce un resultado: resuelta u
//! omitida con motivo. Nada se descarta en silencio.

use serde::Serialize;

use crate::catalog::CourseGraph;
use crate::models::CourseCode;

/// Similitud mínima (Jaro-Winkler) para sugerir un código parecido.
const SUGGESTION_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// No coincide con `DEPT###`.
    Malformed,
    /// Bien formado pero no existe en el catálogo.
    UnknownCourse { suggestion: Option<CourseCode> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Resolved { input: String, course: CourseCode },
    Skipped { input: String, reason: SkipReason },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    /// Códigos resueltos, en el orden de entrada.
    pub fn resolved(&self) -> Vec<CourseCode> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ImportOutcome::Resolved { course, .. } => Some(course.clone()),
                ImportOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ImportOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ImportOutcome::Skipped { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }
}

/// Resuelve cada código contra el catálogo. Nunca aborta el lote.
pub fn import_course_codes<S: AsRef<str>>(graph: &CourseGraph, inputs: &[S]) -> ImportReport {
    let mut outcomes = Vec::with_capacity(inputs.len());
    for raw in inputs {
        let input = raw.as_ref().to_string();
        let outcome = match input.parse::<CourseCode>() {
            Err(_) => {
                tracing::warn!(input = %input, "código de curso mal formado; se omite");
                ImportOutcome::Skipped { input, reason: SkipReason::Malformed }
            }
            Ok(code) if graph.course(&code).is_some() => ImportOutcome::Resolved { input, course: code },
            Ok(code) => {
                let suggestion = closest_code(graph, &code);
                tracing::warn!(
                    input = %input,
                    suggestion = ?suggestion.as_ref().map(|c| c.to_string()),
                    "curso no existe en el catálogo; se omite"
                );
                ImportOutcome::Skipped {
                    input,
                    reason: SkipReason::UnknownCourse { suggestion },
                }
            }
        };
        outcomes.push(outcome);
    }
    ImportReport { outcomes }
}

fn closest_code(graph: &CourseGraph, code: &CourseCode) -> Option<CourseCode> {
    let wanted = code.to_string();
    graph
        .courses()
        .map(|c| (strsim::jaro_winkler(&wanted, &c.code.to_string()), &c.code))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Course;

    fn graph() -> CourseGraph {
        let courses = ["CS230", "CS231", "MATH101"]
            .iter()
            .map(|c| Course::new(c.parse().unwrap(), *c, 3.0))
            .collect();
        CourseGraph::build(courses, &[]).unwrap()
    }

    #[test]
    fn test_outcome_per_item_in_order() {
        let g = graph();
        let report = import_course_codes(&g, &["CS230", "cs 231", "230CS", "CS239", "MATH101"]);
        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(
            report.resolved(),
            vec!["CS230".parse().unwrap(), "CS231".parse().unwrap(), "MATH101".parse().unwrap()]
        );
        assert_eq!(report.skipped_count(), 2);
        assert!(matches!(
            &report.outcomes[2],
            ImportOutcome::Skipped { reason: SkipReason::Malformed, .. }
        ));
    }

    #[test]
    fn test_unknown_course_gets_suggestion() {
        let g = graph();
        let report = import_course_codes(&g, &["MATH102", "ZZZ9"]);
        match &report.outcomes[0] {
            ImportOutcome::Skipped { reason: SkipReason::UnknownCourse { suggestion }, .. } => {
                assert_eq!(suggestion.as_ref().map(|c| c.to_string()), Some("MATH101".to_string()));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        match &report.outcomes[1] {
            ImportOutcome::Skipped { reason: SkipReason::UnknownCourse { suggestion }, .. } => {
                assert!(suggestion.is_none());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
