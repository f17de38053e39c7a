// Recomendaciones: camino hacia un curso objetivo y sugerencias generales puntuadas.
use std::collections::{HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use crate::algorithm::validator::PrerequisiteValidator;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{CompletedCourseSet, CourseCode, RecommendationStep, StudentRecord};

// Pesos de la puntuación heurística
const CREDIT_WEIGHT: f64 = 0.1;
const UNLOCK_WEIGHT: f64 = 0.5;
const PROGRAM_WEIGHT: f64 = 1.0;

pub struct RecommendationEngine<'g> {
    validator: PrerequisiteValidator<'g>,
    limit: usize,
}

impl<'g> RecommendationEngine<'g> {
    pub fn new(validator: PrerequisiteValidator<'g>) -> Self {
        RecommendationEngine { validator, limit: 10 }
    }

    pub fn from_config(validator: PrerequisiteValidator<'g>, config: &EngineConfig) -> Self {
        RecommendationEngine {
            validator,
            limit: config.recommendation_limit,
        }
    }

    /// Con objetivo: camino hacia él. Sin objetivo: recomendaciones generales.
    pub fn recommended_sequence(
        &self,
        target: Option<&CourseCode>,
        student: &StudentRecord,
    ) -> EngineResult<Vec<RecommendationStep>> {
        match target {
            Some(t) => self.path_to_course(t, &student.completed),
            None => Ok(self.general_recommendations(student)),
        }
    }

    /// BFS desde `target` hacia sus prerequisitos. Se detiene en el primer
    /// curso ya tomable y devuelve ese curso seguido de la cadena que lleva
    /// hasta `target`: la cadena bloqueante más corta, no el plan completo.
    /// `path_position` es la profundidad BFS medida desde `target`.
    /// Vacío si ningún curso alcanzable es tomable.
    pub fn path_to_course(
        &self,
        target: &CourseCode,
        completed: &CompletedCourseSet,
    ) -> EngineResult<Vec<RecommendationStep>> {
        let graph = self.validator.graph();
        let start = graph
            .index_of(target)
            .ok_or_else(|| EngineError::not_found("course", target))?;

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<(NodeIndex, Vec<RecommendationStep>)> = VecDeque::from([(start, Vec::new())]);

        while let Some((idx, path)) = queue.pop_front() {
            if !visited.insert(idx) {
                continue;
            }
            let course = graph.node(idx);
            let check = self.validator.can_take_idx(idx, completed);
            let step = RecommendationStep {
                course: course.code.clone(),
                eligible: check.eligible,
                missing: check.missing,
                credits: course.credits,
                priority: None,
                reason: None,
                path_position: Some(path.len()),
            };

            if step.eligible {
                tracing::debug!(goal = %target, leaf = %step.course, depth = path.len(), "camino encontrado");
                let mut out = Vec::with_capacity(path.len() + 1);
                out.push(step);
                out.extend(path);
                return Ok(out);
            }

            for (prereq, _) in graph.prerequisite_edges(idx) {
                if visited.contains(&prereq) {
                    continue;
                }
                let mut next = Vec::with_capacity(path.len() + 1);
                next.push(step.clone());
                next.extend(path.iter().cloned());
                queue.push_back((prereq, next));
            }
        }

        tracing::debug!(goal = %target, "ningún curso tomable en la cadena");
        Ok(Vec::new())
    }

    /// Cursos activos tomables y aún no aprobados, ordenados por puntuación
    /// descendente (estable: en empate manda el orden del catálogo), truncados al límite.
    ///
    /// Los cursos ya aprobados nunca aparecen, a diferencia del top-10 histórico,
    /// que solo filtraba por activo y tomable.
    pub fn general_recommendations(&self, student: &StudentRecord) -> Vec<RecommendationStep> {
        let graph = self.validator.graph();
        let mut recs: Vec<RecommendationStep> = graph
            .node_indices()
            .filter(|&idx| {
                let c = graph.node(idx);
                c.active && !student.completed.contains(&c.code)
            })
            .filter(|&idx| self.validator.can_take_idx(idx, &student.completed).eligible)
            .map(|idx| {
                let course = graph.node(idx);
                let unlocks = graph.unlock_count(&course.code);
                RecommendationStep {
                    course: course.code.clone(),
                    eligible: true,
                    missing: Vec::new(),
                    credits: course.credits,
                    priority: Some(self.priority(course.credits, unlocks, student, &course.code)),
                    reason: Some(reason(course.credits, unlocks)),
                    path_position: None,
                }
            })
            .collect();

        // sort_by es estable
        recs.sort_by(|a, b| {
            b.priority
                .unwrap_or(0.0)
                .total_cmp(&a.priority.unwrap_or(0.0))
        });
        recs.truncate(self.limit);
        tracing::info!(count = recs.len(), "recomendaciones generales calculadas");
        recs
    }

    fn priority(&self, credits: f64, unlocks: usize, student: &StudentRecord, code: &CourseCode) -> f64 {
        let mut score = credits * CREDIT_WEIGHT;
        score += unlocks as f64 * UNLOCK_WEIGHT;
        if student.satisfies_program_requirement(code) {
            score += PROGRAM_WEIGHT;
        }
        score
    }
}

fn reason(credits: f64, unlocks: usize) -> String {
    if unlocks > 3 {
        format!("Unlocks {} other courses", unlocks)
    } else if credits >= 4.0 {
        "High credit course".to_string()
    } else {
        "Available prerequisite".to_string()
    }
}
