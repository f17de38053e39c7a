// Auditoría de grado: créditos por bloque de requisitos, avance del programa
// y cursos que cuentan también para otros programas declarados.
use crate::catalog::CourseGraph;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CrossProgramCourse, DegreeProgress, ProgramRequirements, RequirementStatus, SatisfiedCourse,
    StudentRecord,
};

pub struct DegreeAudit<'a> {
    graph: &'a CourseGraph,
    student: &'a StudentRecord,
}

impl<'a> DegreeAudit<'a> {
    pub fn new(graph: &'a CourseGraph, student: &'a StudentRecord) -> Self {
        DegreeAudit { graph, student }
    }

    /// Programa declarado por el estudiante (`NotFound` si no lo declaró).
    fn program(&self, name: &str) -> EngineResult<&'a ProgramRequirements> {
        self.student
            .programs
            .iter()
            .find(|p| p.program == name)
            .ok_or_else(|| EngineError::not_found("program", name))
    }

    /// Estado de cada bloque, en orden de declaración. Solo cuentan los cursos
    /// obligatorios del bloque que el estudiante aprobó; el bloque se cumple
    /// cuando los créditos ganados alcanzan `credits_required`.
    pub fn requirement_status(&self, program: &str) -> EngineResult<Vec<RequirementStatus>> {
        let program = self.program(program)?;
        let mut out = Vec::with_capacity(program.requirements.len());

        for req in &program.requirements {
            let mut satisfied = Vec::new();
            for code in req.required_courses().filter(|c| self.student.completed.contains(c)) {
                let course = self.graph.require(code)?;
                satisfied.push(SatisfiedCourse {
                    course: course.code.clone(),
                    title: course.title.clone(),
                    credits: course.credits,
                });
            }
            let earned: f64 = satisfied.iter().map(|c| c.credits).sum();
            out.push(RequirementStatus {
                requirement: req.name.clone(),
                requirement_type: req.requirement_type.clone(),
                credits_required: req.credits_required,
                credits_earned: earned,
                is_satisfied: earned >= req.credits_required,
                satisfied_courses: satisfied,
            });
        }

        tracing::debug!(
            program = %program.program,
            requirements = out.len(),
            satisfied = out.iter().filter(|r| r.is_satisfied).count(),
            "estado de requisitos calculado"
        );
        Ok(out)
    }

    /// Avance global: créditos aprobados del catálogo contra el total del programa.
    /// `credits_remaining` puede ser negativo si el estudiante se pasó del total.
    pub fn progress(&self, program: &str) -> EngineResult<DegreeProgress> {
        let program = self.program(program)?;

        let mut earned = 0.0;
        let mut counted = 0;
        for code in self.student.completed.iter() {
            match self.graph.course(code) {
                Some(course) => {
                    earned += course.credits;
                    counted += 1;
                }
                None => tracing::warn!(course = %code, "curso aprobado fuera del catálogo, no suma créditos"),
            }
        }

        let required = program.total_credits_required;
        let percentage = if required > 0.0 { earned / required * 100.0 } else { 0.0 };
        Ok(DegreeProgress {
            program: program.program.clone(),
            total_credits_required: required,
            credits_earned: earned,
            credits_remaining: required - earned,
            percentage_complete: percentage,
            completed_courses: counted,
        })
    }

    /// Cursos aprobados (en orden de catálogo) que cumplen requisitos obligatorios
    /// de algún otro programa declarado. Los que no sirven a otro programa se omiten.
    pub fn cross_program_satisfaction(&self, program: &str) -> EngineResult<Vec<CrossProgramCourse>> {
        let audited = self.program(program)?;
        let others: Vec<&ProgramRequirements> = self
            .student
            .programs
            .iter()
            .filter(|p| p.program != audited.program)
            .collect();

        let shared = self
            .graph
            .courses()
            .filter(|c| self.student.completed.contains(&c.code))
            .filter_map(|course| {
                let satisfies: Vec<String> = others
                    .iter()
                    .filter(|p| p.is_satisfied_by(&course.code))
                    .map(|p| p.program.clone())
                    .collect();
                (!satisfies.is_empty()).then(|| CrossProgramCourse {
                    course: course.code.clone(),
                    title: course.title.clone(),
                    satisfies_programs: satisfies,
                    credits_shared: course.credits,
                })
            })
            .collect();
        Ok(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseCode, DegreeRequirement};

    fn code(s: &str) -> CourseCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_zero_required_credits_means_zero_percent() {
        let graph = CourseGraph::build(vec![Course::new(code("CS101"), "Intro", 3.0)], &[]).unwrap();
        let student = StudentRecord::new([code("CS101")].into_iter().collect())
            .with_program(ProgramRequirements::new("Certificate", 0.0));
        let progress = DegreeAudit::new(&graph, &student).progress("Certificate").unwrap();
        assert_eq!(progress.credits_earned, 3.0);
        assert_eq!(progress.percentage_complete, 0.0);
        assert_eq!(progress.credits_remaining, -3.0);
    }

    #[test]
    fn test_undeclared_program_is_not_found() {
        let graph = CourseGraph::build(vec![Course::new(code("CS101"), "Intro", 3.0)], &[]).unwrap();
        let student = StudentRecord::default().with_program(
            ProgramRequirements::new("BSc CS", 120.0)
                .with_requirement(DegreeRequirement::new("Core", 3.0).with_course(code("CS101"), true)),
        );
        let audit = DegreeAudit::new(&graph, &student);
        assert!(matches!(
            audit.requirement_status("BA History"),
            Err(EngineError::NotFound { kind: "program", .. })
        ));
        assert!(audit.progress("BA History").is_err());
        assert!(audit.cross_program_satisfaction("BA History").is_err());
    }
}
