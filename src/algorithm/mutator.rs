// Altas y bajas de ofertas en un horario, validadas contra el detector de conflictos.
use crate::algorithm::conflict::ConflictDetector;
use crate::algorithm::validator::PrerequisiteValidator;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{CompletedCourseSet, Offering, OfferingId, Schedule};

pub struct ScheduleMutator<'a> {
    schedule: &'a mut Schedule,
    enrollment: Option<(PrerequisiteValidator<'a>, &'a CompletedCourseSet)>,
    config: EngineConfig,
}

impl<'a> ScheduleMutator<'a> {
    pub fn new(schedule: &'a mut Schedule) -> Self {
        Self::from_config(schedule, EngineConfig::default())
    }

    pub fn from_config(schedule: &'a mut Schedule, config: EngineConfig) -> Self {
        ScheduleMutator {
            schedule,
            enrollment: None,
            config,
        }
    }

    /// Activa las comprobaciones académicas al inscribir: curso ya aprobado,
    /// prerequisitos pendientes y antirequisitos aprobados.
    pub fn with_enrollment_checks(
        mut self,
        validator: PrerequisiteValidator<'a>,
        completed: &'a CompletedCourseSet,
    ) -> Self {
        self.enrollment = Some((validator, completed));
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &*self.schedule
    }

    fn detector(&self) -> ConflictDetector {
        ConflictDetector::from_config(&*self.schedule, &self.config)
    }

    /// Añade `offering` y devuelve la cantidad de ofertas resultante.
    ///
    /// Rechaza, en este orden: término distinto, oferta repetida, otro paralelo
    /// del mismo curso, reglas académicas (si están activas) y choques de horario.
    /// Si falla, el horario queda intacto.
    pub fn add_offering(&mut self, offering: Offering) -> EngineResult<usize> {
        if offering.term != self.schedule.term {
            return Err(EngineError::TermMismatch {
                offering: offering.id,
                offering_term: offering.term,
                schedule_term: self.schedule.term,
            });
        }
        if self.schedule.contains_offering(offering.id) {
            return Err(EngineError::DuplicateOffering(offering.id));
        }
        if let Some(existing) = self.schedule.offering_for_course(&offering.course) {
            return Err(EngineError::CourseAlreadyScheduled {
                course: offering.course.clone(),
                existing: existing.id,
            });
        }
        if let Some((validator, completed)) = &self.enrollment {
            check_enrollment(validator, completed, &offering)?;
        }

        let check = self.detector().can_add_course(&offering);
        if !check.can_add {
            tracing::info!(
                offering = %offering.id,
                course = %offering.course,
                conflicts = check.conflicts.len(),
                "oferta rechazada por choque de horario"
            );
            return Err(EngineError::ScheduleConflict {
                offering: offering.id,
                conflicts: check.conflicts,
            });
        }

        tracing::debug!(offering = %offering.id, course = %offering.course, "oferta añadida al horario");
        self.schedule.offerings.push(offering);
        Ok(self.schedule.offerings.len())
    }

    /// Quita la oferta `id` y la devuelve.
    pub fn remove_offering(&mut self, id: OfferingId) -> EngineResult<Offering> {
        let pos = self
            .schedule
            .offerings
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| EngineError::not_found("offering", id))?;
        let removed = self.schedule.offerings.remove(pos);
        tracing::debug!(offering = %id, course = %removed.course, "oferta quitada del horario");
        Ok(removed)
    }

    /// Paralelos del mismo curso en `pool` que caben en el horario actual.
    pub fn alternatives(&self, offering: &Offering, pool: &[Offering]) -> Vec<Offering> {
        self.detector().suggest_alternatives(offering, pool)
    }
}

fn check_enrollment(
    validator: &PrerequisiteValidator<'_>,
    completed: &CompletedCourseSet,
    offering: &Offering,
) -> EngineResult<()> {
    let course = &offering.course;
    if completed.contains(course) {
        return Err(EngineError::AlreadyCompleted(course.clone()));
    }
    let check = validator.can_take(course, completed)?;
    if !check.eligible {
        return Err(EngineError::PrerequisitesNotMet {
            course: course.clone(),
            missing: check.missing,
        });
    }
    if let Some(anti) = validator
        .antirequisite_conflicts(course, completed)?
        .into_iter()
        .next()
    {
        return Err(EngineError::AntirequisiteCompleted {
            course: course.clone(),
            antirequisite: anti,
        });
    }
    Ok(())
}
