// Detección de conflictos de horario (tiempo, sala, profesor), ventanas libres y carga semanal.
//
// Se construye una vez por horario aplanando los bloques de todas sus ofertas.
// Los tres pases son independientes y sus resultados se concatenan: un choque
// de sala y el choque de tiempo subyacente se informan por separado.
use std::collections::{BTreeMap, HashMap};

use crate::config::{EngineConfig, SlotMatching};
use crate::models::{
    CanAddResult, Conflict, ConflictKind, CourseCode, Day, Gap, Offering, OfferingId,
    OptimizationReport, Schedule, Severity, Suggestion, SuggestionKind, SuggestionPriority, Term,
    TimeSlot, Workload,
};
use crate::models::time::minutes_between;

/// Bloque del horario con los datos de su oferta.
#[derive(Debug, Clone)]
struct ScheduledSlot {
    slot: TimeSlot,
    course: CourseCode,
    offering: OfferingId,
    instructor: Option<String>,
    credits: f64,
}

fn flatten(offering: &Offering) -> impl Iterator<Item = ScheduledSlot> + '_ {
    offering.time_slots.iter().map(move |slot| ScheduledSlot {
        slot: slot.clone(),
        course: offering.course.clone(),
        offering: offering.id,
        instructor: offering.instructor_name().map(str::to_string),
        credits: offering.credits,
    })
}

pub struct ConflictDetector {
    term: Term,
    slots: Vec<ScheduledSlot>,
    matching: SlotMatching,
    gap_threshold_minutes: i64,
}

impl ConflictDetector {
    pub fn new(schedule: &Schedule) -> Self {
        Self::from_config(schedule, &EngineConfig::default())
    }

    pub fn from_config(schedule: &Schedule, config: &EngineConfig) -> Self {
        let slots: Vec<ScheduledSlot> = schedule.offerings.iter().flat_map(flatten).collect();
        tracing::debug!(
            offerings = schedule.offerings.len(),
            slots = slots.len(),
            "detector de conflictos construido"
        );
        ConflictDetector {
            term: schedule.term,
            slots,
            matching: config.slot_matching,
            gap_threshold_minutes: config.gap_threshold_minutes,
        }
    }

    pub fn with_matching(mut self, matching: SlotMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Todos los conflictos: tiempo, luego sala, luego profesor.
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = self.time_conflicts();
        conflicts.extend(self.keyed_conflicts(ConflictKind::Location));
        conflicts.extend(self.keyed_conflicts(ConflictKind::Instructor));
        if !conflicts.is_empty() {
            tracing::info!(count = conflicts.len(), "conflictos detectados en el horario");
        }
        conflicts
    }

    /// Comprobación rápida: ¿hay al menos un choque de tiempo?
    pub fn has_conflicts(&self) -> bool {
        self.slots.iter().enumerate().any(|(i, a)| {
            self.slots[i + 1..].iter().any(|b| a.slot.overlaps(&b.slot))
        })
    }

    fn time_conflicts(&self) -> Vec<Conflict> {
        let mut out = Vec::new();
        for (i, a) in self.slots.iter().enumerate() {
            for b in &self.slots[i + 1..] {
                if a.slot.overlaps(&b.slot) {
                    out.push(time_conflict(
                        a,
                        b,
                        format!("Time conflict between {} and {}", a.course, b.course),
                    ));
                }
            }
        }
        out
    }

    /// Pases de sala/profesor. Con `Exact` agrupa por (día, inicio, fin, clave)
    /// y emite un conflicto por cada par del grupo; los solapamientos parciales
    /// NO cuentan. Con `Overlap` compara pares de la misma clave que se solapan.
    fn keyed_conflicts(&self, kind: ConflictKind) -> Vec<Conflict> {
        let key_of = |s: &ScheduledSlot| -> Option<String> {
            match kind {
                ConflictKind::Location => s.slot.location.clone(),
                ConflictKind::Instructor => s.instructor.clone(),
                ConflictKind::Time => None,
            }
        };

        let mut out = Vec::new();
        match self.matching {
            SlotMatching::Exact => {
                // grupos en orden de primera aparición
                let mut index: HashMap<(Day, chrono::NaiveTime, chrono::NaiveTime, String), usize> = HashMap::new();
                let mut groups: Vec<Vec<&ScheduledSlot>> = Vec::new();
                for s in &self.slots {
                    let Some(key) = key_of(s) else { continue };
                    let k = (s.slot.day, s.slot.start, s.slot.end, key);
                    match index.get(&k) {
                        Some(&g) => groups[g].push(s),
                        None => {
                            index.insert(k, groups.len());
                            groups.push(vec![s]);
                        }
                    }
                }
                for group in groups.iter().filter(|g| g.len() >= 2) {
                    for (i, a) in group.iter().enumerate() {
                        for b in &group[i + 1..] {
                            out.push(keyed_conflict(kind, a, b));
                        }
                    }
                }
            }
            SlotMatching::Overlap => {
                for (i, a) in self.slots.iter().enumerate() {
                    let Some(ka) = key_of(a) else { continue };
                    for b in &self.slots[i + 1..] {
                        if key_of(b).as_deref() == Some(ka.as_str()) && a.slot.overlaps(&b.slot) {
                            out.push(keyed_conflict(kind, a, b));
                        }
                    }
                }
            }
        }
        out
    }

    /// ¿Se puede añadir `offering` sin choques de tiempo con el horario actual?
    /// Sólo compara los bloques nuevos contra los existentes, no entre sí.
    pub fn can_add_course(&self, offering: &Offering) -> CanAddResult {
        let mut conflicts = Vec::new();
        for new_slot in flatten(offering) {
            for existing in &self.slots {
                if new_slot.slot.overlaps(&existing.slot) {
                    conflicts.push(time_conflict(
                        &new_slot,
                        existing,
                        format!("Would conflict with {}", existing.course),
                    ));
                }
            }
        }
        CanAddResult {
            can_add: conflicts.is_empty(),
            conflicts,
        }
    }

    /// Otras ofertas del mismo curso en el término del horario que se pueden añadir sin choques.
    pub fn suggest_alternatives(&self, offering: &Offering, pool: &[Offering]) -> Vec<Offering> {
        pool.iter()
            .filter(|o| o.course == offering.course && o.term == self.term && o.id != offering.id)
            .filter(|o| self.can_add_course(o).can_add)
            .cloned()
            .collect()
    }

    /// Ventanas libres de lunes a viernes de al menos el umbral configurado
    /// (60 min por defecto). Se mide contra el fin más tardío visto en el día,
    /// así una ventana nunca contiene otra clase.
    pub fn find_gaps(&self) -> Vec<Gap> {
        let mut gaps = Vec::new();
        for day in Day::WEEKDAYS {
            let mut day_slots: Vec<&TimeSlot> =
                self.slots.iter().map(|s| &s.slot).filter(|s| s.day == day).collect();
            day_slots.sort_by_key(|s| (s.start, s.end));

            let mut iter = day_slots.into_iter();
            let Some(first) = iter.next() else { continue };
            let mut latest_end = first.end;
            for next in iter {
                let free = minutes_between(latest_end, next.start);
                if free >= self.gap_threshold_minutes {
                    gaps.push(Gap {
                        day,
                        start: latest_end,
                        end: next.start,
                        duration_minutes: free,
                    });
                }
                latest_end = latest_end.max(next.end);
            }
        }
        gaps
    }

    /// Créditos y minutos por día. Un curso que se dicta tres días suma sus créditos tres veces.
    pub fn analyze_workload(&self) -> Workload {
        let mut daily_credits: BTreeMap<Day, f64> = BTreeMap::new();
        let mut daily_minutes: BTreeMap<Day, i64> = BTreeMap::new();
        for s in &self.slots {
            *daily_credits.entry(s.slot.day).or_insert(0.0) += s.credits;
            *daily_minutes.entry(s.slot.day).or_insert(0) += s.slot.duration_minutes();
        }
        Workload {
            total_credits: daily_credits.values().sum(),
            total_minutes: daily_minutes.values().sum(),
            daily_credits,
            daily_minutes,
        }
    }

    pub fn optimize(&self) -> OptimizationReport {
        let conflicts = self.detect_conflicts();
        let gaps = self.find_gaps();
        let workload = self.analyze_workload();

        let mut recommendations = Vec::new();
        if !conflicts.is_empty() {
            recommendations.push(Suggestion {
                kind: SuggestionKind::ResolveConflicts,
                priority: SuggestionPriority::High,
                message: format!("Resolve {} conflicts in your schedule", conflicts.len()),
            });
        }
        if !gaps.is_empty() {
            recommendations.push(Suggestion {
                kind: SuggestionKind::FillGaps,
                priority: SuggestionPriority::Medium,
                message: format!("Consider filling {} time gaps in your schedule", gaps.len()),
            });
        }

        OptimizationReport {
            conflicts,
            gaps,
            workload,
            recommendations,
        }
    }
}

fn time_conflict(a: &ScheduledSlot, b: &ScheduledSlot, description: String) -> Conflict {
    Conflict {
        kind: ConflictKind::Time,
        severity: Severity::High,
        description,
        courses: vec![a.course.clone(), b.course.clone()],
        offerings: vec![a.offering, b.offering],
        day: a.slot.day,
        time_range: a.slot.overlap_window(&b.slot),
        locations: [&a.slot.location, &b.slot.location]
            .into_iter()
            .flatten()
            .cloned()
            .collect(),
        location: None,
        instructor: None,
    }
}

fn keyed_conflict(kind: ConflictKind, a: &ScheduledSlot, b: &ScheduledSlot) -> Conflict {
    let (description, location, instructor) = match kind {
        ConflictKind::Instructor => {
            let who = a.instructor.clone().unwrap_or_default();
            (
                format!("Instructor conflict: {} scheduled for both {} and {}", who, a.course, b.course),
                None,
                Some(who),
            )
        }
        _ => {
            let room = a.slot.location.clone().unwrap_or_default();
            (
                format!("Location conflict: {} and {} both scheduled in {}", a.course, b.course, room),
                Some(room),
                None,
            )
        }
    };
    Conflict {
        kind,
        severity: Severity::High,
        description,
        courses: vec![a.course.clone(), b.course.clone()],
        offerings: vec![a.offering, b.offering],
        day: a.slot.day,
        time_range: a.slot.overlap_window(&b.slot),
        locations: Vec::new(),
        location,
        instructor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Semester, time::parse_slots};

    fn term() -> Term {
        Term::new(Semester::Fall, 2025)
    }

    fn offering(id: u64, course: &str, meeting: &str, room: Option<&str>) -> Offering {
        let mut o = Offering::new(id, course.parse().unwrap(), 3.0, term());
        o.time_slots = parse_slots(meeting, room).unwrap();
        o
    }

    fn schedule(offerings: Vec<Offering>) -> Schedule {
        let mut s = Schedule::new("student", term());
        s.offerings = offerings;
        s
    }

    #[test]
    fn test_back_to_back_is_not_a_conflict() {
        let s = schedule(vec![
            offering(1, "CS101", "MON 09:00-10:00", None),
            offering(2, "CS102", "MON 10:00-11:00", None),
        ]);
        let d = ConflictDetector::new(&s);
        assert!(!d.has_conflicts());
        assert!(d.detect_conflicts().is_empty());
    }

    #[test]
    fn test_instructor_conflict_on_identical_key() {
        let s = schedule(vec![
            offering(1, "CS101", "TUE 13:00-14:00", None).with_instructor("Dr. Ruiz"),
            offering(2, "CS102", "TUE 13:00-14:00", None).with_instructor("Dr. Ruiz"),
            offering(3, "CS103", "WED 13:00-14:00", None).with_instructor(""),
        ]);
        let conflicts = ConflictDetector::new(&s).detect_conflicts();
        let instr: Vec<_> = conflicts.iter().filter(|c| c.kind == ConflictKind::Instructor).collect();
        assert_eq!(instr.len(), 1);
        assert_eq!(instr[0].instructor.as_deref(), Some("Dr. Ruiz"));
        assert_eq!(conflicts.iter().filter(|c| c.kind == ConflictKind::Time).count(), 1);
    }

    #[test]
    fn test_overlap_matching_catches_partial_room_clash() {
        let s = schedule(vec![
            offering(1, "CS101", "MON 09:00-10:30", Some("Room 101")),
            offering(2, "CS102", "MON 10:00-11:00", Some("Room 101")),
        ]);
        let exact = ConflictDetector::new(&s).detect_conflicts();
        assert!(!exact.iter().any(|c| c.kind == ConflictKind::Location));

        let overlap = ConflictDetector::new(&s)
            .with_matching(SlotMatching::Overlap)
            .detect_conflicts();
        let loc: Vec<_> = overlap.iter().filter(|c| c.kind == ConflictKind::Location).collect();
        assert_eq!(loc.len(), 1);
        assert_eq!(loc[0].time_range.to_string(), "10:00-10:30");
    }

    #[test]
    fn test_gap_ignores_time_covered_by_long_class() {
        let s = schedule(vec![
            offering(1, "CS101", "THU 09:00-17:00", None),
            offering(2, "CS102", "THU 10:00-11:00", None),
            offering(3, "CS103", "THU 12:00-13:00", None),
        ]);
        assert!(ConflictDetector::new(&s).find_gaps().is_empty());
    }

    #[test]
    fn test_weekend_slots_have_no_gaps() {
        let s = schedule(vec![
            offering(1, "CS101", "SAT 08:00-09:00", None),
            offering(2, "CS102", "SAT 12:00-13:00", None),
        ]);
        let d = ConflictDetector::new(&s);
        assert!(d.find_gaps().is_empty());
        // pero sí cuentan en la carga
        assert_eq!(d.analyze_workload().total_minutes, 120);
    }

    #[test]
    fn test_workload_counts_credits_per_meeting_day() {
        let s = schedule(vec![offering(1, "CS101", "MON WED FRI 09:00-10:00", None)]);
        let w = ConflictDetector::new(&s).analyze_workload();
        assert_eq!(w.daily_credits.len(), 3);
        assert_eq!(w.daily_credits[&Day::Wednesday], 3.0);
        assert_eq!(w.total_credits, 9.0);
        assert_eq!(w.daily_minutes[&Day::Monday], 60);
        assert_eq!(w.total_minutes, 180);
    }

    #[test]
    fn test_optimize_adds_prioritized_suggestions() {
        let s = schedule(vec![
            offering(1, "CS101", "MON 09:00-10:30", None),
            offering(2, "CS102", "MON 10:00-11:00", None),
            offering(3, "CS103", "MON 13:00-14:00", None),
        ]);
        let report = ConflictDetector::new(&s).optimize();
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.recommendations[0].kind, SuggestionKind::ResolveConflicts);
        assert_eq!(report.recommendations[0].priority, SuggestionPriority::High);
        assert_eq!(report.recommendations[1].message, "Consider filling 1 time gaps in your schedule");

        let empty = ConflictDetector::new(&schedule(vec![])).optimize();
        assert!(empty.recommendations.is_empty());
    }
}
