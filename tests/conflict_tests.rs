use std::collections::BTreeSet;

use courseplan::models::time::parse_slots;
use courseplan::models::{
    Conflict, ConflictKind, Day, Offering, OfferingId, Schedule, Semester, Term,
};
use courseplan::{ConflictDetector, EngineConfig, SlotMatching};

fn fall() -> Term {
    Term::new(Semester::Fall, 2025)
}

fn offering(id: u64, course: &str, meeting: &str, room: Option<&str>) -> Offering {
    let mut o = Offering::new(id, course.parse().unwrap(), 3.0, fall());
    o.time_slots = parse_slots(meeting, room).unwrap();
    o
}

fn schedule(offerings: Vec<Offering>) -> Schedule {
    let mut s = Schedule::new("s-001", fall());
    s.offerings = offerings;
    s
}

/// Conflictos como conjunto de (tipo, par no ordenado de ofertas, ventana).
fn conflict_set(conflicts: &[Conflict]) -> BTreeSet<(String, OfferingId, OfferingId, String)> {
    conflicts
        .iter()
        .map(|c| {
            let (a, b) = (c.offerings[0], c.offerings[1]);
            (
                format!("{:?}", c.kind),
                a.min(b),
                a.max(b),
                c.time_range.to_string(),
            )
        })
        .collect()
}

#[test]
fn test_scenario_c_time_overlap_window() {
    let s = schedule(vec![
        offering(1, "CS101", "monday 09:00-10:30", None),
        offering(2, "MATH101", "monday 10:00-11:00", None),
    ]);
    let conflicts = ConflictDetector::new(&s).detect_conflicts();
    assert_eq!(conflicts.len(), 1);
    let c = &conflicts[0];
    assert_eq!(c.kind, ConflictKind::Time);
    assert_eq!(c.day, Day::Monday);
    assert_eq!(c.time_range.to_string(), "10:00-10:30");
    assert_eq!(c.description, "Time conflict between CS101 and MATH101");
    assert_eq!(c.offerings, vec![OfferingId(1), OfferingId(2)]);
}

#[test]
fn test_scenario_d_location_requires_identical_key() {
    let identical = schedule(vec![
        offering(1, "CS101", "TUE 13:00-14:30", Some("Room 101")),
        offering(2, "CS102", "TUE 13:00-14:30", Some("Room 101")),
    ]);
    let conflicts = ConflictDetector::new(&identical).detect_conflicts();
    let loc: Vec<&Conflict> = conflicts.iter().filter(|c| c.kind == ConflictKind::Location).collect();
    assert_eq!(loc.len(), 1);
    assert_eq!(loc[0].location.as_deref(), Some("Room 101"));
    assert_eq!(
        loc[0].description,
        "Location conflict: CS101 and CS102 both scheduled in Room 101"
    );
    // el choque de tiempo subyacente se informa aparte
    assert_eq!(conflicts.iter().filter(|c| c.kind == ConflictKind::Time).count(), 1);
    assert_eq!(conflicts[0].locations, vec!["Room 101".to_string(), "Room 101".to_string()]);

    let partial = schedule(vec![
        offering(1, "CS101", "TUE 13:00-14:30", Some("Room 101")),
        offering(2, "CS102", "TUE 14:00-15:00", Some("Room 101")),
    ]);
    let conflicts = ConflictDetector::new(&partial).detect_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::Time);
}

#[test]
fn test_scenario_e_tuesday_gap() {
    let s = schedule(vec![
        offering(1, "CS101", "TUE 09:00-10:30", None),
        offering(2, "CS102", "TUE 12:00-13:00", None),
    ]);
    let gaps = ConflictDetector::new(&s).find_gaps();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].day, Day::Tuesday);
    assert_eq!(gaps[0].duration_minutes, 90);
    assert_eq!(gaps[0].start.format("%H:%M").to_string(), "10:30");
}

#[test]
fn test_gap_threshold_is_configurable() {
    let s = schedule(vec![
        offering(1, "CS101", "WED 09:00-10:00", None),
        offering(2, "CS102", "WED 10:45-11:45", None),
    ]);
    assert!(ConflictDetector::new(&s).find_gaps().is_empty());

    let config = EngineConfig {
        gap_threshold_minutes: 30,
        ..EngineConfig::default()
    };
    assert_eq!(ConflictDetector::from_config(&s, &config).find_gaps().len(), 1);
}

fn busy_offerings() -> Vec<Offering> {
    vec![
        offering(1, "CS101", "MON WED 09:00-10:30", Some("Room 101")).with_instructor("Dr. Ruiz"),
        offering(2, "CS102", "MON 09:00-10:30", Some("Room 101")).with_instructor("Dr. Ruiz"),
        offering(3, "CS103", "MON 09:00-10:30", Some("Room 101")),
        offering(4, "MATH101", "WED 10:00-11:00", Some("Lab B")),
        offering(5, "PHYS101", "FRI 08:00-09:00", None),
    ]
}

#[test]
fn test_detect_conflicts_symmetric_under_reordering() {
    let forward = schedule(busy_offerings());
    let mut reversed_offerings = busy_offerings();
    reversed_offerings.reverse();
    let reversed = schedule(reversed_offerings);

    for matching in [SlotMatching::Exact, SlotMatching::Overlap] {
        let a = ConflictDetector::new(&forward).with_matching(matching).detect_conflicts();
        let b = ConflictDetector::new(&reversed).with_matching(matching).detect_conflicts();
        assert_eq!(a.len(), b.len());
        assert_eq!(conflict_set(&a), conflict_set(&b));
    }
}

#[test]
fn test_keyed_group_reports_every_pair() {
    let conflicts = ConflictDetector::new(&schedule(busy_offerings())).detect_conflicts();
    // tres ofertas en Room 101 el lunes 09:00-10:30 -> 3 pares
    assert_eq!(conflicts.iter().filter(|c| c.kind == ConflictKind::Location).count(), 3);
    assert_eq!(conflicts.iter().filter(|c| c.kind == ConflictKind::Instructor).count(), 1);
    // lunes: 3 pares; miércoles: CS101 x MATH101
    assert_eq!(conflicts.iter().filter(|c| c.kind == ConflictKind::Time).count(), 4);
}

#[test]
fn test_detect_conflicts_is_idempotent() {
    let s = schedule(busy_offerings());
    let detector = ConflictDetector::new(&s);
    assert_eq!(detector.detect_conflicts(), detector.detect_conflicts());
    assert!(detector.has_conflicts());
}

#[test]
fn test_can_add_agrees_with_detect() {
    let base = vec![
        offering(1, "CS101", "MON WED 09:00-10:30", Some("Room 101")),
        offering(2, "CS102", "TUE THU 13:00-14:30", Some("Room 202")),
    ];
    let candidates = vec![
        offering(10, "MATH101", "MON WED 10:30-11:30", Some("Room 101")),
        offering(11, "MATH102", "TUE 14:00-15:00", None),
        offering(12, "PHYS101", "FRI 09:00-12:00", Some("Lab A")),
        offering(13, "ENG101", "WED 08:00-09:15", None),
    ];

    for cand in candidates {
        let s = schedule(base.clone());
        let check = ConflictDetector::new(&s).can_add_course(&cand);

        let mut with = s.clone();
        with.offerings.push(cand.clone());
        let after = ConflictDetector::new(&with).detect_conflicts();
        let involving = after.iter().filter(|c| c.involves(cand.id)).count();

        if check.can_add {
            assert_eq!(involving, 0, "{} se pudo añadir pero genera conflictos", cand.course);
        } else {
            assert!(involving > 0);
            assert!(check.conflicts.iter().all(|c| c.description.starts_with("Would conflict with")));
        }
    }
}

#[test]
fn test_suggest_alternatives_filters_pool() {
    let s = schedule(vec![offering(1, "CS101", "MON 09:00-10:30", None)]);
    let wanted = offering(20, "MATH101", "MON 10:00-11:00", None);
    let mut other_term = offering(23, "MATH101", "TUE 09:00-10:00", None);
    other_term.term = Term::new(Semester::Spring, 2026);
    let pool = vec![
        wanted.clone(),
        offering(21, "MATH101", "MON 09:30-10:30", None),
        offering(22, "MATH101", "THU 09:00-10:00", None).with_section("002"),
        other_term,
        offering(24, "MATH102", "FRI 09:00-10:00", None),
    ];
    let alts = ConflictDetector::new(&s).suggest_alternatives(&wanted, &pool);
    let ids: Vec<OfferingId> = alts.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![OfferingId(22)]);
}

#[test]
fn test_optimize_report_totals() {
    let s = schedule(vec![
        offering(1, "CS101", "MON WED 09:00-10:30", None),
        offering(2, "CS102", "MON 12:00-13:00", None),
    ]);
    let report = ConflictDetector::new(&s).optimize();
    assert!(report.conflicts.is_empty());
    assert_eq!(report.gaps.len(), 1);
    assert_eq!(report.workload.total_minutes, 240);
    assert_eq!(report.workload.total_credits, 9.0);
    assert_eq!(s.total_credits(), 6.0);
    assert_eq!(report.recommendations.len(), 1);
    assert_eq!(
        report.recommendations[0].message,
        "Consider filling 1 time gaps in your schedule"
    );
}
