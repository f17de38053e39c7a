// --- courseplan: diagnóstico de catálogos y horarios desde snapshots JSON ---
//
//   courseplan catalog <catalog.json>
//   courseplan recommend <catalog.json> <student.json> [CURSO]
//   courseplan audit <catalog.json> <student.json>
//   courseplan schedule <schedule.json>

use std::env;
use std::process::ExitCode;

use serde_json::json;

use courseplan::api_json::{parse_catalog, parse_schedule, parse_student, read_snapshot};
use courseplan::models::CourseCode;
use courseplan::{
    ConflictDetector, DegreeAudit, EngineConfig, EngineResult, PrerequisiteValidator,
    RecommendationEngine, init_tracing,
};

const USAGE: &str = "usage:
  courseplan catalog <catalog.json>
  courseplan recommend <catalog.json> <student.json> [COURSE]
  courseplan audit <catalog.json> <student.json>
  courseplan schedule <schedule.json>";

fn run_catalog(path: &str, config: &EngineConfig) -> EngineResult<serde_json::Value> {
    let graph = parse_catalog(&read_snapshot(path)?)?.build_graph()?;
    let validator = PrerequisiteValidator::from_config(&graph, config);
    let cycles = validator.detect_cycles();
    let order = validator.topological_order_checked(config.strict_topology)?;
    let active = graph.active_courses().count();
    Ok(json!({
        "courses": graph.len(),
        "prerequisites": graph.edge_count(),
        "cycles": cycles,
        "topological_order": order,
        "complete": order.len() == active,
    }))
}

fn run_recommend(
    catalog_path: &str,
    student_path: &str,
    target: Option<&str>,
    config: &EngineConfig,
) -> EngineResult<serde_json::Value> {
    let catalog = parse_catalog(&read_snapshot(catalog_path)?)?;
    let graph = catalog.build_graph()?;
    let student = parse_student(&read_snapshot(student_path)?)?.into_record(&catalog)?;
    let target: Option<CourseCode> = target.map(|t| t.parse::<CourseCode>()).transpose()?;

    let engine = RecommendationEngine::from_config(PrerequisiteValidator::from_config(&graph, config), config);
    let steps = engine.recommended_sequence(target.as_ref(), &student)?;
    Ok(serde_json::to_value(steps)?)
}

fn run_audit(catalog_path: &str, student_path: &str) -> EngineResult<serde_json::Value> {
    let catalog = parse_catalog(&read_snapshot(catalog_path)?)?;
    let graph = catalog.build_graph()?;
    let student = parse_student(&read_snapshot(student_path)?)?.into_record(&catalog)?;

    let audit = DegreeAudit::new(&graph, &student);
    let mut programs = Vec::with_capacity(student.programs.len());
    for program in &student.programs {
        let name = program.program.as_str();
        programs.push(json!({
            "progress": audit.progress(name)?,
            "requirements": audit.requirement_status(name)?,
            "cross_program": audit.cross_program_satisfaction(name)?,
        }));
    }
    Ok(json!({ "programs": programs }))
}

fn run_schedule(path: &str, config: &EngineConfig) -> EngineResult<serde_json::Value> {
    let snapshot = parse_schedule(&read_snapshot(path)?)?;
    let detector = ConflictDetector::from_config(&snapshot.schedule, config);
    let report = detector.optimize();
    Ok(json!({
        "student": snapshot.schedule.student,
        "term": snapshot.schedule.term.to_string(),
        "total_credits": snapshot.schedule.total_credits(),
        "report": report,
    }))
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();

    let config = match EngineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["catalog", path] => run_catalog(path, &config),
        ["recommend", catalog, student] => run_recommend(catalog, student, None, &config),
        ["recommend", catalog, student, target] => run_recommend(catalog, student, Some(*target), &config),
        ["audit", catalog, student] => run_audit(catalog, student),
        ["schedule", path] => run_schedule(path, &config),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    match result.and_then(|v| Ok(serde_json::to_string_pretty(&v)?)) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "comando fallido");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
