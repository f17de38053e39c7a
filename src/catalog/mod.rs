//! Índice del catálogo: grafo dirigido prerequisito -> dependiente.
//!
//! Submódulos:
//! - `cache`: caché de grafos construidos, por término
//! - `import`: resolución en lote de códigos de curso con resultado por ítem
//!
//! El grafo se carga una sola vez desde los registros del catálogo (sin
//! consultas por nodo) y se indexa por `CourseCode`, no por claves de base de
//! datos, para poder reconstruirlo desde fuera.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::{EngineError, EngineResult, InvalidGraphReason};
use crate::models::{Course, CourseCode, GroupId, PrerequisiteEdge, PrerequisiteGroup};

pub mod cache;
pub mod import;

pub use cache::GraphCache;
pub use import::{ImportOutcome, ImportReport, SkipReason, import_course_codes};

/// Peso de una arista: grupo "cualquiera de" al que pertenece, si alguno.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requisite {
    pub group: Option<GroupId>,
}

/// Grafo del catálogo. Invariantes: las aristas sólo referencian cursos del
/// grafo y ningún curso es prerequisito de sí mismo.
#[derive(Debug, Clone)]
pub struct CourseGraph {
    graph: DiGraph<Course, Requisite>,
    node_map: HashMap<CourseCode, NodeIndex>,
    groups: HashMap<GroupId, PrerequisiteGroup>,
    // pares simétricos guardados una sola vez como (menor, mayor)
    corequisites: BTreeSet<(NodeIndex, NodeIndex)>,
    antirequisites: BTreeSet<(NodeIndex, NodeIndex)>,
}

/// Constructor con las relaciones opcionales (grupos, correquisitos, antirequisitos).
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    courses: Vec<Course>,
    edges: Vec<PrerequisiteEdge>,
    groups: Vec<PrerequisiteGroup>,
    corequisites: Vec<(CourseCode, CourseCode)>,
    antirequisites: Vec<(CourseCode, CourseCode)>,
}

impl CatalogBuilder {
    pub fn courses(mut self, courses: impl IntoIterator<Item = Course>) -> Self {
        self.courses.extend(courses);
        self
    }

    pub fn prerequisites(mut self, edges: impl IntoIterator<Item = PrerequisiteEdge>) -> Self {
        self.edges.extend(edges);
        self
    }

    pub fn groups(mut self, groups: impl IntoIterator<Item = PrerequisiteGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn corequisites(mut self, pairs: impl IntoIterator<Item = (CourseCode, CourseCode)>) -> Self {
        self.corequisites.extend(pairs);
        self
    }

    pub fn antirequisites(mut self, pairs: impl IntoIterator<Item = (CourseCode, CourseCode)>) -> Self {
        self.antirequisites.extend(pairs);
        self
    }

    /// Valida todo el catálogo antes de devolver el grafo; cualquier referencia
    /// desconocida, auto-referencia o grupo repetido o ajeno aborta con `InvalidGraph`.
    pub fn build(self) -> EngineResult<CourseGraph> {
        let mut graph: DiGraph<Course, Requisite> =
            DiGraph::with_capacity(self.courses.len(), self.edges.len());
        let mut node_map: HashMap<CourseCode, NodeIndex> = HashMap::with_capacity(self.courses.len());

        for course in self.courses {
            if node_map.contains_key(&course.code) {
                return Err(EngineError::invalid_graph(InvalidGraphReason::DuplicateCourse {
                    course: course.code,
                }));
            }
            let code = course.code.clone();
            let idx = graph.add_node(course);
            node_map.insert(code, idx);
        }

        let mut groups: HashMap<GroupId, PrerequisiteGroup> = HashMap::with_capacity(self.groups.len());
        for group in self.groups {
            lookup(&node_map, &group.course, || format!("group {}", group.id))?;
            if groups.contains_key(&group.id) {
                return Err(EngineError::invalid_graph(InvalidGraphReason::DuplicateGroup { group: group.id }));
            }
            groups.insert(group.id, group);
        }

        for edge in &self.edges {
            let to = lookup(&node_map, &edge.course, || format!("prerequisite edge {}", edge.prerequisite))?;
            let from = lookup(&node_map, &edge.prerequisite, || format!("prerequisite edge of {}", edge.course))?;
            if from == to {
                return Err(EngineError::invalid_graph(InvalidGraphReason::SelfLoop {
                    course: edge.course.clone(),
                }));
            }
            if let Some(g) = edge.group {
                let Some(declared) = groups.get(&g) else {
                    return Err(EngineError::invalid_graph(InvalidGraphReason::UnknownGroup { group: g }));
                };
                // un grupo solo agrupa prerequisitos de su propio curso
                if declared.course != edge.course {
                    return Err(EngineError::invalid_graph(InvalidGraphReason::ForeignGroup {
                        group: g,
                        course: edge.course.clone(),
                        owner: declared.course.clone(),
                    }));
                }
            }
            // (curso, prerequisito) es único: duplicados se ignoran
            if graph.find_edge(from, to).is_none() {
                graph.add_edge(from, to, Requisite { group: edge.group });
            }
        }

        let corequisites = symmetric_pairs(&node_map, &self.corequisites, "corequisite")?;
        let antirequisites = symmetric_pairs(&node_map, &self.antirequisites, "antirequisite")?;

        tracing::debug!(
            courses = graph.node_count(),
            edges = graph.edge_count(),
            groups = groups.len(),
            "grafo de catálogo construido"
        );

        Ok(CourseGraph {
            graph,
            node_map,
            groups,
            corequisites,
            antirequisites,
        })
    }
}

fn lookup(
    node_map: &HashMap<CourseCode, NodeIndex>,
    code: &CourseCode,
    referenced_by: impl FnOnce() -> String,
) -> EngineResult<NodeIndex> {
    node_map.get(code).copied().ok_or_else(|| {
        EngineError::invalid_graph(InvalidGraphReason::UnknownCourse {
            course: code.clone(),
            referenced_by: referenced_by(),
        })
    })
}

fn symmetric_pairs(
    node_map: &HashMap<CourseCode, NodeIndex>,
    pairs: &[(CourseCode, CourseCode)],
    relation: &str,
) -> EngineResult<BTreeSet<(NodeIndex, NodeIndex)>> {
    let mut out = BTreeSet::new();
    for (a, b) in pairs {
        let ia = lookup(node_map, a, || format!("{} of {}", relation, b))?;
        let ib = lookup(node_map, b, || format!("{} of {}", relation, a))?;
        if ia == ib {
            return Err(EngineError::invalid_graph(InvalidGraphReason::SelfLoop { course: a.clone() }));
        }
        out.insert(canonical(ia, ib));
    }
    Ok(out)
}

fn canonical(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b { (a, b) } else { (b, a) }
}

impl CourseGraph {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// `build(courses, edges)`: sólo cursos y prerequisitos.
    pub fn build(courses: Vec<Course>, edges: &[PrerequisiteEdge]) -> EngineResult<CourseGraph> {
        CatalogBuilder::default()
            .courses(courses)
            .prerequisites(edges.iter().cloned())
            .build()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn course(&self, code: &CourseCode) -> Option<&Course> {
        self.node_map.get(code).map(|&idx| &self.graph[idx])
    }

    /// Como `course` pero con `NotFound` si no está en el snapshot.
    pub fn require(&self, code: &CourseCode) -> EngineResult<&Course> {
        self.course(code)
            .ok_or_else(|| EngineError::not_found("course", code))
    }

    pub fn group(&self, id: GroupId) -> Option<&PrerequisiteGroup> {
        self.groups.get(&id)
    }

    /// Grupos declarados para `code`, ordenados por id.
    pub fn groups_of(&self, code: &CourseCode) -> Vec<&PrerequisiteGroup> {
        let mut out: Vec<&PrerequisiteGroup> =
            self.groups.values().filter(|g| &g.course == code).collect();
        out.sort_by_key(|g| g.id);
        out
    }

    /// Cursos en orden de catálogo.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn active_courses(&self) -> impl Iterator<Item = &Course> {
        self.courses().filter(|c| c.active)
    }

    pub fn prerequisites_of(&self, code: &CourseCode) -> Vec<CourseCode> {
        self.node_map
            .get(code)
            .map(|&idx| {
                self.prerequisite_edges(idx)
                    .into_iter()
                    .map(|(p, _)| self.graph[p].code.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn dependents_of(&self, code: &CourseCode) -> Vec<CourseCode> {
        self.node_map
            .get(code)
            .map(|&idx| {
                self.dependent_indices(idx)
                    .into_iter()
                    .map(|d| self.graph[d].code.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cuántos cursos listan a `code` como prerequisito directo.
    pub fn unlock_count(&self, code: &CourseCode) -> usize {
        self.node_map
            .get(code)
            .map(|&idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    pub fn corequisites_of(&self, code: &CourseCode) -> Vec<CourseCode> {
        self.partners(&self.corequisites, code)
    }

    pub fn antirequisites_of(&self, code: &CourseCode) -> Vec<CourseCode> {
        self.partners(&self.antirequisites, code)
    }

    pub fn are_corequisites(&self, a: &CourseCode, b: &CourseCode) -> bool {
        self.pair_member(&self.corequisites, a, b)
    }

    pub fn are_antirequisites(&self, a: &CourseCode, b: &CourseCode) -> bool {
        self.pair_member(&self.antirequisites, a, b)
    }

    fn partners(&self, set: &BTreeSet<(NodeIndex, NodeIndex)>, code: &CourseCode) -> Vec<CourseCode> {
        let Some(&idx) = self.node_map.get(code) else {
            return Vec::new();
        };
        set.iter()
            .filter_map(|&(a, b)| {
                if a == idx {
                    Some(b)
                } else if b == idx {
                    Some(a)
                } else {
                    None
                }
            })
            .map(|other| self.graph[other].code.clone())
            .collect()
    }

    fn pair_member(&self, set: &BTreeSet<(NodeIndex, NodeIndex)>, a: &CourseCode, b: &CourseCode) -> bool {
        match (self.node_map.get(a), self.node_map.get(b)) {
            (Some(&ia), Some(&ib)) => set.contains(&canonical(ia, ib)),
            _ => false,
        }
    }

    // --- acceso por índice para los motores ---

    pub(crate) fn index_of(&self, code: &CourseCode) -> Option<NodeIndex> {
        self.node_map.get(code).copied()
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &Course {
        &self.graph[idx]
    }

    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Prerequisitos directos de `idx` en orden de declaración, con su grupo.
    pub(crate) fn prerequisite_edges(&self, idx: NodeIndex) -> Vec<(NodeIndex, Option<GroupId>)> {
        let mut edges: Vec<(EdgeIndex, NodeIndex, Option<GroupId>)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.id(), e.source(), e.weight().group))
            .collect();
        // petgraph devuelve las aristas de la más nueva a la más antigua
        edges.sort_by_key(|(id, _, _)| *id);
        edges.into_iter().map(|(_, src, g)| (src, g)).collect()
    }

    /// Dependientes directos de `idx` en orden de declaración.
    pub(crate) fn dependent_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, t)| t).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CourseCode {
        s.parse().unwrap()
    }

    fn course(s: &str) -> Course {
        Course::new(code(s), s, 3.0)
    }

    #[test]
    fn test_build_indexes_both_directions() {
        let g = CourseGraph::build(
            vec![course("CS101"), course("CS201"), course("MATH100")],
            &[
                PrerequisiteEdge::new(code("CS101"), code("CS201")),
                PrerequisiteEdge::new(code("MATH100"), code("CS201")),
            ],
        )
        .unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.prerequisites_of(&code("CS201")), vec![code("CS101"), code("MATH100")]);
        assert_eq!(g.dependents_of(&code("CS101")), vec![code("CS201")]);
        assert_eq!(g.unlock_count(&code("MATH100")), 1);
        assert_eq!(g.unlock_count(&code("CS201")), 0);
    }

    #[test]
    fn test_unknown_course_is_rejected() {
        let err = CourseGraph::build(
            vec![course("CS101")],
            &[PrerequisiteEdge::new(code("CS100"), code("CS101"))],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidGraph { reason: InvalidGraphReason::UnknownCourse { .. } }
        ));
    }

    #[test]
    fn test_self_loop_is_rejected() {
        let err = CourseGraph::build(
            vec![course("CS101")],
            &[PrerequisiteEdge::new(code("CS101"), code("CS101"))],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidGraph { reason: InvalidGraphReason::SelfLoop { .. } }
        ));
    }

    #[test]
    fn test_duplicate_course_and_unknown_group() {
        let err = CourseGraph::build(vec![course("CS101"), course("CS101")], &[]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidGraph { reason: InvalidGraphReason::DuplicateCourse { .. } }
        ));

        let err = CourseGraph::build(
            vec![course("CS101"), course("CS201")],
            &[PrerequisiteEdge::new(code("CS101"), code("CS201")).in_group(GroupId(9))],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidGraph { reason: InvalidGraphReason::UnknownGroup { .. } }
        ));
    }

    fn group(id: u32, course: &str) -> PrerequisiteGroup {
        PrerequisiteGroup {
            id: GroupId(id),
            course: code(course),
            name: format!("group {id}"),
            required: true,
        }
    }

    #[test]
    fn test_repeated_or_foreign_groups_rejected() {
        let courses = vec![course("MATH101"), course("MATH102"), course("CS201"), course("CS202")];

        let err = CourseGraph::builder()
            .courses(courses.clone())
            .groups(vec![group(1, "CS201"), group(1, "CS202")])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidGraph { reason: InvalidGraphReason::DuplicateGroup { group: GroupId(1) } }
        ));

        // el grupo 1 es de CS201; CS202 no puede colgarse de él
        let err = CourseGraph::builder()
            .courses(courses.clone())
            .groups(vec![group(1, "CS201")])
            .prerequisites(vec![
                PrerequisiteEdge::new(code("MATH101"), code("CS201")).in_group(GroupId(1)),
                PrerequisiteEdge::new(code("MATH102"), code("CS202")).in_group(GroupId(1)),
            ])
            .build()
            .unwrap_err();
        match err {
            EngineError::InvalidGraph { reason: InvalidGraphReason::ForeignGroup { group, course, owner } } => {
                assert_eq!(group, GroupId(1));
                assert_eq!(course, code("CS202"));
                assert_eq!(owner, code("CS201"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let ok = CourseGraph::builder()
            .courses(courses)
            .groups(vec![group(1, "CS201"), group(2, "CS202")])
            .prerequisites(vec![
                PrerequisiteEdge::new(code("MATH101"), code("CS201")).in_group(GroupId(1)),
                PrerequisiteEdge::new(code("MATH102"), code("CS202")).in_group(GroupId(2)),
            ])
            .build()
            .unwrap();
        assert_eq!(ok.groups_of(&code("CS202")).len(), 1);
    }

    #[test]
    fn test_duplicate_edges_stored_once() {
        let g = CourseGraph::build(
            vec![course("CS101"), course("CS201")],
            &[
                PrerequisiteEdge::new(code("CS101"), code("CS201")),
                PrerequisiteEdge::new(code("CS101"), code("CS201")),
            ],
        )
        .unwrap();
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_symmetric_relations_stored_once() {
        let g = CourseGraph::builder()
            .courses(vec![course("CS101"), course("CS102"), course("STAT200"), course("MATH200")])
            .corequisites(vec![
                (code("CS102"), code("CS101")),
                (code("CS101"), code("CS102")),
            ])
            .antirequisites(vec![(code("STAT200"), code("MATH200"))])
            .build()
            .unwrap();
        assert_eq!(g.corequisites.len(), 1);
        assert!(g.are_corequisites(&code("CS101"), &code("CS102")));
        assert!(g.are_corequisites(&code("CS102"), &code("CS101")));
        assert_eq!(g.corequisites_of(&code("CS102")), vec![code("CS101")]);
        assert!(g.are_antirequisites(&code("MATH200"), &code("STAT200")));
        assert!(!g.are_antirequisites(&code("CS101"), &code("STAT200")));

        let err = CourseGraph::builder()
            .courses(vec![course("CS101")])
            .antirequisites(vec![(code("CS101"), code("CS101"))])
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidGraph { .. }));
    }

    #[test]
    fn test_require_reports_not_found() {
        let g = CourseGraph::build(vec![course("CS101")], &[]).unwrap();
        assert!(g.require(&code("CS101")).is_ok());
        assert!(matches!(
            g.require(&code("CS999")),
            Err(EngineError::NotFound { kind: "course", .. })
        ));
    }
}
