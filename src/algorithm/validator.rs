//! Validación de prerequisitos sobre el grafo del catálogo: elegibilidad,
//! cadena de prerequisitos (BFS), detección de ciclos (DFS con pila de
//! recursión) y orden topológico (Kahn).

use std::collections::{BTreeMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use crate::catalog::CourseGraph;
use crate::config::{EngineConfig, GroupSemantics};
use crate::error::{EngineError, EngineResult};
use crate::models::{CanTakeResult, CompletedCourseSet, CourseCode, GroupId};

#[derive(Debug, Clone, Copy)]
pub struct PrerequisiteValidator<'g> {
    graph: &'g CourseGraph,
    semantics: GroupSemantics,
}

impl<'g> PrerequisiteValidator<'g> {
    pub fn new(graph: &'g CourseGraph) -> Self {
        PrerequisiteValidator {
            graph,
            semantics: GroupSemantics::default(),
        }
    }

    pub fn from_config(graph: &'g CourseGraph, config: &EngineConfig) -> Self {
        Self::new(graph).with_semantics(config.group_semantics)
    }

    pub fn with_semantics(mut self, semantics: GroupSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    pub fn graph(&self) -> &'g CourseGraph {
        self.graph
    }

    pub fn semantics(&self) -> GroupSemantics {
        self.semantics
    }

    /// ¿Puede el estudiante tomar `course`? `missing` sigue el orden de
    /// declaración de las aristas (no se ordena).
    pub fn can_take(&self, course: &CourseCode, completed: &CompletedCourseSet) -> EngineResult<CanTakeResult> {
        let idx = self
            .graph
            .index_of(course)
            .ok_or_else(|| EngineError::not_found("course", course))?;
        Ok(self.can_take_idx(idx, completed))
    }

    pub(crate) fn can_take_idx(&self, idx: NodeIndex, completed: &CompletedCourseSet) -> CanTakeResult {
        let edges = self.graph.prerequisite_edges(idx);
        let done = |n: NodeIndex| completed.contains(&self.graph.node(n).code);

        let missing: Vec<CourseCode> = match self.semantics {
            GroupSemantics::AllOf => edges
                .iter()
                .filter(|(src, _)| !done(*src))
                .map(|(src, _)| self.graph.node(*src).code.clone())
                .collect(),
            GroupSemantics::AnyOf => {
                // un grupo queda cubierto con cualquier miembro aprobado
                let satisfied: HashSet<GroupId> = edges
                    .iter()
                    .filter_map(|(src, g)| g.filter(|_| done(*src)))
                    .collect();
                edges
                    .iter()
                    .filter(|(src, group)| {
                        if done(*src) {
                            return false;
                        }
                        match group {
                            None => true,
                            Some(g) => self.group_required(*g) && !satisfied.contains(g),
                        }
                    })
                    .map(|(src, _)| self.graph.node(*src).code.clone())
                    .collect()
            }
        };

        CanTakeResult {
            eligible: missing.is_empty(),
            missing,
        }
    }

    fn group_required(&self, id: GroupId) -> bool {
        self.graph.group(id).map(|g| g.required).unwrap_or(true)
    }

    /// Cursos activos cuyos prerequisitos están cumplidos, en orden de catálogo.
    pub fn available_courses(&self, completed: &CompletedCourseSet) -> Vec<CourseCode> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph.node(idx).active)
            .filter(|&idx| self.can_take_idx(idx, completed).eligible)
            .map(|idx| self.graph.node(idx).code.clone())
            .collect()
    }

    /// Expansión BFS hacia atrás desde `course`. Cada curso se visita una sola
    /// vez (termina aunque haya ciclos); cada visitado aparece con sus
    /// prerequisitos directos, vacío si no tiene.
    pub fn prerequisite_chain(&self, course: &CourseCode) -> EngineResult<BTreeMap<CourseCode, Vec<CourseCode>>> {
        let start = self
            .graph
            .index_of(course)
            .ok_or_else(|| EngineError::not_found("course", course))?;

        let mut chain: BTreeMap<CourseCode, Vec<CourseCode>> = BTreeMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let prereqs = self.graph.prerequisite_edges(current);
            let entry = chain.entry(self.graph.node(current).code.clone()).or_default();
            for (p, _) in prereqs {
                entry.push(self.graph.node(p).code.clone());
                if !visited.contains(&p) {
                    queue.push_back(p);
                }
            }
        }

        tracing::debug!(course = %course, visited = visited.len(), "cadena de prerequisitos expandida");
        Ok(chain)
    }

    /// Ciclos entre cursos activos. Cada ciclo va desde la primera aparición del
    /// nodo repetido hasta el nodo repetido (incluido), p.ej. [A, B, C, A],
    /// recorriendo dependiente -> prerequisito.
    pub fn detect_cycles(&self) -> Vec<Vec<CourseCode>> {
        let n = self.graph.len();
        let mut state = DfsState {
            visited: vec![false; n],
            on_stack: vec![false; n],
            path: Vec::new(),
            cycles: Vec::new(),
        };

        for idx in self.graph.node_indices() {
            if self.graph.node(idx).active && !state.visited[idx.index()] {
                self.dfs(idx, &mut state);
            }
        }

        if !state.cycles.is_empty() {
            tracing::warn!(cycles = state.cycles.len(), "ciclos en el grafo de prerequisitos");
        }
        state
            .cycles
            .into_iter()
            .map(|cycle| cycle.into_iter().map(|i| self.graph.node(i).code.clone()).collect())
            .collect()
    }

    /// DFS iterativa: cada marco guarda sus prerequisitos activos y el próximo
    /// por visitar, así una cadena larga no agota la pila del hilo.
    fn dfs(&self, root: NodeIndex, state: &mut DfsState) {
        let mut frames: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
        self.enter(root, state, &mut frames);

        while let Some((node, prereqs, next)) = frames.last_mut() {
            let Some(&p) = prereqs.get(*next) else {
                let done = *node;
                frames.pop();
                state.path.pop();
                state.on_stack[done.index()] = false;
                continue;
            };
            *next += 1;

            // la señal de ciclo es la pila de recursión, no `visited`
            if state.on_stack[p.index()] {
                if let Some(start) = state.path.iter().position(|&n| n == p) {
                    let mut cycle = state.path[start..].to_vec();
                    cycle.push(p);
                    state.cycles.push(cycle);
                }
            } else if !state.visited[p.index()] {
                self.enter(p, state, &mut frames);
            }
        }
    }

    fn enter(&self, idx: NodeIndex, state: &mut DfsState, frames: &mut Vec<(NodeIndex, Vec<NodeIndex>, usize)>) {
        state.visited[idx.index()] = true;
        state.on_stack[idx.index()] = true;
        state.path.push(idx);
        let prereqs = self
            .graph
            .prerequisite_edges(idx)
            .into_iter()
            .map(|(p, _)| p)
            .filter(|&p| self.graph.node(p).active)
            .collect();
        frames.push((idx, prereqs, 0));
    }

    /// Orden topológico (Kahn) de los cursos activos: prerequisitos primero.
    /// Si hay ciclos el orden sale corto; eso es un diagnóstico, no un error.
    pub fn topological_order(&self) -> Vec<CourseCode> {
        let (order, active) = self.kahn();
        if order.len() < active {
            tracing::warn!(
                ordered = order.len(),
                active,
                "orden topológico parcial: el grafo tiene ciclos"
            );
        }
        order
            .into_iter()
            .map(|i| self.graph.node(i).code.clone())
            .collect()
    }

    /// Igual que `topological_order`, pero con `strict` un orden corto es
    /// `CycleDetected` con los cursos que quedaron fuera.
    pub fn topological_order_checked(&self, strict: bool) -> EngineResult<Vec<CourseCode>> {
        let order = self.topological_order();
        if !strict {
            return Ok(order);
        }
        let placed: HashSet<&CourseCode> = order.iter().collect();
        let left_out: Vec<CourseCode> = self
            .graph
            .active_courses()
            .filter(|c| !placed.contains(&c.code))
            .map(|c| c.code.clone())
            .collect();
        if left_out.is_empty() {
            Ok(order)
        } else {
            Err(EngineError::CycleDetected { courses: left_out })
        }
    }

    fn kahn(&self) -> (Vec<NodeIndex>, usize) {
        let n = self.graph.len();
        let active = |i: NodeIndex| self.graph.node(i).active;
        let mut in_degree = vec![0usize; n];
        let mut active_count = 0;

        for idx in self.graph.node_indices().filter(|&i| active(i)) {
            active_count += 1;
            in_degree[idx.index()] = self
                .graph
                .prerequisite_edges(idx)
                .iter()
                .filter(|(p, _)| active(*p))
                .count();
        }

        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&i| active(i) && in_degree[i.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(active_count);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for dep in self.graph.dependent_indices(current) {
                if !active(dep) {
                    continue;
                }
                in_degree[dep.index()] -= 1;
                if in_degree[dep.index()] == 0 {
                    queue.push_back(dep);
                }
            }
        }
        (order, active_count)
    }

    /// Antirequisitos de `course` que el estudiante ya aprobó.
    pub fn antirequisite_conflicts(
        &self,
        course: &CourseCode,
        completed: &CompletedCourseSet,
    ) -> EngineResult<Vec<CourseCode>> {
        self.graph.require(course)?;
        Ok(self
            .graph
            .antirequisites_of(course)
            .into_iter()
            .filter(|c| completed.contains(c))
            .collect())
    }
}

struct DfsState {
    visited: Vec<bool>,
    on_stack: Vec<bool>,
    path: Vec<NodeIndex>,
    cycles: Vec<Vec<NodeIndex>>,
}
