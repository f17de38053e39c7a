//! Caché en memoria de grafos de catálogo ya construidos, por término.
//!
//! Reconstruir el grafo es O(V+E); quien atiende muchas validaciones del mismo
//! término puede reutilizar un `Arc<CourseGraph>` e invalidarlo al editar el catálogo.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::catalog::CourseGraph;
use crate::error::EngineResult;
use crate::models::Term;

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Term, Arc<CourseGraph>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Default)]
pub struct GraphCache {
    state: Mutex<CacheState>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // un pánico con el lock tomado no deja el mapa a medio escribir
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Devuelve el grafo del término, construyéndolo con `build` si no está.
    ///
    /// - el lock se mantiene sólo para consultar/insertar; `build` corre fuera
    /// - si dos hilos construyen a la vez, gana el primero en insertar y ambos
    ///   reciben el mismo `Arc`
    /// - un `build` fallido no deja entrada
    pub fn get_or_build<F>(&self, term: Term, build: F) -> EngineResult<Arc<CourseGraph>>
    where
        F: FnOnce() -> EngineResult<CourseGraph>,
    {
        {
            let mut guard = self.lock();
            if let Some(existing) = guard.entries.get(&term).cloned() {
                guard.hits += 1;
                return Ok(existing);
            }
            guard.misses += 1;
        }

        tracing::debug!(%term, "grafo no está en caché; construyendo");
        let graph = Arc::new(build()?);

        let mut guard = self.lock();
        let entry = guard.entries.entry(term).or_insert_with(|| Arc::clone(&graph));
        Ok(Arc::clone(entry))
    }

    pub fn get(&self, term: Term) -> Option<Arc<CourseGraph>> {
        self.lock().entries.get(&term).cloned()
    }

    /// Descarta el grafo de un término (p.ej. tras editar el catálogo).
    pub fn invalidate(&self, term: Term) -> bool {
        let removed = self.lock().entries.remove(&term).is_some();
        if removed {
            tracing::debug!(%term, "grafo invalidado");
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// (hits, misses, entradas)
    pub fn stats(&self) -> (u64, u64, usize) {
        let guard = self.lock();
        (guard.hits, guard.misses, guard.entries.len())
    }
}
