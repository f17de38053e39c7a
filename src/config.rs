//! Configuración de los motores, leída de variables de entorno (y `.env` si existe).
//!
//! | Variable                          | Defecto  |
//! |-----------------------------------|----------|
//! | `COURSEPLAN_GAP_MINUTES`          | `60`     |
//! | `COURSEPLAN_RECOMMENDATION_LIMIT` | `10`     |
//! | `COURSEPLAN_GROUP_SEMANTICS`      | `any_of` |
//! | `COURSEPLAN_SLOT_MATCHING`        | `exact`  |
//! | `COURSEPLAN_STRICT_TOPOLOGY`      | `false`  |

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Cómo se satisface un `PrerequisiteGroup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSemantics {
    /// Basta con aprobar un miembro del grupo.
    #[default]
    AnyOf,
    /// Se exigen todos los prerequisitos, ignorando grupos (comportamiento histórico).
    AllOf,
}

impl FromStr for GroupSemantics {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any_of" | "any" | "or" => Ok(GroupSemantics::AnyOf),
            "all_of" | "all" | "and" => Ok(GroupSemantics::AllOf),
            _ => Err(()),
        }
    }
}

/// Criterio de los pases de sala y profesor del detector de conflictos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotMatching {
    /// Misma clave exacta (día, inicio, fin, sala|profesor). Contrato público por defecto.
    #[default]
    Exact,
    /// Mismo día y sala|profesor con intervalos que se solapan.
    Overlap,
}

impl FromStr for SlotMatching {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(SlotMatching::Exact),
            "overlap" => Ok(SlotMatching::Overlap),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub gap_threshold_minutes: i64,
    pub recommendation_limit: usize,
    pub group_semantics: GroupSemantics,
    pub slot_matching: SlotMatching,
    pub strict_topology: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            gap_threshold_minutes: 60,
            recommendation_limit: 10,
            group_semantics: GroupSemantics::AnyOf,
            slot_matching: SlotMatching::Exact,
            strict_topology: false,
        }
    }
}

fn load_dotenv() {
    let _ = dotenv::dotenv();
}

impl EngineConfig {
    /// Carga `.env` (si existe) y aplica las variables `COURSEPLAN_*` sobre los valores por defecto.
    pub fn from_env() -> EngineResult<Self> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = EngineConfig::default();
        if let Some(v) = parse_var(&lookup, "COURSEPLAN_GAP_MINUTES")? {
            cfg.gap_threshold_minutes = v;
        }
        if let Some(v) = parse_var(&lookup, "COURSEPLAN_RECOMMENDATION_LIMIT")? {
            cfg.recommendation_limit = v;
        }
        if let Some(v) = parse_var(&lookup, "COURSEPLAN_GROUP_SEMANTICS")? {
            cfg.group_semantics = v;
        }
        if let Some(v) = parse_var(&lookup, "COURSEPLAN_SLOT_MATCHING")? {
            cfg.slot_matching = v;
        }
        if let Some(v) = parse_var(&lookup, "COURSEPLAN_STRICT_TOPOLOGY")? {
            cfg.strict_topology = v;
        }
        tracing::debug!(?cfg, "configuración cargada");
        Ok(cfg)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> EngineResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| EngineError::Config {
            key: key.to_string(),
            value: raw,
        }),
    }
}
