//! Inicialización de tracing para el binario.
//!
//! La biblioteca sólo emite eventos; quien la embebe decide el subscriber.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Instala un subscriber fmt filtrado por `COURSEPLAN_LOG`
/// (p.ej. `COURSEPLAN_LOG=courseplan::algorithm=debug`). Por defecto `courseplan=info`.
/// Llamarla varias veces no tiene efecto.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("COURSEPLAN_LOG")
            .unwrap_or_else(|_| EnvFilter::new("courseplan=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
