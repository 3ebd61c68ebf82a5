//! Structured observability hooks for fixture session events.
//!
//! This module provides:
//! - The session-scoped tracing span every `FixtureSession` runs under
//! - Emission functions for session phases: resolve, prepare, restore, match
//!
//! Events are emitted at `info!` level unless noted (filter with
//! `DBFIXTURE_LOG` or `RUST_LOG`).

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// A fresh `dbfixture.session` span, numbered per process.
///
/// Events emitted inside it are tagged with `session = <n>`.
pub fn session_span() -> tracing::Span {
    let session = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
    tracing::info_span!("dbfixture.session", session = session)
}

/// Emit event: table structures resolved for a dataset.
pub fn emit_tables_resolved(requested: usize, graph_tables: usize) {
    info!(
        event = "tables.resolved",
        requested = requested,
        graph_tables = graph_tables,
    );
}

/// Emit event: fixture rows deleted and inserted.
pub fn emit_fixture_prepared(tables: usize, rows: usize) {
    info!(event = "fixture.prepared", tables = tables, rows = rows);
}

/// Emit event: touched tables flashed back to the session's start marker.
pub fn emit_restore_completed(tables: usize, scn: u64) {
    info!(event = "restore.completed", tables = tables, scn = scn);
}

/// Emit event: one comparison pass (debug level).
pub fn emit_match_attempt(attempt: u32, unmatched: usize) {
    tracing::debug!(event = "match.attempt", attempt = attempt, unmatched = unmatched);
}

/// Emit event: polling match finished.
pub fn emit_match_finished(matched: bool, attempts: u32) {
    info!(event = "match.finished", matched = matched, attempts = attempts);
}

/// Emit event: a constraint stayed disabled after a truncate (error level).
pub fn emit_constraint_enable_failed(table: &str, constraint: &str, error: &dyn std::fmt::Display) {
    tracing::error!(
        event = "constraint.enable_failed",
        table = %table,
        constraint = %constraint,
        error = %error,
    );
}
