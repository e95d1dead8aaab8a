//! Analysis entry point.
//!
//! [`analyze`] classifies every operation with its unit's context, runs the
//! sequencer over the whole batch, applies the sequencer's verdict
//! refinements and assembles the [`AnalysisReport`]. Pure: the same batch
//! and engine always produce the same report.

use rayon::prelude::*;
use tracing::{debug, debug_span};

use crate::model::{Engine, MigrationBatch, OperationRef};
use crate::report::{AnalysisReport, OperationReport, UnitReport};
use crate::rules::{self, RuleContext, Verdict};
use crate::sequencer;

/// Analyze one batch against one engine.
pub fn analyze(batch: &MigrationBatch, engine: &Engine) -> AnalysisReport {
    let span = debug_span!("analyze", engine = %engine, units = batch.units().len());
    let _enter = span.enter();

    let mut verdicts: Vec<Vec<Verdict>> = batch
        .units()
        .iter()
        .map(|unit| {
            let ctx = RuleContext::for_unit(engine, unit);
            unit.operations()
                .iter()
                .map(|op| rules::classify(op, &ctx))
                .collect()
        })
        .collect();

    let outcome = sequencer::check(batch, engine, &verdicts);

    for refinement in outcome.refinements {
        let at = refinement.at;
        if let Some(slot) = verdicts
            .get_mut(at.unit)
            .and_then(|unit| unit.get_mut(at.index))
        {
            debug!(
                at = %at,
                from = %slot.status,
                to = %refinement.verdict.status,
                "verdict refined"
            );
            *slot = refinement.verdict;
        }
    }

    let units = batch
        .units()
        .iter()
        .zip(verdicts)
        .enumerate()
        .map(|(u, (unit, unit_verdicts))| UnitReport {
            name: unit.name().to_string(),
            disable_ddl_transaction: unit.disable_ddl_transaction(),
            disable_migration_lock: unit.disable_migration_lock(),
            operations: unit
                .operations()
                .iter()
                .zip(unit_verdicts)
                .enumerate()
                .map(|(i, (op, verdict))| OperationReport {
                    at: OperationRef::new(u, i),
                    kind: op.kind(),
                    table: op.table().to_string(),
                    description: op.to_string(),
                    verdict,
                })
                .collect(),
        })
        .collect();

    let report = AnalysisReport::new(engine.clone(), units, outcome.violations);
    debug!(
        worst = %report.worst_severity(),
        violations = report.violations().len(),
        "analysis complete"
    );
    report
}

/// Analyze independent batches in parallel. Reports keep input order.
pub fn analyze_many(batches: &[MigrationBatch], engine: &Engine) -> Vec<AnalysisReport> {
    batches
        .par_iter()
        .map(|batch| analyze(batch, engine))
        .collect()
}
