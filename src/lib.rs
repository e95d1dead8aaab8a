//! migration-guard: Static safety analyzer for schema migration plans
//!
//! This library classifies each schema-change operation of a migration batch
//! against a target engine and version, checks cross-operation sequencing
//! constraints over the whole batch, and reports unsafe operations with the
//! safer alternative.

pub mod analyzer;
pub mod config;
pub mod input;
pub mod locks;
pub mod model;
pub mod output;
pub mod report;
pub mod rules;
pub mod sequencer;

// Re-export commonly used types
pub use analyzer::{analyze, analyze_many};
pub use config::Config;
pub use model::{Engine, EngineKind, MigrationBatch, MigrationUnit, Operation, Version};
pub use report::AnalysisReport;
pub use rules::{RemediationStrategy, Rule, RuleId, Safety, Verdict};
pub use sequencer::{SequencingRule, SequencingViolation};
