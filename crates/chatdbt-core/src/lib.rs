//! ChatDBT Core
//!
//! Domain model shared by the scanners and the manifest synthesizer:
//! text units and their metadata, load diagnostics, reports and configuration.
//! Diagnostic codes and metadata keys are consumed by downstream indexers,
//! so treat them as public API.

pub mod unit;
pub mod diagnostic;
pub mod report;
pub mod config;

pub use unit::{TextUnit, UnitKind, MetadataValue, ResourceMeta, ColumnMeta, column_unique_id};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use report::{LoadReport, LoadSummary, ScanOutcome};
pub use config::{Config, ConfigError, ExclusionRules, RenderingConfig, SourceRenderMode};
