//! Scheduler configuration.
//!
//! Nothing is read from process-wide preferences: every knob is passed in explicitly at
//! construction and changed through setters on the document afterwards.

use crate::error::ReparseError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-cycle time slice used when nothing else is configured.
pub const DEFAULT_TIME_BUDGET_MS: u64 = 15;

/// Default tint strength carried by highlight descriptors (0-100).
pub const DEFAULT_SCOPE_STRENGTH: u8 = 20;

/// Default column window of a single work unit.
pub const DEFAULT_MAX_UNIT_CHARS: usize = 2048;

/// Default safety cap on work units per cycle.
pub const DEFAULT_MAX_UNITS_PER_CYCLE: usize = 4096;

/// When staged scope updates are published to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlushPolicy {
    /// Publish one batch when the re-parse queue has drained.
    #[default]
    OnIdle,
    /// Publish the lines finished so far after every cycle.
    ///
    /// Lines further down may still be re-parsed (and re-published) by later cycles.
    EveryCycle,
}

/// Configuration for a [`DocumentSession`](crate::DocumentSession).
///
/// Serialized keys are camelCase (`timeBudgetMs`, `highlightingEnabled`, ...); missing keys
/// take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReparseConfig {
    /// Wall-clock budget of one scheduler cycle, in milliseconds.
    pub time_budget_ms: u64,
    /// Whether scope highlighting is refreshed and published at all.
    pub highlighting_enabled: bool,
    /// Tint strength (0-100) copied into every highlight descriptor.
    pub scope_strength: u8,
    /// Maximum number of characters of one line lexed by a single work unit.
    pub max_unit_chars: usize,
    /// Optional cap on work units per cycle, on top of the time budget.
    pub max_units_per_cycle: Option<usize>,
    /// When staged highlight updates are committed.
    pub flush_policy: FlushPolicy,
}

impl Default for ReparseConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            highlighting_enabled: true,
            scope_strength: DEFAULT_SCOPE_STRENGTH,
            max_unit_chars: DEFAULT_MAX_UNIT_CHARS,
            max_units_per_cycle: Some(DEFAULT_MAX_UNITS_PER_CYCLE),
            flush_policy: FlushPolicy::OnIdle,
        }
    }
}

impl ReparseConfig {
    /// Decode a config from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ReparseError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Per-cycle budget as a [`Duration`].
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Set the per-cycle budget.
    pub fn with_time_budget_ms(mut self, ms: u64) -> Self {
        self.time_budget_ms = ms;
        self
    }

    /// Enable or disable scope highlighting.
    pub fn with_highlighting(mut self, enabled: bool) -> Self {
        self.highlighting_enabled = enabled;
        self
    }

    /// Set the tint strength (clamped to 100).
    pub fn with_scope_strength(mut self, strength: u8) -> Self {
        self.scope_strength = strength.min(100);
        self
    }

    /// Set the column window of one work unit (at least 1).
    pub fn with_max_unit_chars(mut self, chars: usize) -> Self {
        self.max_unit_chars = chars.max(1);
        self
    }

    /// Set (or remove) the per-cycle unit cap.
    pub fn with_max_units_per_cycle(mut self, cap: Option<usize>) -> Self {
        self.max_units_per_cycle = cap.map(|cap| cap.max(1));
        self
    }

    /// Choose when highlight updates are published.
    pub fn with_flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = policy;
        self
    }

    pub(crate) fn normalized(self) -> Self {
        let strength = self.scope_strength;
        let unit_chars = self.max_unit_chars;
        let unit_cap = self.max_units_per_cycle;
        self.with_scope_strength(strength)
            .with_max_unit_chars(unit_chars)
            .with_max_units_per_cycle(unit_cap)
    }
}
