// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

/// What to report when a binding finds no resource for its key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MissingResourceDiagnostics {
    /// Leave the target unchanged without a diagnostic.
    #[default]
    Silent,
    /// Also emit a `warn` level event naming the key and the start node.
    Warn,
}

/// Runtime settings of an [`ElementTree`](crate::ElementTree).
///
/// ```rust
/// use marquee_skin::{EngineConfig, MissingResourceDiagnostics};
///
/// let config = EngineConfig::new()
///     .with_missing_resources(MissingResourceDiagnostics::Warn)
///     .with_trace_bindings(true);
/// assert!(config.trace_bindings());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    missing_resources: MissingResourceDiagnostics,
    trace_bindings: bool,
}

impl EngineConfig {
    /// Returns the default configuration: silent misses, no binding traces.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            missing_resources: MissingResourceDiagnostics::Silent,
            trace_bindings: false,
        }
    }

    /// Sets how unresolved binding keys are reported.
    #[must_use]
    pub const fn with_missing_resources(mut self, mode: MissingResourceDiagnostics) -> Self {
        self.missing_resources = mode;
        self
    }

    /// Enables a `trace` event for every binding update.
    #[must_use]
    pub const fn with_trace_bindings(mut self, enabled: bool) -> Self {
        self.trace_bindings = enabled;
        self
    }

    /// Returns how unresolved binding keys are reported.
    #[must_use]
    pub const fn missing_resources(&self) -> MissingResourceDiagnostics {
        self.missing_resources
    }

    /// Returns `true` if binding updates are traced.
    #[must_use]
    pub const fn trace_bindings(&self) -> bool {
        self.trace_bindings
    }
}
