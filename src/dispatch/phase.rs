//! Lifecycle phases and the per-request phase tracker.
//!
//! # State Transitions
//! ```text
//! InitStrategy → RequestParse → RouteResolution → PreRender → AssetEnqueue
//!     → HeadEmit → ErrorDisplay → TemplateSelect → ResponseSent
//! ```
//!
//! Phases may be skipped by the host but never run backwards. Each phase
//! runs at most once; ErrorDisplay may be entered again while no later phase
//! has fired, and its own guard keeps rendering single.

use std::fmt;

use serde::Serialize;

/// A named point in request processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InitStrategy,
    RequestParse,
    RouteResolution,
    PreRender,
    AssetEnqueue,
    HeadEmit,
    ErrorDisplay,
    TemplateSelect,
    ResponseSent,
}

impl Phase {
    pub const ALL: [Phase; 9] = [
        Phase::InitStrategy,
        Phase::RequestParse,
        Phase::RouteResolution,
        Phase::PreRender,
        Phase::AssetEnqueue,
        Phase::HeadEmit,
        Phase::ErrorDisplay,
        Phase::TemplateSelect,
        Phase::ResponseSent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitStrategy => "init_strategy",
            Self::RequestParse => "request_parse",
            Self::RouteResolution => "route_resolution",
            Self::PreRender => "pre_render",
            Self::AssetEnqueue => "asset_enqueue",
            Self::HeadEmit => "head_emit",
            Self::ErrorDisplay => "error_display",
            Self::TemplateSelect => "template_select",
            Self::ResponseSent => "response_sent",
        }
    }

    fn repeatable(&self) -> bool {
        matches!(self, Self::ErrorDisplay)
    }

    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a phase did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSkip {
    AlreadyFired,
    OutOfOrder { last: Phase },
}

/// Records which phases of a request have fired.
#[derive(Debug, Default, Clone)]
pub struct PhaseTracker {
    fired: u16,
    last: Option<Phase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `phase`, or report why it must be skipped.
    pub fn enter(&mut self, phase: Phase) -> Result<(), PhaseSkip> {
        if self.has_fired(phase) && !(phase.repeatable() && self.last == Some(phase)) {
            return Err(PhaseSkip::AlreadyFired);
        }
        if let Some(last) = self.last {
            if last > phase {
                return Err(PhaseSkip::OutOfOrder { last });
            }
        }
        self.fired |= phase.bit();
        self.last = Some(phase);
        Ok(())
    }

    pub fn has_fired(&self, phase: Phase) -> bool {
        self.fired & phase.bit() != 0
    }

    pub fn fired(&self) -> Vec<Phase> {
        Phase::ALL.into_iter().filter(|p| self.has_fired(*p)).collect()
    }
}
