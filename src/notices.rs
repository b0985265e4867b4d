//! Queued notices rendered once during error display.
//!
//! Every recoverable condition in the controller ends up here instead of
//! aborting the request.

use std::fmt::Write as _;

use serde::Serialize;

/// Markup the host's ajax layer fills with notices at runtime.
pub const AJAX_NOTICES_CONTAINER: &str =
    r#"<div id="espresso-ajax-notices"><div class="espresso-notices-success"></div><div class="espresso-notices-error"></div></div>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Error,
    Success,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// Component that raised the notice.
    pub origin: String,
}

/// Per-request notice store.
#[derive(Debug, Default)]
pub struct ErrorNotices {
    notices: Vec<Notice>,
}

impl ErrorNotices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>, origin: impl Into<String>) {
        self.push(NoticeKind::Error, message.into(), origin.into());
    }

    pub fn add_success(&mut self, message: impl Into<String>, origin: impl Into<String>) {
        self.push(NoticeKind::Success, message.into(), origin.into());
    }

    fn push(&mut self, kind: NoticeKind, message: String, origin: String) {
        tracing::debug!(kind = kind.as_str(), origin = %origin, message = %message, "Notice queued");
        crate::observability::metrics::record_notice(kind.as_str());
        self.notices.push(Notice {
            kind,
            message,
            origin,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.kind == NoticeKind::Error)
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    /// Drain the queue into escaped markup. Empty queue renders nothing.
    pub fn get_notices(&mut self) -> String {
        let mut out = String::new();
        for kind in [NoticeKind::Success, NoticeKind::Error] {
            let messages: Vec<&Notice> = self.notices.iter().filter(|n| n.kind == kind).collect();
            if messages.is_empty() {
                continue;
            }
            let _ = write!(out, r#"<div class="espresso-notices {}">"#, kind.as_str());
            for notice in messages {
                let _ = write!(out, "<p>{}</p>", escape_html(&notice.message));
            }
            out.push_str("</div>");
        }
        self.notices.clear();
        out
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
