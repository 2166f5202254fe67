//! Complaint status workflow.
//!
//! `pending → in-process → resolved`, one step at a time, driven by an
//! administrator. Each row of [`TRANSITIONS`] carries the notice sent to the
//! complaint's owner when the step is taken. A status without a row is terminal.

use crate::models::{Complaint, ComplaintStatus};

/// The owner-facing message attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub subject: &'static str,
    pub headline: &'static str,
    pub detail: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ComplaintStatus,
    pub to: ComplaintStatus,
    pub notice: Notice,
}

pub static TRANSITIONS: [Transition; 2] = [
    Transition {
        from: ComplaintStatus::Pending,
        to: ComplaintStatus::InProcess,
        notice: Notice {
            subject: "Your complaint is now being processed",
            headline: "is now being processed",
            detail: "The responsible office is working to resolve it as soon as possible. \
                     You will be informed once it has been resolved.",
        },
    },
    Transition {
        from: ComplaintStatus::InProcess,
        to: ComplaintStatus::Resolved,
        notice: Notice {
            subject: "Your complaint has been resolved",
            headline: "has been resolved",
            detail: "If you need further information or assistance, please contact the \
                     responsible office.",
        },
    },
];

/// The transition an administrator's "advance" takes from `current`, if any.
pub fn next_transition(current: ComplaintStatus) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == current)
}

pub fn is_terminal(status: ComplaintStatus) -> bool {
    next_transition(status).is_none()
}

impl Transition {
    /// Confirmation returned to the administrator.
    pub fn confirmation(&self) -> String {
        format!("Complaint status updated to {}", self.to)
    }

    /// Plain-text email body for the owner.
    pub fn render_body(&self, complaint: &Complaint) -> String {
        format!(
            "Dear citizen,\n\n\
             Your complaint (ID: {id}, subject: \"{subject}\") {headline}.\n\
             {detail}\n\n\
             Thank you for your cooperation.\n\n\
             Regards,\nGovernment Services",
            id = complaint.id,
            subject = complaint.subject,
            headline = self.notice.headline,
            detail = self.notice.detail,
        )
    }
}
