//! HTML notification bodies and idempotency keys for issue events.

use std::fmt::Write as _;

use trackr_core::events::{Contact, IssueEvent, IssueSnapshot};

use crate::job::{NotificationJob, OutgoingMessage};

/// A rendered notification addressed to one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub key: String,
    pub recipient: Contact,
    pub subject: String,
    pub html: String,
}

impl Notice {
    /// Turn the notice into a deliverable job. `None` when the recipient has
    /// no email address.
    #[must_use]
    pub fn into_job(self, from: &str) -> Option<NotificationJob> {
        let to = self.recipient.email.filter(|e| !e.trim().is_empty())?;
        Some(NotificationJob {
            key: self.key,
            recipient_id: self.recipient.user_id,
            message: OutgoingMessage {
                from: from.to_string(),
                to,
                subject: self.subject,
                html: self.html,
            },
        })
    }
}

#[must_use]
pub fn assignee_key(issue_id: &str, user_id: &str) -> String {
    format!("notify-assignee-{issue_id}-{user_id}")
}

#[must_use]
pub fn old_assignee_key(issue_id: &str, user_id: &str) -> String {
    format!("notify-old-assignee-{issue_id}-{user_id}")
}

#[must_use]
pub fn unassigned_key(issue_id: &str, user_id: &str) -> String {
    format!("notify-unassigned-{issue_id}-{user_id}")
}

/// Every notice an event produces, in delivery order.
#[must_use]
pub fn render(event: &IssueEvent) -> Vec<Notice> {
    match event {
        IssueEvent::Assigned {
            issue, assignee, ..
        } => vec![assigned(issue, assignee)],
        IssueEvent::Reassigned {
            issue,
            previous,
            next,
            reason,
            ..
        } => vec![
            assigned(issue, next),
            reassigned_away(issue, previous, next, reason.as_deref()),
        ],
        IssueEvent::Unassigned {
            issue,
            previous,
            reason,
            ..
        } => vec![unassigned(issue, previous, reason.as_deref())],
    }
}

fn assigned(issue: &IssueSnapshot, to: &Contact) -> Notice {
    let body = layout(
        "New Issue Assigned",
        &to.name,
        "You have been assigned a new issue.",
        &details(issue, &[]),
        "Please log in to the system to view more details about this issue.",
    );
    Notice {
        key: assignee_key(&issue.id, &to.user_id),
        recipient: to.clone(),
        subject: format!("New Issue Assigned: {}", issue.title),
        html: body,
    }
}

fn reassigned_away(
    issue: &IssueSnapshot,
    previous: &Contact,
    next: &Contact,
    reason: Option<&str>,
) -> Notice {
    let mut extra = vec![("New Assignee", next.name.as_str())];
    if let Some(reason) = reason {
        extra.push(("Reason", reason));
    }
    Notice {
        key: old_assignee_key(&issue.id, &previous.user_id),
        recipient: previous.clone(),
        subject: format!("Issue Reassigned: {}", issue.title),
        html: layout(
            "Issue Reassigned",
            &previous.name,
            "The issue you were assigned to has been reassigned to another team member.",
            &details(issue, &extra),
            "If you have any questions, please contact your project manager.",
        ),
    }
}

fn unassigned(issue: &IssueSnapshot, previous: &Contact, reason: Option<&str>) -> Notice {
    let extra: Vec<(&str, &str)> = reason.map(|r| ("Reason", r)).into_iter().collect();
    Notice {
        key: unassigned_key(&issue.id, &previous.user_id),
        recipient: previous.clone(),
        subject: format!("Issue Unassigned: {}", issue.title),
        html: layout(
            "Issue Unassigned",
            &previous.name,
            "You are no longer assigned to this issue.",
            &details(issue, &extra),
            "If you have any questions, please contact your project manager.",
        ),
    }
}

fn details(issue: &IssueSnapshot, extra: &[(&str, &str)]) -> String {
    let mut out = String::new();
    let mut row = |label: &str, value: &str| {
        let _ = write!(
            out,
            "<p><strong>{label}:</strong> {}</p>",
            escape_html(value)
        );
    };
    row("Issue", &issue.key);
    row("Issue Title", &issue.title);
    row("Project", &issue.project_name);
    row("Status", issue.status.as_str());
    for (label, value) in extra {
        row(label, value);
    }
    if !issue.description.is_empty() {
        row("Description", &issue.description);
    }
    row("Priority", issue.priority.as_str());
    out
}

fn layout(heading: &str, name: &str, lead: &str, details: &str, closing: &str) -> String {
    format!(
        concat!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">"#,
            r#"<h2 style="color: #333;">{heading}</h2>"#,
            "<p>Hello <strong>{name}</strong>,</p>",
            "<p>{lead}</p>",
            r#"<div style="background-color: #f5f5f5; padding: 15px; border-radius: 5px; margin: 20px 0;">"#,
            "{details}",
            "</div>",
            "<p>{closing}</p>",
            "<br/>",
            "<p>Best regards,<br/>Project Management System</p>",
            "</div>"
        ),
        heading = heading,
        name = escape_html(name),
        lead = lead,
        details = details,
        closing = closing,
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
