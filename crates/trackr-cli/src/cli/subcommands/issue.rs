use clap::{Args, Subcommand};

/// Issue commands.
#[derive(Clone, Debug, Subcommand)]
pub enum IssueCommands {
    /// Create an issue.
    Create(IssueCreateArgs),
    /// Get an issue by id or key.
    Get { issue: String },
    /// Update title, description, status, priority, or due date.
    Update(IssueUpdateArgs),
    /// Soft-delete an issue and its subtasks.
    Delete {
        issue: String,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// List a project's issues.
    List(IssueListArgs),
    /// Subtasks of an issue.
    Children { issue: String },
    /// Assign an unassigned issue.
    Assign {
        issue: String,
        user: String,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Move an issue to another assignee.
    Reassign {
        issue: String,
        user: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Clear an issue's assignee.
    Unassign {
        issue: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Audit history of an issue, oldest first.
    History { issue: String },
}

#[derive(Clone, Debug, Args)]
pub struct IssueCreateArgs {
    /// Project id or key
    pub project: String,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long = "type")]
    pub issue_type: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub estimate: Option<f64>,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long = "label")]
    pub labels: Vec<String>,
    /// Parent issue id or key (subtasks only)
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct IssueUpdateArgs {
    pub issue: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    #[arg(long)]
    pub clear_due: bool,
    #[arg(long)]
    pub expected_version: Option<i64>,
}

#[derive(Clone, Debug, Args)]
pub struct IssueListArgs {
    /// Project id or key
    pub project: String,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long = "type")]
    pub issue_type: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long = "label")]
    pub labels: Vec<String>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
    /// created-at, updated-at, priority-order, due-date
    #[arg(long)]
    pub sort: Option<String>,
    /// asc or desc
    #[arg(long)]
    pub order: Option<String>,
}
