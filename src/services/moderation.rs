//! Status lifecycles for user content.
//!
//! Statuses are stored as plain strings; every change goes through one of the
//! `apply` functions here so an illegal move is rejected before any write.

use crate::error::AppError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub action: &'static str,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot {} a {} that is {}",
            self.action, self.entity, self.from
        )
    }
}

impl std::error::Error for TransitionError {}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::Conflict(e.to_string())
    }
}

fn unknown_status(entity: &str, raw: &str) -> AppError {
    AppError::Internal(anyhow::anyhow!("{} has unknown status '{}'", entity, raw))
}

// --- Submission ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionAction {
    Approve,
    Reject,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn apply(self, action: SubmissionAction) -> Result<Self, TransitionError> {
        match (self, action) {
            (SubmissionStatus::Pending, SubmissionAction::Approve) => Ok(SubmissionStatus::Approved),
            (SubmissionStatus::Pending, SubmissionAction::Reject) => Ok(SubmissionStatus::Rejected),
            (from, action) => Err(TransitionError {
                entity: "submission",
                from: from.as_str(),
                action: action.as_str(),
            }),
        }
    }
}

impl SubmissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionAction::Approve => "approve",
            SubmissionAction::Reject => "reject",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            other => Err(unknown_status("submission", other)),
        }
    }
}

// --- Feedback ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStatus {
    Active,
    Hidden,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackAction {
    Hide,
    Restore,
    /// Only meaningful for corrections; the caller checks the kind.
    Resolve,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Active => "active",
            FeedbackStatus::Hidden => "hidden",
            FeedbackStatus::Resolved => "resolved",
        }
    }

    pub fn apply(self, action: FeedbackAction) -> Result<Self, TransitionError> {
        match (self, action) {
            (FeedbackStatus::Active, FeedbackAction::Hide) => Ok(FeedbackStatus::Hidden),
            (FeedbackStatus::Active, FeedbackAction::Resolve) => Ok(FeedbackStatus::Resolved),
            (FeedbackStatus::Hidden, FeedbackAction::Restore) => Ok(FeedbackStatus::Active),
            (from, action) => Err(TransitionError {
                entity: "feedback",
                from: from.as_str(),
                action: action.as_str(),
            }),
        }
    }
}

impl FeedbackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackAction::Hide => "hide",
            FeedbackAction::Restore => "restore",
            FeedbackAction::Resolve => "resolve",
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(FeedbackStatus::Active),
            "hidden" => Ok(FeedbackStatus::Hidden),
            "resolved" => Ok(FeedbackStatus::Resolved),
            other => Err(unknown_status("feedback", other)),
        }
    }
}

// --- Photo ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStatus {
    Active,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoAction {
    Hide,
    Show,
}

impl PhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoStatus::Active => "active",
            PhotoStatus::Hidden => "hidden",
        }
    }

    pub fn apply(self, action: PhotoAction) -> Result<Self, TransitionError> {
        match (self, action) {
            (PhotoStatus::Active, PhotoAction::Hide) => Ok(PhotoStatus::Hidden),
            (PhotoStatus::Hidden, PhotoAction::Show) => Ok(PhotoStatus::Active),
            (from, action) => Err(TransitionError {
                entity: "photo",
                from: from.as_str(),
                action: action.as_str(),
            }),
        }
    }
}

impl PhotoAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoAction::Hide => "hide",
            PhotoAction::Show => "show",
        }
    }
}

impl FromStr for PhotoStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PhotoStatus::Active),
            "hidden" => Ok(PhotoStatus::Hidden),
            other => Err(unknown_status("photo", other)),
        }
    }
}
