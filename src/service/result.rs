//! Typed outcomes of a service call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contributions::FolderContribution;
use crate::store::ProjectReference;

/// Outcome category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The request succeeded.
    Ok,
    /// The project or folder does not exist.
    NotFound,
    /// The request is refused, e.g. the project is too large.
    Forbidden,
    /// Infrastructure failed.
    InternalError,
}

impl Status {
    /// HTTP status code for callers that serve HTTP.
    pub fn http_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::InternalError => 500,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::InternalError => "internal_error",
        };
        f.write_str(name)
    }
}

/// One contributor's line in an appraisal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorCredit {
    /// Canonical username.
    pub username: String,
    /// Email of the canonical identity.
    pub email: String,
    /// Credited lines.
    pub credits: u64,
}

/// Attribution for one folder of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFolderContributions {
    /// The appraised project.
    pub project: ProjectReference,
    /// Folder path relative to the project root; empty for the root.
    pub folder: String,
    /// Sum of all credits.
    pub total_credits: u64,
    /// Contributors ordered by credit descending, then username.
    pub credits: Vec<ContributorCredit>,
}

impl ProjectFolderContributions {
    /// Summarizes `folder` for `project`.
    pub fn new(project: ProjectReference, folder: &FolderContribution) -> Self {
        let credits = folder
            .ranked_credits()
            .into_iter()
            .map(|(identity, credits)| ContributorCredit {
                username: identity.username,
                email: identity.email,
                credits,
            })
            .collect();

        Self {
            project,
            folder: folder.path().to_string(),
            total_credits: folder.total_credits(),
            credits,
        }
    }
}

/// Response body: a human-readable message or an appraisal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Explanation of a failure.
    Text(String),
    /// Successful appraisal.
    Appraisal(Box<ProjectFolderContributions>),
}

/// `{status, message}` pair returned by the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResult {
    /// Outcome category.
    pub status: Status,
    /// Payload.
    pub message: Message,
}

impl ApiResult {
    /// A failure (or informational) result with a text message.
    pub fn text(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Message::Text(message.into()),
        }
    }

    /// A successful appraisal.
    pub fn appraisal(contributions: ProjectFolderContributions) -> Self {
        Self {
            status: Status::Ok,
            message: Message::Appraisal(Box::new(contributions)),
        }
    }

    /// Whether the status is `ok`.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// The appraisal, if this is one.
    pub fn contributions(&self) -> Option<&ProjectFolderContributions> {
        match &self.message {
            Message::Appraisal(contributions) => Some(contributions.as_ref()),
            Message::Text(_) => None,
        }
    }

    /// The text message, if this is one.
    pub fn text_message(&self) -> Option<&str> {
        match &self.message {
            Message::Text(text) => Some(text),
            Message::Appraisal(_) => None,
        }
    }
}
