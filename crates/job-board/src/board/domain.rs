use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identity assigned by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VacancyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role picked from the main menu. Unset until the user chooses one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    JobSeeker,
    Employer,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::JobSeeker => "job_seeker",
            Role::Employer => "employer",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "job_seeker" => Some(Role::JobSeeker),
            "employer" => Some(Role::Employer),
            _ => None,
        }
    }
}

/// The two kinds of owned, attachable records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Resume,
    Vacancy,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Resume => "resume",
            EntityKind::Vacancy => "vacancy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

/// Uploaded file: the transport's opaque reference plus where the bytes live locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_id: String,
    pub path: PathBuf,
}

impl Attachment {
    /// Both halves must be present; a lone file id or path is not an attachment.
    pub fn from_parts(file_id: Option<String>, path: Option<String>) -> Option<Self> {
        match (file_id, path) {
            (Some(file_id), Some(path)) => Some(Self {
                file_id,
                path: PathBuf::from(path),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    pub id: ResumeId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub experience: String,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResume {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub experience: String,
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacancy {
    pub id: VacancyId,
    pub owner: UserId,
    pub title: String,
    pub company: String,
    pub salary: String,
    pub description: String,
    pub attachment: Option<Attachment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVacancy {
    pub owner: UserId,
    pub title: String,
    pub company: String,
    pub salary: String,
    pub description: String,
    pub attachment: Option<Attachment>,
}

/// Lifecycle of an application: `New` moves once to `Invited` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    New,
    Invited,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Invited => "invited",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "new" => Some(ApplicationStatus::New),
            "invited" => Some(ApplicationStatus::Invited),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::New)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Employer's answer to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationDecision {
    Invite,
    Reject,
}

impl ApplicationDecision {
    pub const fn status(self) -> ApplicationStatus {
        match self {
            ApplicationDecision::Invite => ApplicationStatus::Invited,
            ApplicationDecision::Reject => ApplicationStatus::Rejected,
        }
    }
}

/// Applications are never deleted; `vacancy` and `resume` become `None` once
/// the referenced record is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant: UserId,
    pub vacancy: Option<VacancyId>,
    pub resume: Option<ResumeId>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Application joined with the titles needed to list it. A title is `None`
/// when its record has been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub application: Application,
    pub vacancy_title: Option<String>,
    pub resume_title: Option<String>,
}
