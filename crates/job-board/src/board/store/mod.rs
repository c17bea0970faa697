//! Persistence seam for users, résumés, vacancies and applications.
//!
//! Every mutating method is a single committed unit: implementations must not
//! leave a partial record behind when they return an error.

mod sqlite;

pub use sqlite::SqliteStore;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSummary, NewResume, NewVacancy,
    Resume, ResumeId, Role, User, UserId, Vacancy, VacancyId,
};

/// Outcome of registering a user on first contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user: User,
    pub created: bool,
}

/// Storage abstraction so the board services can be exercised in isolation.
pub trait BoardStore: Send + Sync {
    /// Insert the user if unseen; never creates a duplicate row.
    fn ensure_user(&self, id: UserId, username: Option<&str>)
        -> Result<Registration, StoreError>;
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    fn set_role(&self, id: UserId, role: Role) -> Result<(), StoreError>;

    fn insert_resume(&self, resume: NewResume) -> Result<Resume, StoreError>;
    fn resume(&self, id: ResumeId) -> Result<Option<Resume>, StoreError>;
    fn resumes_by_owner(&self, owner: UserId) -> Result<Vec<Resume>, StoreError>;
    /// Returns `false` when no row matched.
    fn delete_resume(&self, id: ResumeId) -> Result<bool, StoreError>;

    fn insert_vacancy(&self, vacancy: NewVacancy) -> Result<Vacancy, StoreError>;
    fn vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, StoreError>;
    fn vacancies_by_owner(&self, owner: UserId) -> Result<Vec<Vacancy>, StoreError>;
    fn delete_vacancy(&self, id: VacancyId) -> Result<bool, StoreError>;
    /// Case-insensitive title substring match, in insertion order.
    fn search_vacancies(&self, query: &str) -> Result<Vec<Vacancy>, StoreError>;
    fn record_search(&self, owner: UserId, query: &str) -> Result<(), StoreError>;

    fn insert_application(
        &self,
        applicant: UserId,
        vacancy: VacancyId,
        resume: ResumeId,
    ) -> Result<Application, StoreError>;
    fn application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError>;
    /// Compare-and-set: only moves the row when it still holds `expected`.
    fn transition_application(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<bool, StoreError>;
    fn applications_by_applicant(
        &self,
        applicant: UserId,
    ) -> Result<Vec<ApplicationSummary>, StoreError>;
    /// Applications received on vacancies owned by `employer`.
    fn applications_for_employer(
        &self,
        employer: UserId,
    ) -> Result<Vec<ApplicationSummary>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("referenced record does not exist")]
    MissingReference,
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
