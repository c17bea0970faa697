use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::attachments::{AttachmentError, AttachmentStore};
use super::conversation::ConversationState;
use super::domain::{ApplicationId, ApplicationStatus, ResumeId, Role, UserId, VacancyId};
use super::messenger::{Messenger, TransportError};
use super::session::SessionStore;
use super::store::{BoardStore, Registration, StoreError};

/// Service composing the entity store, attachment directory, per-user sessions
/// and the outbound messenger. Operations live in `forms`, `listing` and
/// `applications`.
pub struct BoardService<S, M> {
    pub(super) store: Arc<S>,
    pub(super) messenger: Arc<M>,
    pub(super) attachments: Arc<AttachmentStore>,
    pub(super) sessions: SessionStore,
}

impl<S, M> BoardService<S, M>
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    pub fn new(store: Arc<S>, messenger: Arc<M>, attachments: Arc<AttachmentStore>) -> Self {
        Self {
            store,
            messenger,
            attachments,
            sessions: SessionStore::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    /// Record the user on first contact. Safe to call on every event.
    pub fn register(
        &self,
        user: UserId,
        username: Option<&str>,
    ) -> Result<Registration, BoardError> {
        let registration = self.store.ensure_user(user, username)?;
        if registration.created {
            debug!(%user, "registered new user");
        }
        Ok(registration)
    }

    pub fn choose_role(&self, user: UserId, role: Role) -> Result<(), BoardError> {
        self.store.set_role(user, role)?;
        debug!(%user, role = role.label(), "role selected");
        Ok(())
    }

    pub fn role_of(&self, user: UserId) -> Result<Option<Role>, BoardError> {
        Ok(self.store.user(user)?.and_then(|user| user.role))
    }

    pub fn conversation_state(&self, user: UserId) -> Option<ConversationState> {
        self.sessions
            .conversation(user)
            .map(|conversation| conversation.state())
    }
}

/// Record an operation could not find or was not allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Resume(ResumeId),
    Vacancy(VacancyId),
    Application(ApplicationId),
    /// The user's cached search results.
    SearchResults,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Resume(id) => write!(f, "resume {id}"),
            Subject::Vacancy(id) => write!(f, "vacancy {id}"),
            Subject::Application(id) => write!(f, "application {id}"),
            Subject::SearchResults => f.write_str("search results"),
        }
    }
}

/// Error raised by the board service.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("{0} not found")]
    NotFound(Subject),
    #[error("user {actor} may not modify {subject}")]
    Forbidden { actor: UserId, subject: Subject },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("application {id} was already {status}")]
    AlreadyDecided {
        id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
