//! Conversational job board: résumés, vacancies and applications driven by
//! chat events.
//!
//! Inbound events go through [`Dispatcher`], which drives the per-user form
//! state machine, listing and navigation, and the application workflow on top
//! of a [`BoardStore`] and a [`Messenger`].

pub mod actions;
pub mod applications;
pub mod attachments;
pub mod conversation;
pub mod dispatcher;
pub mod domain;
pub mod events;
pub mod forms;
pub mod keyboards;
pub mod listing;
pub mod messenger;
pub mod navigation;
pub mod router;
pub mod service;
mod session;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use actions::{ActionParseError, CallbackAction};
pub use applications::{Decision, Submission};
pub use attachments::{AttachmentError, AttachmentStore, FileKind, IncomingFile, MediaKind};
pub use conversation::{ConversationState, Prompt, ResumeStep, VacancyStep};
pub use dispatcher::Dispatcher;
pub use domain::{
    Application, ApplicationDecision, ApplicationId, ApplicationStatus, ApplicationSummary,
    Attachment, EntityKind, Resume, ResumeId, Role, User, UserId, Vacancy, VacancyId,
};
pub use events::{Event, EventPayload};
pub use forms::{CreatedEntity, FormReply};
pub use keyboards::{Button, Keyboard};
pub use listing::SearchPage;
pub use messenger::{ChatId, MessageRef, Messenger, TransportError};
pub use navigation::{Cursor, Direction};
pub use router::event_router;
pub use service::{BoardError, BoardService, Subject};
pub use store::{BoardStore, Registration, SqliteStore, StoreError};
