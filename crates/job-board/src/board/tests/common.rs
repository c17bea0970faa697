use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::board::attachments::{AttachmentStore, FileKind, IncomingFile, MediaKind};
use crate::board::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSummary, NewResume, NewVacancy,
    Resume, ResumeId, Role, User, UserId, Vacancy, VacancyId,
};
use crate::board::events::{Event, EventPayload};
use crate::board::forms::FormReply;
use crate::board::keyboards::Keyboard;
use crate::board::messenger::{ChatId, MessageRef, Messenger, TransportError};
use crate::board::store::{BoardStore, Registration, SqliteStore, StoreError};
use crate::board::{BoardService, Dispatcher};

pub(super) const SEEKER: UserId = UserId(100);
pub(super) const EMPLOYER: UserId = UserId(200);
pub(super) const OTHER: UserId = UserId(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Delivery {
    Text {
        chat: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        message: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Media {
        chat: ChatId,
        kind: MediaKind,
        file_id: String,
        caption: String,
    },
}

impl Delivery {
    pub(super) fn text(&self) -> &str {
        match self {
            Delivery::Text { text, .. } | Delivery::Edit { text, .. } => text,
            Delivery::Media { caption, .. } => caption,
        }
    }

    pub(super) fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Delivery::Text { keyboard, .. } | Delivery::Edit { keyboard, .. } => keyboard.as_ref(),
            Delivery::Media { .. } => None,
        }
    }

    pub(super) fn chat(&self) -> ChatId {
        match self {
            Delivery::Text { chat, .. } | Delivery::Media { chat, .. } => *chat,
            Delivery::Edit { message, .. } => message.chat,
        }
    }
}

/// Messenger double recording every outbound call.
#[derive(Default)]
pub(super) struct RecordingMessenger {
    deliveries: Mutex<Vec<Delivery>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    handles: Mutex<HashMap<UserId, String>>,
    unreachable: Mutex<HashSet<ChatId>>,
    fail_edits: AtomicBool,
    next_message: AtomicI64,
}

impl RecordingMessenger {
    pub(super) fn with_file(&self, file_id: &str, bytes: &[u8]) {
        self.files
            .lock()
            .expect("files mutex poisoned")
            .insert(file_id.to_string(), bytes.to_vec());
    }

    pub(super) fn with_handle(&self, user: UserId, handle: &str) {
        self.handles
            .lock()
            .expect("handles mutex poisoned")
            .insert(user, handle.to_string());
    }

    /// Every send to `user` fails from now on.
    pub(super) fn make_unreachable(&self, user: UserId) {
        self.unreachable
            .lock()
            .expect("unreachable mutex poisoned")
            .insert(ChatId::from(user));
    }

    pub(super) fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub(super) fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .expect("deliveries mutex poisoned")
            .clone()
    }

    pub(super) fn delivered_to(&self, user: UserId) -> Vec<Delivery> {
        let chat = ChatId::from(user);
        self.deliveries()
            .into_iter()
            .filter(|delivery| delivery.chat() == chat)
            .collect()
    }

    pub(super) fn last_to(&self, user: UserId) -> Delivery {
        self.delivered_to(user)
            .pop()
            .expect("at least one delivery to user")
    }

    pub(super) fn clear(&self) {
        self.deliveries
            .lock()
            .expect("deliveries mutex poisoned")
            .clear();
    }

    fn check_reachable(&self, chat: ChatId) -> Result<(), TransportError> {
        if self
            .unreachable
            .lock()
            .expect("unreachable mutex poisoned")
            .contains(&chat)
        {
            return Err(TransportError::Rejected(format!("chat {chat} blocked the bot")));
        }
        Ok(())
    }

    fn record(&self, delivery: Delivery) {
        self.deliveries
            .lock()
            .expect("deliveries mutex poisoned")
            .push(delivery);
    }
}

impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.check_reachable(chat)?;
        self.record(Delivery::Text {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(MessageRef {
            chat,
            message_id: self.next_message.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("message is not modified".into()));
        }
        self.check_reachable(message.chat)?;
        self.record(Delivery::Edit {
            message,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn send_media(
        &self,
        chat: ChatId,
        kind: MediaKind,
        file_id: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.check_reachable(chat)?;
        self.record(Delivery::Media {
            chat,
            kind,
            file_id: file_id.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        self.files
            .lock()
            .expect("files mutex poisoned")
            .get(file_id)
            .cloned()
            .ok_or_else(|| TransportError::Request(format!("file {file_id} is gone")))
    }

    async fn contact_handle(&self, user: UserId) -> Result<Option<String>, TransportError> {
        Ok(self
            .handles
            .lock()
            .expect("handles mutex poisoned")
            .get(&user)
            .cloned())
    }
}

/// Store double whose backend is always down.
pub(super) struct UnavailableStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database is locked".to_string()))
}

impl BoardStore for UnavailableStore {
    fn ensure_user(&self, _: UserId, _: Option<&str>) -> Result<Registration, StoreError> {
        down()
    }
    fn user(&self, _: UserId) -> Result<Option<User>, StoreError> {
        down()
    }
    fn set_role(&self, _: UserId, _: Role) -> Result<(), StoreError> {
        down()
    }
    fn insert_resume(&self, _: NewResume) -> Result<Resume, StoreError> {
        down()
    }
    fn resume(&self, _: ResumeId) -> Result<Option<Resume>, StoreError> {
        down()
    }
    fn resumes_by_owner(&self, _: UserId) -> Result<Vec<Resume>, StoreError> {
        down()
    }
    fn delete_resume(&self, _: ResumeId) -> Result<bool, StoreError> {
        down()
    }
    fn insert_vacancy(&self, _: NewVacancy) -> Result<Vacancy, StoreError> {
        down()
    }
    fn vacancy(&self, _: VacancyId) -> Result<Option<Vacancy>, StoreError> {
        down()
    }
    fn vacancies_by_owner(&self, _: UserId) -> Result<Vec<Vacancy>, StoreError> {
        down()
    }
    fn delete_vacancy(&self, _: VacancyId) -> Result<bool, StoreError> {
        down()
    }
    fn search_vacancies(&self, _: &str) -> Result<Vec<Vacancy>, StoreError> {
        down()
    }
    fn record_search(&self, _: UserId, _: &str) -> Result<(), StoreError> {
        down()
    }
    fn insert_application(
        &self,
        _: UserId,
        _: VacancyId,
        _: ResumeId,
    ) -> Result<Application, StoreError> {
        down()
    }
    fn application(&self, _: ApplicationId) -> Result<Option<Application>, StoreError> {
        down()
    }
    fn transition_application(
        &self,
        _: ApplicationId,
        _: ApplicationStatus,
        _: ApplicationStatus,
    ) -> Result<bool, StoreError> {
        down()
    }
    fn applications_by_applicant(&self, _: UserId) -> Result<Vec<ApplicationSummary>, StoreError> {
        down()
    }
    fn applications_for_employer(&self, _: UserId) -> Result<Vec<ApplicationSummary>, StoreError> {
        down()
    }
}

pub(super) type TestService = BoardService<SqliteStore, RecordingMessenger>;

/// In-memory store, recording messenger and a scratch uploads directory.
pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) store: Arc<SqliteStore>,
    pub(super) messenger: Arc<RecordingMessenger>,
    pub(super) uploads: tempfile::TempDir,
}

impl Harness {
    pub(super) fn new() -> Self {
        let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
        let messenger = Arc::new(RecordingMessenger::default());
        let uploads = tempfile::tempdir().expect("uploads dir");
        let attachments = Arc::new(AttachmentStore::new(uploads.path()));
        let service = Arc::new(BoardService::new(
            Arc::clone(&store),
            Arc::clone(&messenger),
            attachments,
        ));

        let harness = Self {
            service,
            store,
            messenger,
            uploads,
        };
        harness.register(SEEKER, Some("casey_seeker"), Role::JobSeeker);
        harness.register(EMPLOYER, Some("acme_hr"), Role::Employer);
        harness.register(OTHER, None, Role::JobSeeker);
        harness
    }

    pub(super) fn dispatcher(&self) -> Dispatcher<SqliteStore, RecordingMessenger> {
        Dispatcher::new(Arc::clone(&self.service))
    }

    fn register(&self, user: UserId, username: Option<&str>, role: Role) {
        self.store
            .ensure_user(user, username)
            .expect("user registered");
        self.store.set_role(user, role).expect("role set");
    }

    pub(super) fn vacancy(&self, owner: UserId, title: &str) -> Vacancy {
        self.store
            .insert_vacancy(NewVacancy {
                owner,
                title: title.to_string(),
                company: "Acme".to_string(),
                salary: "negotiable".to_string(),
                description: "Build things".to_string(),
                attachment: None,
            })
            .expect("vacancy inserted")
    }

    pub(super) fn resume(&self, owner: UserId, title: &str) -> Resume {
        self.store
            .insert_resume(NewResume {
                owner,
                title: title.to_string(),
                description: "Systems programmer".to_string(),
                experience: "5 years".to_string(),
                attachment: None,
            })
            .expect("resume inserted")
    }

    /// Walk the résumé form up to its file step.
    pub(super) fn resume_at_file_step(&self, user: UserId) {
        self.service.begin_resume(user);
        for input in ["Rust Developer", "Systems programmer", "5 years"] {
            self.service.submit_text(user, input).expect("field accepted");
        }
    }

    pub(super) fn vacancy_at_file_step(&self, user: UserId) {
        self.service.begin_vacancy(user);
        for input in ["Backend Engineer", "desc", "Acme", "$100k"] {
            let reply = self.service.submit_text(user, input).expect("field accepted");
            assert!(matches!(reply, FormReply::Prompt(_)));
        }
        assert_eq!(
            self.service
                .conversation_state(user)
                .and_then(|state| state.awaiting_file()),
            Some(crate::board::domain::EntityKind::Vacancy)
        );
    }

    /// Files currently under `<uploads>/<dir>`.
    pub(super) fn stored_files(&self, dir: &str) -> Vec<std::path::PathBuf> {
        match std::fs::read_dir(self.uploads.path().join(dir)) {
            Ok(entries) => entries
                .map(|entry| entry.expect("dir entry").path())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub(super) fn document(file_id: &str, name: &str) -> IncomingFile {
    IncomingFile {
        file_id: file_id.to_string(),
        file_name: Some(name.to_string()),
        kind: FileKind::Document,
    }
}

pub(super) fn origin(user: UserId) -> MessageRef {
    MessageRef {
        chat: ChatId::from(user),
        message_id: 77,
    }
}

pub(super) fn event(user: UserId, payload: EventPayload) -> Event {
    Event {
        sender: user,
        username: None,
        origin: None,
        payload,
    }
}

pub(super) fn tap(user: UserId, data: &str) -> Event {
    Event {
        sender: user,
        username: None,
        origin: Some(origin(user)),
        payload: EventPayload::Callback {
            data: data.to_string(),
        },
    }
}

pub(super) fn say(user: UserId, text: &str) -> Event {
    event(
        user,
        EventPayload::Text {
            text: text.to_string(),
        },
    )
}
