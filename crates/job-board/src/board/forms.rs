use tracing::{debug, info, warn};

use super::attachments::IncomingFile;
use super::conversation::{Conversation, Prompt, TextOutcome};
use super::domain::{Attachment, EntityKind, Resume, UserId, Vacancy};
use super::listing::SearchPage;
use super::messenger::Messenger;
use super::service::{BoardError, BoardService};
use super::store::BoardStore;

/// Entity persisted at the end of a creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedEntity {
    Vacancy(Vacancy),
    Resume(Resume),
}

impl CreatedEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            CreatedEntity::Vacancy(_) => EntityKind::Vacancy,
            CreatedEntity::Resume(_) => EntityKind::Resume,
        }
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        match self {
            CreatedEntity::Vacancy(vacancy) => vacancy.attachment.as_ref(),
            CreatedEntity::Resume(resume) => resume.attachment.as_ref(),
        }
    }
}

/// What the form layer wants shown after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormReply {
    /// Ask for the next field.
    Prompt(Prompt),
    /// Input did not fit; ask again for the same field.
    Retry(Prompt),
    Created(CreatedEntity),
    /// Search finished; `None` when nothing matched.
    Searched(Option<SearchPage>),
    /// No conversation in progress.
    Idle,
}

impl<S, M> BoardService<S, M>
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    /// Start (or restart) the vacancy form.
    pub fn begin_vacancy(&self, user: UserId) -> Prompt {
        self.begin(user, Conversation::vacancy())
    }

    pub fn begin_resume(&self, user: UserId) -> Prompt {
        self.begin(user, Conversation::resume())
    }

    pub fn begin_search(&self, user: UserId) -> Prompt {
        self.begin(user, Conversation::search())
    }

    fn begin(&self, user: UserId, conversation: Conversation) -> Prompt {
        let prompt = conversation.state().prompt();
        debug!(%user, state = ?conversation.state(), "conversation started");
        self.sessions.begin(user, conversation);
        prompt
    }

    pub fn submit_text(&self, user: UserId, text: &str) -> Result<FormReply, BoardError> {
        let outcome = self.sessions.with(user, |session| {
            let conversation = session.conversation.as_mut()?;
            let outcome = conversation.accept_text(text);
            let state = conversation.state();
            if matches!(outcome, TextOutcome::Query(_)) {
                session.conversation = None;
            }
            Some((outcome, state))
        });
        let Some((outcome, state)) = outcome else {
            return Ok(FormReply::Idle);
        };

        match outcome {
            TextOutcome::Advanced(prompt) => {
                debug!(%user, ?state, "conversation advanced");
                Ok(FormReply::Prompt(prompt))
            }
            TextOutcome::Rejected(prompt) => Ok(FormReply::Retry(prompt)),
            TextOutcome::Query(query) => Ok(FormReply::Searched(self.search(user, &query)?)),
        }
    }

    /// `skip_file` pressed at a file step.
    pub fn skip_file(&self, user: UserId) -> FormReply {
        self.sessions.with(user, |session| {
            let Some(conversation) = session.conversation.as_mut() else {
                return FormReply::Idle;
            };
            match conversation.request_skip() {
                Some(kind) => FormReply::Prompt(Prompt::ConfirmSkip(kind)),
                None => FormReply::Retry(conversation.state().prompt()),
            }
        })
    }

    pub fn cancel_skip(&self, user: UserId) -> FormReply {
        self.sessions.with(user, |session| {
            let Some(conversation) = session.conversation.as_mut() else {
                return FormReply::Idle;
            };
            match conversation.cancel_skip() {
                Some(kind) => FormReply::Prompt(Prompt::AttachFile(kind)),
                None => FormReply::Retry(conversation.state().prompt()),
            }
        })
    }

    /// Persist the draft without an attachment. On failure the conversation
    /// stays at the confirmation step.
    pub fn confirm_skip(&self, user: UserId) -> Result<FormReply, BoardError> {
        let claimed = self.sessions.with(user, |session| {
            let state = session.conversation.as_ref()?.state();
            Some(match state.awaiting_confirmation() {
                Some(kind) => session
                    .conversation
                    .take()
                    .map(|conversation| (kind, conversation))
                    .ok_or(state.prompt()),
                None => Err(state.prompt()),
            })
        });
        let (kind, conversation) = match claimed {
            None => return Ok(FormReply::Idle),
            Some(Err(prompt)) => return Ok(FormReply::Retry(prompt)),
            Some(Ok(claimed)) => claimed,
        };

        match self.persist(user, kind, &conversation, None) {
            Ok(created) => Ok(FormReply::Created(created)),
            Err(error) => {
                self.restore(user, conversation);
                Err(error)
            }
        }
    }

    /// Download `file`, store it under the role directory and persist the
    /// draft with it. Any failure leaves the conversation at the file step and
    /// no file behind. A file arriving while another one is being stored is
    /// answered with the attachment prompt.
    pub async fn attach_file(
        &self,
        user: UserId,
        file: &IncomingFile,
    ) -> Result<FormReply, BoardError> {
        let claimed = self.sessions.with(user, |session| {
            let conversation = session.conversation.as_mut()?;
            Some(match conversation.begin_upload() {
                Some(kind) => Ok((kind, conversation.clone())),
                None => Err(conversation.state().prompt()),
            })
        });
        let (kind, uploading) = match claimed {
            None => return Ok(FormReply::Idle),
            Some(Err(prompt)) => return Ok(FormReply::Retry(prompt)),
            Some(Ok(claimed)) => claimed,
        };

        match self.store_with_file(user, kind, &uploading, file).await {
            Ok(created) => {
                self.finish(user, &uploading);
                Ok(FormReply::Created(created))
            }
            Err(error) => {
                self.sessions.with(user, |session| {
                    if let Some(conversation) = session
                        .conversation
                        .as_mut()
                        .filter(|conversation| **conversation == uploading)
                    {
                        conversation.abort_upload();
                    }
                });
                Err(error)
            }
        }
    }

    async fn store_with_file(
        &self,
        user: UserId,
        kind: EntityKind,
        conversation: &Conversation,
        file: &IncomingFile,
    ) -> Result<CreatedEntity, BoardError> {
        let bytes = self.messenger.download(&file.file_id).await?;
        let attachment = self.attachments.write(kind, file, &bytes).await?;
        debug!(%user, path = %attachment.path.display(), "attachment stored");

        match self.persist(user, kind, conversation, Some(attachment.clone())) {
            Ok(created) => Ok(created),
            Err(error) => {
                if let Err(cleanup) = self.attachments.remove(&attachment).await {
                    warn!(%user, error = %cleanup, "failed to remove orphaned attachment");
                }
                Err(error)
            }
        }
    }

    fn persist(
        &self,
        user: UserId,
        kind: EntityKind,
        conversation: &Conversation,
        attachment: Option<Attachment>,
    ) -> Result<CreatedEntity, BoardError> {
        let draft = conversation.draft();
        match kind {
            EntityKind::Vacancy => {
                let vacancy = draft
                    .to_vacancy(user, attachment)
                    .ok_or_else(|| BoardError::Validation("vacancy draft is incomplete".into()))?;
                let vacancy = self.store.insert_vacancy(vacancy)?;
                info!(%user, vacancy = %vacancy.id, "vacancy created");
                Ok(CreatedEntity::Vacancy(vacancy))
            }
            EntityKind::Resume => {
                let resume = draft
                    .to_resume(user, attachment)
                    .ok_or_else(|| BoardError::Validation("resume draft is incomplete".into()))?;
                let resume = self.store.insert_resume(resume)?;
                info!(%user, resume = %resume.id, "resume created");
                Ok(CreatedEntity::Resume(resume))
            }
        }
    }

    /// Put a claimed conversation back unless the user already started another one.
    fn restore(&self, user: UserId, conversation: Conversation) {
        self.sessions.with(user, |session| {
            if session.conversation.is_none() {
                session.conversation = Some(conversation);
            }
        });
    }

    /// Clear the conversation unless the user already started another one.
    fn finish(&self, user: UserId, completed: &Conversation) {
        self.sessions.with(user, |session| {
            if session.conversation.as_ref() == Some(completed) {
                session.conversation = None;
            }
        });
    }
}
