//! Routes inbound events to the board service and renders the replies.
//!
//! Replies to a button press edit the message the button belonged to; replies
//! to text and files are sent as new messages.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::actions::CallbackAction;
use super::applications::{Decision, Submission};
use super::attachments::IncomingFile;
use super::conversation::Prompt;
use super::domain::{ApplicationDecision, ApplicationId, Attachment, EntityKind, Role, UserId};
use super::events::{Event, EventPayload};
use super::forms::{CreatedEntity, FormReply};
use super::keyboards::{self, Keyboard};
use super::listing::SearchPage;
use super::messenger::{ChatId, Messenger};
use super::navigation::{Cursor, Direction};
use super::service::{BoardError, BoardService, Subject};
use super::store::BoardStore;
use super::views;

pub struct Dispatcher<S, M> {
    service: Arc<BoardService<S, M>>,
}

impl<S, M> Clone for Dispatcher<S, M> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S, M> Dispatcher<S, M>
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    pub fn new(service: Arc<BoardService<S, M>>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &BoardService<S, M> {
        &self.service
    }

    /// Handle one event end to end. Failures are reported to the sender and
    /// never propagate.
    pub async fn handle(&self, event: Event) {
        debug!(user = %event.sender, payload = ?event.payload, "event received");
        if let Err(failure) = self.route(&event).await {
            match &failure {
                BoardError::NotFound(_)
                | BoardError::Forbidden { .. }
                | BoardError::AlreadyDecided { .. } => {
                    info!(user = %event.sender, error = %failure, "request refused")
                }
                BoardError::Validation(_) | BoardError::Transport(_) => {
                    warn!(user = %event.sender, error = %failure, "event handling failed")
                }
                BoardError::Store(_) | BoardError::Attachment(_) => {
                    error!(user = %event.sender, error = %failure, "event handling failed")
                }
            }
            self.report(&event, &failure).await;
        }
    }

    async fn route(&self, event: &Event) -> Result<(), BoardError> {
        let registration = self
            .service
            .register(event.sender, event.username.as_deref())?;

        match &event.payload {
            EventPayload::Start => {
                self.send(
                    event.sender,
                    views::welcome(registration.created),
                    Some(keyboards::main_menu()),
                )
                .await
            }
            EventPayload::Menu => {
                let (text, keyboard) = menu_for(registration.user.role);
                self.send(event.sender, text, Some(keyboard)).await
            }
            EventPayload::Callback { data } => match data.parse::<CallbackAction>() {
                Ok(action) => self.on_action(event, action).await,
                Err(unknown) => {
                    debug!(user = %event.sender, error = %unknown, "unknown callback");
                    self.reply(event, views::UNKNOWN_ACTION, Some(keyboards::main_menu()))
                        .await
                }
            },
            EventPayload::Text { text } => {
                let reply = self.service.submit_text(event.sender, text)?;
                self.render_form(event, reply).await
            }
            EventPayload::File(file) => self.on_file(event, file).await,
            EventPayload::Unsupported => {
                let awaiting_file = self
                    .service
                    .conversation_state(event.sender)
                    .and_then(|state| state.awaiting_file());
                match awaiting_file {
                    Some(kind) => {
                        self.render_form(event, FormReply::Retry(Prompt::AttachFile(kind)))
                            .await
                    }
                    None => {
                        self.send(event.sender, views::UNSUPPORTED_MESSAGE, None)
                            .await
                    }
                }
            }
        }
    }

    async fn on_action(&self, event: &Event, action: CallbackAction) -> Result<(), BoardError> {
        let user = event.sender;
        let service = &self.service;

        match action {
            CallbackAction::ChooseJobSeeker => {
                service.choose_role(user, Role::JobSeeker)?;
                self.reply(event, views::SEEKER_MENU, Some(keyboards::seeker_menu()))
                    .await
            }
            CallbackAction::ChooseEmployer => {
                service.choose_role(user, Role::Employer)?;
                self.reply(event, views::EMPLOYER_MENU, Some(keyboards::employer_menu()))
                    .await
            }
            CallbackAction::MainMenu => {
                self.reply(event, views::MAIN_MENU, Some(keyboards::main_menu()))
                    .await
            }
            CallbackAction::ReturnToMainMenu | CallbackAction::BackToMenu => {
                self.reply(event, views::SEEKER_MENU, Some(keyboards::seeker_menu()))
                    .await
            }

            CallbackAction::CreateResume => {
                let prompt = service.begin_resume(user);
                self.reply(event, views::prompt(prompt), None).await
            }
            CallbackAction::MyResumes => {
                let resumes = service.list_resumes(user)?;
                if resumes.is_empty() {
                    self.reply(
                        event,
                        views::empty_list(EntityKind::Resume),
                        Some(keyboards::seeker_menu()),
                    )
                    .await
                } else {
                    self.reply(
                        event,
                        views::owned_list(EntityKind::Resume),
                        Some(keyboards::resume_list(&resumes)),
                    )
                    .await
                }
            }
            CallbackAction::ViewResume(id) => {
                let resume = service.view_resume(id)?;
                self.reply(
                    event,
                    &views::resume_detail(&resume),
                    Some(keyboards::resume_detail(id)),
                )
                .await?;
                if let Some(attachment) = &resume.attachment {
                    self.forward_attachment(user, EntityKind::Resume, attachment, &resume.title)
                        .await;
                }
                Ok(())
            }
            CallbackAction::DeleteResume(id) => {
                service.owned_resume(user, id)?;
                self.reply(
                    event,
                    views::confirm_delete(EntityKind::Resume),
                    Some(keyboards::confirm_delete_resume(id)),
                )
                .await
            }
            CallbackAction::ConfirmDeleteResume(id) => {
                service.delete_resume(user, id).await?;
                self.reply(
                    event,
                    views::deleted(EntityKind::Resume),
                    Some(keyboards::back_to(CallbackAction::MyResumes)),
                )
                .await
            }

            CallbackAction::PostVacancy => {
                let prompt = service.begin_vacancy(user);
                self.reply(event, views::prompt(prompt), None).await
            }
            CallbackAction::MyVacancies => {
                let vacancies = service.list_vacancies(user)?;
                if vacancies.is_empty() {
                    self.reply(
                        event,
                        views::empty_list(EntityKind::Vacancy),
                        Some(keyboards::employer_menu()),
                    )
                    .await
                } else {
                    self.reply(
                        event,
                        views::owned_list(EntityKind::Vacancy),
                        Some(keyboards::vacancy_list(&vacancies)),
                    )
                    .await
                }
            }
            CallbackAction::ViewVacancy(id) => {
                let vacancy = service.view_vacancy(id)?;
                let keyboard = if vacancy.owner == user {
                    keyboards::vacancy_detail(id)
                } else {
                    keyboards::vacancy_navigation(id, Cursor::single())
                };
                self.reply(event, &views::vacancy_detail(&vacancy), Some(keyboard))
                    .await?;
                if let Some(attachment) = &vacancy.attachment {
                    self.forward_attachment(user, EntityKind::Vacancy, attachment, &vacancy.title)
                        .await;
                }
                Ok(())
            }
            CallbackAction::DeleteVacancy(id) => {
                service.owned_vacancy(user, id)?;
                self.reply(
                    event,
                    views::confirm_delete(EntityKind::Vacancy),
                    Some(keyboards::confirm_delete_vacancy(id)),
                )
                .await
            }
            CallbackAction::ConfirmDeleteVacancy(id) => {
                service.delete_vacancy(user, id).await?;
                self.reply(
                    event,
                    views::deleted(EntityKind::Vacancy),
                    Some(keyboards::back_to(CallbackAction::MyVacancies)),
                )
                .await
            }

            CallbackAction::SearchVacancies => {
                let prompt = service.begin_search(user);
                self.reply(event, views::prompt(prompt), None).await
            }
            CallbackAction::PreviousVacancy { index } => {
                let page = service.navigate(user, index, Direction::Previous)?;
                self.show_page(event, page).await
            }
            CallbackAction::NextVacancy { index } => {
                let page = service.navigate(user, index, Direction::Next)?;
                self.show_page(event, page).await
            }
            CallbackAction::BackToVacancy(id) => {
                let page = service.reopen_vacancy(user, id)?;
                self.show_page(event, page).await
            }
            CallbackAction::ApplyVacancy(id) => {
                let (vacancy, resumes) = service.resumes_for_application(user, id)?;
                if resumes.is_empty() {
                    self.reply(event, views::need_resume(), Some(keyboards::seeker_menu()))
                        .await
                } else {
                    self.reply(
                        event,
                        views::pick_resume(),
                        Some(keyboards::resume_selection(&resumes, vacancy.id)),
                    )
                    .await
                }
            }
            CallbackAction::SelectResume { resume, vacancy } => {
                let Submission {
                    vacancy, warnings, ..
                } = service.submit_application(user, vacancy, resume).await?;
                let mut text = views::application_sent(&vacancy);
                if !warnings.is_empty() {
                    text.push('\n');
                    text.push_str(views::notification_warning());
                }
                self.reply(event, &text, Some(keyboards::seeker_menu()))
                    .await
            }

            CallbackAction::Invite(id) => {
                self.decide(event, id, ApplicationDecision::Invite).await
            }
            CallbackAction::Reject(id) => {
                self.decide(event, id, ApplicationDecision::Reject).await
            }
            CallbackAction::MyApplications => {
                let summaries = service.list_applications(user)?;
                self.reply(
                    event,
                    &views::applications(&summaries, Role::JobSeeker),
                    Some(keyboards::back_to(CallbackAction::ReturnToMainMenu)),
                )
                .await
            }
            CallbackAction::Responses => {
                let summaries = service.incoming_applications(user)?;
                self.reply(
                    event,
                    &views::applications(&summaries, Role::Employer),
                    Some(keyboards::back_to(CallbackAction::ChooseEmployer)),
                )
                .await
            }

            CallbackAction::SkipFile => {
                let reply = service.skip_file(user);
                self.render_form(event, reply).await
            }
            CallbackAction::CancelSkipFile => {
                let reply = service.cancel_skip(user);
                self.render_form(event, reply).await
            }
            CallbackAction::ConfirmSkipFile => {
                let reply = service.confirm_skip(user)?;
                self.render_form(event, reply).await
            }
        }
    }

    async fn decide(
        &self,
        event: &Event,
        id: ApplicationId,
        decision: ApplicationDecision,
    ) -> Result<(), BoardError> {
        let Decision { warnings, .. } = self
            .service
            .decide_application(event.sender, id, decision, event.origin)
            .await?;
        if !warnings.is_empty() {
            self.send(event.sender, views::applicant_notice_failed(), None)
                .await?;
        }
        Ok(())
    }

    async fn on_file(&self, event: &Event, file: &IncomingFile) -> Result<(), BoardError> {
        match self.service.attach_file(event.sender, file).await {
            Ok(reply) => self.render_form(event, reply).await,
            Err(failure) => {
                warn!(user = %event.sender, error = %failure, "attachment step failed");
                self.send(
                    event.sender,
                    views::attach_failed(),
                    Some(keyboards::skip_file()),
                )
                .await
            }
        }
    }

    async fn render_form(&self, event: &Event, reply: FormReply) -> Result<(), BoardError> {
        match reply {
            FormReply::Prompt(prompt) => {
                self.reply(event, views::prompt(prompt), prompt_keyboard(prompt))
                    .await
            }
            FormReply::Retry(prompt) => {
                self.reply(event, &views::retry(prompt), prompt_keyboard(prompt))
                    .await
            }
            FormReply::Created(created) => {
                let kind = created.kind();
                let text = if created.attachment().is_some() {
                    views::created_with_file(kind)
                } else {
                    views::created(kind)
                };
                let keyboard = match created {
                    CreatedEntity::Vacancy(_) => keyboards::employer_menu(),
                    CreatedEntity::Resume(_) => keyboards::seeker_menu(),
                };
                self.reply(event, text, Some(keyboard)).await
            }
            FormReply::Searched(Some(page)) => self.show_page(event, page).await,
            FormReply::Searched(None) => {
                self.reply(
                    event,
                    views::no_search_results(),
                    Some(keyboards::seeker_menu()),
                )
                .await
            }
            FormReply::Idle => {
                let role = self.service.role_of(event.sender)?;
                let (_, keyboard) = menu_for(role);
                self.reply(event, views::NO_CONVERSATION, Some(keyboard))
                    .await
            }
        }
    }

    async fn show_page(&self, event: &Event, page: SearchPage) -> Result<(), BoardError> {
        let SearchPage { vacancy, cursor } = page;
        self.reply(
            event,
            &views::vacancy_detail(&vacancy),
            Some(keyboards::vacancy_navigation(vacancy.id, cursor)),
        )
        .await?;
        if let Some(attachment) = &vacancy.attachment {
            self.forward_attachment(
                event.sender,
                EntityKind::Vacancy,
                attachment,
                &vacancy.title,
            )
            .await;
        }
        Ok(())
    }

    /// Attachments are a soft extra; a failed delivery becomes a short notice.
    async fn forward_attachment(
        &self,
        user: UserId,
        kind: EntityKind,
        attachment: &Attachment,
        title: &str,
    ) {
        let chat = ChatId::from(user);
        if let Err(failure) = self
            .service
            .send_attachment(chat, kind, attachment, title)
            .await
        {
            warn!(%user, error = %failure, "attachment delivery failed");
            let notice = self
                .service
                .messenger()
                .send_text(chat, views::attachment_unavailable(), None)
                .await;
            if let Err(failure) = notice {
                warn!(%user, error = %failure, "attachment notice failed");
            }
        }
    }

    /// Edit the originating message when there is one, otherwise send anew.
    async fn reply(
        &self,
        event: &Event,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), BoardError> {
        let Some(origin) = event.origin else {
            return self.send(event.sender, text, keyboard).await;
        };

        let messenger = self.service.messenger();
        match messenger.edit_text(origin, text, keyboard.as_ref()).await {
            Ok(()) => Ok(()),
            Err(failure) => {
                debug!(user = %event.sender, error = %failure, "edit failed, sending instead");
                self.send(event.sender, text, keyboard).await
            }
        }
    }

    async fn send(
        &self,
        user: UserId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), BoardError> {
        self.service
            .messenger()
            .send_text(ChatId::from(user), text, keyboard.as_ref())
            .await?;
        Ok(())
    }

    async fn report(&self, event: &Event, failure: &BoardError) {
        let text = match failure {
            BoardError::NotFound(Subject::Resume(_)) => views::not_found(EntityKind::Resume),
            BoardError::NotFound(Subject::Vacancy(_)) => views::not_found(EntityKind::Vacancy),
            BoardError::NotFound(Subject::Application(_)) => views::application_not_found(),
            BoardError::NotFound(Subject::SearchResults) => views::SEARCH_AGAIN,
            BoardError::Forbidden { .. } => views::forbidden(),
            BoardError::AlreadyDecided { .. } => views::already_decided(),
            _ => views::GENERIC_FAILURE,
        };
        let role = self.service.role_of(event.sender).ok().flatten();
        let (_, keyboard) = menu_for(role);

        if let Err(failure) = self.reply(event, text, Some(keyboard)).await {
            warn!(user = %event.sender, error = %failure, "failed to report error");
        }
    }
}

fn menu_for(role: Option<Role>) -> (&'static str, Keyboard) {
    match role {
        Some(role @ Role::JobSeeker) => (views::role_menu(role), keyboards::seeker_menu()),
        Some(role @ Role::Employer) => (views::role_menu(role), keyboards::employer_menu()),
        None => (views::MAIN_MENU, keyboards::main_menu()),
    }
}

fn prompt_keyboard(prompt: Prompt) -> Option<Keyboard> {
    match prompt {
        Prompt::AttachFile(_) => Some(keyboards::skip_file()),
        Prompt::ConfirmSkip(_) => Some(keyboards::confirm_skip()),
        _ => None,
    }
}
