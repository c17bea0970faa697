//! Multi-step forms driven by chat messages.
//!
//! A conversation is a state tag plus the draft accumulated so far. Transitions
//! here are pure; persistence and replies happen in the service layer.

use super::domain::{Attachment, EntityKind, NewResume, NewVacancy, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyStep {
    Title,
    Description,
    Company,
    Salary,
    File,
    /// Attachment received and being stored.
    Uploading,
    ConfirmSkip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStep {
    Title,
    Description,
    Experience,
    File,
    Uploading,
    ConfirmSkip,
}

/// Named step a user's dialog is waiting at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Vacancy(VacancyStep),
    Resume(ResumeStep),
    SearchQuery,
}

impl ConversationState {
    /// Which form, if any, is waiting at its attachment step.
    pub fn awaiting_file(self) -> Option<EntityKind> {
        match self {
            ConversationState::Vacancy(VacancyStep::File) => Some(EntityKind::Vacancy),
            ConversationState::Resume(ResumeStep::File) => Some(EntityKind::Resume),
            _ => None,
        }
    }

    pub fn uploading(self) -> Option<EntityKind> {
        match self {
            ConversationState::Vacancy(VacancyStep::Uploading) => Some(EntityKind::Vacancy),
            ConversationState::Resume(ResumeStep::Uploading) => Some(EntityKind::Resume),
            _ => None,
        }
    }

    pub fn awaiting_confirmation(self) -> Option<EntityKind> {
        match self {
            ConversationState::Vacancy(VacancyStep::ConfirmSkip) => Some(EntityKind::Vacancy),
            ConversationState::Resume(ResumeStep::ConfirmSkip) => Some(EntityKind::Resume),
            _ => None,
        }
    }

    /// What the user is asked for while sitting in this state.
    pub fn prompt(self) -> Prompt {
        match self {
            ConversationState::Vacancy(VacancyStep::Title) => Prompt::VacancyTitle,
            ConversationState::Vacancy(VacancyStep::Description) => Prompt::VacancyDescription,
            ConversationState::Vacancy(VacancyStep::Company) => Prompt::VacancyCompany,
            ConversationState::Vacancy(VacancyStep::Salary) => Prompt::VacancySalary,
            ConversationState::Vacancy(VacancyStep::File | VacancyStep::Uploading) => {
                Prompt::AttachFile(EntityKind::Vacancy)
            }
            ConversationState::Vacancy(VacancyStep::ConfirmSkip) => {
                Prompt::ConfirmSkip(EntityKind::Vacancy)
            }
            ConversationState::Resume(ResumeStep::Title) => Prompt::ResumeTitle,
            ConversationState::Resume(ResumeStep::Description) => Prompt::ResumeDescription,
            ConversationState::Resume(ResumeStep::Experience) => Prompt::ResumeExperience,
            ConversationState::Resume(ResumeStep::File | ResumeStep::Uploading) => {
                Prompt::AttachFile(EntityKind::Resume)
            }
            ConversationState::Resume(ResumeStep::ConfirmSkip) => {
                Prompt::ConfirmSkip(EntityKind::Resume)
            }
            ConversationState::SearchQuery => Prompt::SearchQuery,
        }
    }
}

/// Question shown to the user for the next field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    VacancyTitle,
    VacancyDescription,
    VacancyCompany,
    VacancySalary,
    ResumeTitle,
    ResumeDescription,
    ResumeExperience,
    AttachFile(EntityKind),
    ConfirmSkip(EntityKind),
    SearchQuery,
}

/// Fields collected so far; only the ones relevant to the active form get filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub salary: Option<String>,
    pub experience: Option<String>,
}

impl Draft {
    pub fn to_vacancy(&self, owner: UserId, attachment: Option<Attachment>) -> Option<NewVacancy> {
        Some(NewVacancy {
            owner,
            title: self.title.clone()?,
            company: self.company.clone()?,
            salary: self.salary.clone()?,
            description: self.description.clone()?,
            attachment,
        })
    }

    pub fn to_resume(&self, owner: UserId, attachment: Option<Attachment>) -> Option<NewResume> {
        Some(NewResume {
            owner,
            title: self.title.clone()?,
            description: self.description.clone()?,
            experience: self.experience.clone()?,
            attachment,
        })
    }
}

/// Result of feeding a text message into the active conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOutcome {
    /// Field stored; the conversation now waits for `Prompt`.
    Advanced(Prompt),
    /// Search query captured; the conversation is finished.
    Query(String),
    /// Input did not fit the current step; state unchanged.
    Rejected(Prompt),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    state: ConversationState,
    draft: Draft,
}

impl Conversation {
    pub fn vacancy() -> Self {
        Self::at(ConversationState::Vacancy(VacancyStep::Title))
    }

    pub fn resume() -> Self {
        Self::at(ConversationState::Resume(ResumeStep::Title))
    }

    pub fn search() -> Self {
        Self::at(ConversationState::SearchQuery)
    }

    fn at(state: ConversationState) -> Self {
        Self {
            state,
            draft: Draft::default(),
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn accept_text(&mut self, text: &str) -> TextOutcome {
        if text.trim().is_empty() {
            return TextOutcome::Rejected(self.state.prompt());
        }
        let value = text.to_string();

        let next = match self.state {
            ConversationState::Vacancy(step) => match step {
                VacancyStep::Title => {
                    self.draft.title = Some(value);
                    ConversationState::Vacancy(VacancyStep::Description)
                }
                VacancyStep::Description => {
                    self.draft.description = Some(value);
                    ConversationState::Vacancy(VacancyStep::Company)
                }
                VacancyStep::Company => {
                    self.draft.company = Some(value);
                    ConversationState::Vacancy(VacancyStep::Salary)
                }
                VacancyStep::Salary => {
                    self.draft.salary = Some(value);
                    ConversationState::Vacancy(VacancyStep::File)
                }
                VacancyStep::File | VacancyStep::Uploading | VacancyStep::ConfirmSkip => {
                    return TextOutcome::Rejected(self.state.prompt());
                }
            },
            ConversationState::Resume(step) => match step {
                ResumeStep::Title => {
                    self.draft.title = Some(value);
                    ConversationState::Resume(ResumeStep::Description)
                }
                ResumeStep::Description => {
                    self.draft.description = Some(value);
                    ConversationState::Resume(ResumeStep::Experience)
                }
                ResumeStep::Experience => {
                    self.draft.experience = Some(value);
                    ConversationState::Resume(ResumeStep::File)
                }
                ResumeStep::File | ResumeStep::Uploading | ResumeStep::ConfirmSkip => {
                    return TextOutcome::Rejected(self.state.prompt());
                }
            },
            ConversationState::SearchQuery => return TextOutcome::Query(text.trim().to_string()),
        };

        self.state = next;
        TextOutcome::Advanced(next.prompt())
    }

    /// File step → confirmation. `None` when not at a file step.
    pub fn request_skip(&mut self) -> Option<EntityKind> {
        let kind = self.state.awaiting_file()?;
        self.state = match kind {
            EntityKind::Vacancy => ConversationState::Vacancy(VacancyStep::ConfirmSkip),
            EntityKind::Resume => ConversationState::Resume(ResumeStep::ConfirmSkip),
        };
        Some(kind)
    }

    /// File step → uploading. Only one attachment can be in flight per form.
    pub fn begin_upload(&mut self) -> Option<EntityKind> {
        let kind = self.state.awaiting_file()?;
        self.state = match kind {
            EntityKind::Vacancy => ConversationState::Vacancy(VacancyStep::Uploading),
            EntityKind::Resume => ConversationState::Resume(ResumeStep::Uploading),
        };
        Some(kind)
    }

    /// Uploading → back to the file step after a failed attachment.
    pub fn abort_upload(&mut self) -> Option<EntityKind> {
        let kind = self.state.uploading()?;
        self.state = match kind {
            EntityKind::Vacancy => ConversationState::Vacancy(VacancyStep::File),
            EntityKind::Resume => ConversationState::Resume(ResumeStep::File),
        };
        Some(kind)
    }

    /// Confirmation → back to the file step.
    pub fn cancel_skip(&mut self) -> Option<EntityKind> {
        let kind = self.state.awaiting_confirmation()?;
        self.state = match kind {
            EntityKind::Vacancy => ConversationState::Vacancy(VacancyStep::File),
            EntityKind::Resume => ConversationState::Resume(ResumeStep::File),
        };
        Some(kind)
    }
}
