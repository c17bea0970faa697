//! Seeker → employer application workflow.
//!
//! Records are committed before anything is sent. Notifications are best
//! effort: a delivery failure is logged and returned as a warning, never rolled
//! back.

use tracing::{debug, info, warn};

use super::domain::{
    Application, ApplicationDecision, ApplicationId, ApplicationStatus, ApplicationSummary,
    EntityKind, Resume, ResumeId, UserId, Vacancy, VacancyId,
};
use super::keyboards;
use super::messenger::{ChatId, MessageRef, Messenger, TransportError};
use super::service::{BoardError, BoardService, Subject};
use super::store::BoardStore;
use super::views;

/// Committed application plus any notifications that could not be delivered.
#[derive(Debug)]
pub struct Submission {
    pub application: Application,
    pub vacancy: Vacancy,
    pub warnings: Vec<TransportError>,
}

#[derive(Debug)]
pub struct Decision {
    pub application: Application,
    pub vacancy: Vacancy,
    pub warnings: Vec<TransportError>,
}

impl<S, M> BoardService<S, M>
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    pub async fn submit_application(
        &self,
        applicant: UserId,
        vacancy: VacancyId,
        resume: ResumeId,
    ) -> Result<Submission, BoardError> {
        let vacancy = self.view_vacancy(vacancy)?;
        let resume = self.view_resume(resume)?;
        if resume.owner != applicant {
            return Err(BoardError::Forbidden {
                actor: applicant,
                subject: Subject::Resume(resume.id),
            });
        }

        let application = self
            .store
            .insert_application(applicant, vacancy.id, resume.id)?;
        info!(
            application = %application.id,
            %applicant,
            vacancy = %vacancy.id,
            "application submitted"
        );

        let warnings = self.notify_employer(&vacancy, &resume, &application).await;
        Ok(Submission {
            application,
            vacancy,
            warnings,
        })
    }

    async fn notify_employer(
        &self,
        vacancy: &Vacancy,
        resume: &Resume,
        application: &Application,
    ) -> Vec<TransportError> {
        let chat = ChatId::from(vacancy.owner);
        let mut warnings = Vec::new();

        let alert = self
            .messenger
            .send_text(chat, &views::application_alert(vacancy), None)
            .await;
        if let Err(error) = alert {
            warnings.push(error);
        }

        let keyboard = keyboards::application_response(application.id);
        let detail = self
            .messenger
            .send_text(chat, &views::applicant_resume(resume), Some(&keyboard))
            .await;
        if let Err(error) = detail {
            warnings.push(error);
        }

        if let Some(attachment) = &resume.attachment {
            if let Err(error) = self
                .send_attachment(chat, EntityKind::Resume, attachment, &resume.title)
                .await
            {
                warnings.push(error);
            }
        }

        for error in &warnings {
            warn!(application = %application.id, %error, "employer notification failed");
        }
        warnings
    }

    /// Move a `new` application to its terminal status, tell the applicant and
    /// update the employer's message in place.
    pub async fn decide_application(
        &self,
        actor: UserId,
        id: ApplicationId,
        decision: ApplicationDecision,
        origin: Option<MessageRef>,
    ) -> Result<Decision, BoardError> {
        let mut application = self
            .store
            .application(id)?
            .ok_or(BoardError::NotFound(Subject::Application(id)))?;
        let vacancy = match application.vacancy {
            Some(vacancy) => self.store.vacancy(vacancy)?,
            None => None,
        }
        .ok_or(BoardError::NotFound(Subject::Application(id)))?;
        if vacancy.owner != actor {
            return Err(BoardError::Forbidden {
                actor,
                subject: Subject::Application(id),
            });
        }
        if application.status.is_terminal() {
            return Err(BoardError::AlreadyDecided {
                id,
                status: application.status,
            });
        }

        let next = decision.status();
        if !self
            .store
            .transition_application(id, ApplicationStatus::New, next)?
        {
            // Lost a race with a concurrent decision.
            let status = self
                .store
                .application(id)?
                .map_or(next, |current| current.status);
            return Err(BoardError::AlreadyDecided { id, status });
        }
        application.status = next;
        info!(application = %id, status = %next, "application decided");

        let mut warnings = Vec::new();
        let applicant = ChatId::from(application.applicant);
        let (notice, employer_text) = match decision {
            ApplicationDecision::Invite => {
                let employer_handle = self.handle_for(actor).await;
                let applicant_handle = self.handle_for(application.applicant).await;
                (
                    views::invitation(&vacancy, employer_handle.as_deref()),
                    views::invited_applicant(&vacancy, applicant_handle.as_deref()),
                )
            }
            ApplicationDecision::Reject => (
                views::rejection(&vacancy),
                views::rejected_applicant(&vacancy),
            ),
        };

        if let Err(error) = self.messenger.send_text(applicant, &notice, None).await {
            warn!(application = %id, %error, "applicant notification failed");
            warnings.push(error);
        }

        let edited = match origin {
            Some(message) => match self.messenger.edit_text(message, &employer_text, None).await {
                Ok(()) => true,
                Err(error) => {
                    debug!(application = %id, %error, "edit failed, sending instead");
                    false
                }
            },
            None => false,
        };
        if !edited {
            let sent = self
                .messenger
                .send_text(ChatId::from(actor), &employer_text, None)
                .await;
            if let Err(error) = sent {
                warn!(application = %id, %error, "employer message update failed");
                warnings.push(error);
            }
        }

        Ok(Decision {
            application,
            vacancy,
            warnings,
        })
    }

    /// Transport handle, falling back to the username captured at registration.
    async fn handle_for(&self, user: UserId) -> Option<String> {
        match self.messenger.contact_handle(user).await {
            Ok(Some(handle)) => return Some(handle),
            Ok(None) => {}
            Err(error) => warn!(%user, %error, "contact lookup failed"),
        }
        match self.store.user(user) {
            Ok(found) => found.and_then(|user| user.username),
            Err(error) => {
                warn!(%user, %error, "stored username lookup failed");
                None
            }
        }
    }

    /// Applications the seeker has sent, oldest first.
    pub fn list_applications(
        &self,
        applicant: UserId,
    ) -> Result<Vec<ApplicationSummary>, BoardError> {
        Ok(self.store.applications_by_applicant(applicant)?)
    }

    /// Applications received on the employer's vacancies, oldest first.
    pub fn incoming_applications(
        &self,
        employer: UserId,
    ) -> Result<Vec<ApplicationSummary>, BoardError> {
        Ok(self.store.applications_for_employer(employer)?)
    }
}
