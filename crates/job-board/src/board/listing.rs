use tracing::{info, warn};

use super::attachments::MediaKind;
use super::domain::{Attachment, EntityKind, Resume, ResumeId, UserId, Vacancy, VacancyId};
use super::messenger::{ChatId, Messenger, TransportError};
use super::navigation::{Cursor, Direction, SearchResults};
use super::service::{BoardError, BoardService, Subject};
use super::store::BoardStore;
use super::views;

/// One vacancy out of a browsable result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub vacancy: Vacancy,
    pub cursor: Cursor,
}

impl<S, M> BoardService<S, M>
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    pub fn list_resumes(&self, owner: UserId) -> Result<Vec<Resume>, BoardError> {
        Ok(self.store.resumes_by_owner(owner)?)
    }

    pub fn list_vacancies(&self, owner: UserId) -> Result<Vec<Vacancy>, BoardError> {
        Ok(self.store.vacancies_by_owner(owner)?)
    }

    pub fn view_resume(&self, id: ResumeId) -> Result<Resume, BoardError> {
        self.store
            .resume(id)?
            .ok_or(BoardError::NotFound(Subject::Resume(id)))
    }

    pub fn view_vacancy(&self, id: VacancyId) -> Result<Vacancy, BoardError> {
        self.store
            .vacancy(id)?
            .ok_or(BoardError::NotFound(Subject::Vacancy(id)))
    }

    /// The résumé, if `requester` may delete it.
    pub fn owned_resume(&self, requester: UserId, id: ResumeId) -> Result<Resume, BoardError> {
        let resume = self.view_resume(id)?;
        if resume.owner != requester {
            return Err(BoardError::Forbidden {
                actor: requester,
                subject: Subject::Resume(id),
            });
        }
        Ok(resume)
    }

    pub fn owned_vacancy(&self, requester: UserId, id: VacancyId) -> Result<Vacancy, BoardError> {
        let vacancy = self.view_vacancy(id)?;
        if vacancy.owner != requester {
            return Err(BoardError::Forbidden {
                actor: requester,
                subject: Subject::Vacancy(id),
            });
        }
        Ok(vacancy)
    }

    pub async fn delete_resume(
        &self,
        requester: UserId,
        id: ResumeId,
    ) -> Result<Resume, BoardError> {
        let resume = self.owned_resume(requester, id)?;
        if !self.store.delete_resume(id)? {
            return Err(BoardError::NotFound(Subject::Resume(id)));
        }
        info!(user = %requester, resume = %id, "resume deleted");

        if let Some(attachment) = &resume.attachment {
            self.discard_attachment(attachment).await;
        }
        Ok(resume)
    }

    pub async fn delete_vacancy(
        &self,
        requester: UserId,
        id: VacancyId,
    ) -> Result<Vacancy, BoardError> {
        let vacancy = self.owned_vacancy(requester, id)?;
        if !self.store.delete_vacancy(id)? {
            return Err(BoardError::NotFound(Subject::Vacancy(id)));
        }
        info!(user = %requester, vacancy = %id, "vacancy deleted");

        if let Some(attachment) = &vacancy.attachment {
            self.discard_attachment(attachment).await;
        }
        Ok(vacancy)
    }

    /// The row is already gone; a file that cannot be removed is only logged.
    async fn discard_attachment(&self, attachment: &Attachment) {
        match self.attachments.remove(attachment).await {
            Ok(true) => {}
            Ok(false) => warn!(
                path = %attachment.path.display(),
                "attachment already missing on disk"
            ),
            Err(error) => warn!(%error, "failed to remove attachment"),
        }
    }

    /// Re-send a stored attachment; images go out as photos.
    pub async fn send_attachment(
        &self,
        chat: ChatId,
        kind: EntityKind,
        attachment: &Attachment,
        title: &str,
    ) -> Result<(), TransportError> {
        let media = MediaKind::for_path(&attachment.path);
        let caption = views::attachment_caption(kind, title);
        self.messenger
            .send_media(chat, media, &attachment.file_id, &caption)
            .await
    }

    /// Record the query, cache the matching ids for navigation and return the
    /// first match.
    pub fn search(&self, user: UserId, query: &str) -> Result<Option<SearchPage>, BoardError> {
        self.store.record_search(user, query)?;
        let mut matches = self.store.search_vacancies(query)?;
        info!(%user, query, matches = matches.len(), "vacancy search");

        let results = SearchResults::new(matches.iter().map(|vacancy| vacancy.id).collect());
        let cursor = results.as_ref().map(SearchResults::cursor);
        self.sessions.store_search(user, results);

        Ok(cursor.map(|cursor| SearchPage {
            vacancy: matches.swap_remove(0),
            cursor,
        }))
    }

    /// Step through the cached results from the index the button was rendered at.
    pub fn navigate(
        &self,
        user: UserId,
        from: usize,
        direction: Direction,
    ) -> Result<SearchPage, BoardError> {
        let (id, cursor) = self
            .sessions
            .with(user, |session| {
                session.search.as_mut().map(|results| {
                    let id = results.step(from, direction);
                    (id, results.cursor())
                })
            })
            .ok_or(BoardError::NotFound(Subject::SearchResults))?;

        let vacancy = self.view_vacancy(id)?;
        Ok(SearchPage { vacancy, cursor })
    }

    /// Show `id` again, keeping its place in the cached results when present.
    pub fn reopen_vacancy(&self, user: UserId, id: VacancyId) -> Result<SearchPage, BoardError> {
        let vacancy = self.view_vacancy(id)?;
        let cursor = self
            .sessions
            .with(user, |session| {
                session
                    .search
                    .as_mut()
                    .and_then(|results| results.focus(id))
            })
            .unwrap_or_else(Cursor::single);
        Ok(SearchPage { vacancy, cursor })
    }

    /// Vacancy being applied to plus the applicant's résumés to choose from.
    pub fn resumes_for_application(
        &self,
        applicant: UserId,
        vacancy: VacancyId,
    ) -> Result<(Vacancy, Vec<Resume>), BoardError> {
        let vacancy = self.view_vacancy(vacancy)?;
        let resumes = self.list_resumes(applicant)?;
        Ok((vacancy, resumes))
    }
}
