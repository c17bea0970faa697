use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

use super::{BoardStore, Registration, StoreError};
use crate::board::domain::{
    Application, ApplicationId, ApplicationStatus, ApplicationSummary, Attachment, NewResume,
    NewVacancy, Resume, ResumeId, Role, User, UserId, Vacancy, VacancyId,
};

const SCHEMA: &str = "
    PRAGMA foreign_keys=ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT,
        role TEXT CHECK (role IS NULL OR role IN ('job_seeker', 'employer')),
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS resumes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        experience TEXT NOT NULL,
        file_id TEXT,
        file_path TEXT,
        created_at TEXT NOT NULL,
        CHECK ((file_id IS NULL) = (file_path IS NULL))
    );

    CREATE TABLE IF NOT EXISTS vacancies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        company TEXT NOT NULL,
        salary TEXT NOT NULL,
        file_id TEXT,
        file_path TEXT,
        created_at TEXT NOT NULL,
        CHECK ((file_id IS NULL) = (file_path IS NULL))
    );

    CREATE TABLE IF NOT EXISTS applications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        vacancy_id INTEGER REFERENCES vacancies(id) ON DELETE SET NULL,
        resume_id INTEGER REFERENCES resumes(id) ON DELETE SET NULL,
        status TEXT NOT NULL DEFAULT 'new' CHECK (status IN ('new', 'invited', 'rejected')),
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS search_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        query TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_resumes_user ON resumes(user_id);
    CREATE INDEX IF NOT EXISTS idx_vacancies_user ON vacancies(user_id);
    CREATE INDEX IF NOT EXISTS idx_applications_vacancy ON applications(vacancy_id);
    CREATE INDEX IF NOT EXISTS idx_applications_user ON applications(user_id);
";

const USER_COLUMNS: &str = "id, username, role, created_at";
const RESUME_COLUMNS: &str =
    "id, user_id, title, description, experience, file_id, file_path, created_at";
const VACANCY_COLUMNS: &str =
    "id, user_id, title, company, salary, description, file_id, file_path, created_at";
const APPLICATION_COLUMNS: &str = "id, user_id, vacancy_id, resume_id, status, created_at";

/// SQLite-backed store. One connection guarded by a mutex; each call runs its
/// own transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".to_string()))
    }
}

impl BoardStore for SqliteStore {
    fn ensure_user(
        &self,
        id: UserId,
        username: Option<&str>,
    ) -> Result<Registration, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO users (id, username, created_at) VALUES (?1, ?2, ?3)",
            params![id.0, username, Utc::now()],
        )?;
        if inserted == 0 && username.is_some() {
            tx.execute(
                "UPDATE users SET username = ?2 WHERE id = ?1 AND username IS NOT ?2",
                params![id.0, username],
            )?;
        }
        let user = tx.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.0],
            user_from_row,
        )?;
        tx.commit()?;

        Ok(Registration {
            user,
            created: inserted == 1,
        })
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.0],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn set_role(&self, id: UserId, role: Role) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE users SET role = ?2 WHERE id = ?1",
            params![id.0, role],
        )?;
        if updated == 0 {
            return Err(StoreError::MissingReference);
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_resume(&self, resume: NewResume) -> Result<Resume, StoreError> {
        let (file_id, file_path) = attachment_columns(resume.attachment.as_ref());
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO resumes (user_id, title, description, experience, file_id, file_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                resume.owner.0,
                resume.title,
                resume.description,
                resume.experience,
                file_id,
                file_path,
                Utc::now(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let stored = tx.query_row(
            &format!("SELECT {RESUME_COLUMNS} FROM resumes WHERE id = ?1"),
            params![id],
            resume_from_row,
        )?;
        tx.commit()?;
        Ok(stored)
    }

    fn resume(&self, id: ResumeId) -> Result<Option<Resume>, StoreError> {
        let conn = self.lock()?;
        let resume = conn
            .query_row(
                &format!("SELECT {RESUME_COLUMNS} FROM resumes WHERE id = ?1"),
                params![id.0],
                resume_from_row,
            )
            .optional()?;
        Ok(resume)
    }

    fn resumes_by_owner(&self, owner: UserId) -> Result<Vec<Resume>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RESUME_COLUMNS} FROM resumes WHERE user_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![owner.0], resume_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_resume(&self, id: ResumeId) -> Result<bool, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM resumes WHERE id = ?1", params![id.0])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn insert_vacancy(&self, vacancy: NewVacancy) -> Result<Vacancy, StoreError> {
        let (file_id, file_path) = attachment_columns(vacancy.attachment.as_ref());
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO vacancies (user_id, title, company, salary, description, file_id, file_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                vacancy.owner.0,
                vacancy.title,
                vacancy.company,
                vacancy.salary,
                vacancy.description,
                file_id,
                file_path,
                Utc::now(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let stored = tx.query_row(
            &format!("SELECT {VACANCY_COLUMNS} FROM vacancies WHERE id = ?1"),
            params![id],
            vacancy_from_row,
        )?;
        tx.commit()?;
        Ok(stored)
    }

    fn vacancy(&self, id: VacancyId) -> Result<Option<Vacancy>, StoreError> {
        let conn = self.lock()?;
        let vacancy = conn
            .query_row(
                &format!("SELECT {VACANCY_COLUMNS} FROM vacancies WHERE id = ?1"),
                params![id.0],
                vacancy_from_row,
            )
            .optional()?;
        Ok(vacancy)
    }

    fn vacancies_by_owner(&self, owner: UserId) -> Result<Vec<Vacancy>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies WHERE user_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![owner.0], vacancy_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_vacancy(&self, id: VacancyId) -> Result<bool, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM vacancies WHERE id = ?1", params![id.0])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn search_vacancies(&self, query: &str) -> Result<Vec<Vacancy>, StoreError> {
        // SQLite's LIKE and lower() only fold ASCII; titles are free text in any script.
        let needle = query.to_lowercase();
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VACANCY_COLUMNS} FROM vacancies ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map([], vacancy_from_row)?;

        let mut matches = Vec::new();
        for row in rows {
            let vacancy = row?;
            if vacancy.title.to_lowercase().contains(&needle) {
                matches.push(vacancy);
            }
        }
        Ok(matches)
    }

    fn record_search(&self, owner: UserId, query: &str) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO search_history (user_id, query, created_at) VALUES (?1, ?2, ?3)",
            params![owner.0, query, Utc::now()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn insert_application(
        &self,
        applicant: UserId,
        vacancy: VacancyId,
        resume: ResumeId,
    ) -> Result<Application, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO applications (user_id, vacancy_id, resume_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                applicant.0,
                vacancy.0,
                resume.0,
                ApplicationStatus::New,
                Utc::now()
            ],
        )?;
        let id = tx.last_insert_rowid();
        let stored = tx.query_row(
            &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
            params![id],
            application_from_row,
        )?;
        tx.commit()?;
        Ok(stored)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, StoreError> {
        let conn = self.lock()?;
        let application = conn
            .query_row(
                &format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?1"),
                params![id.0],
                application_from_row,
            )
            .optional()?;
        Ok(application)
    }

    fn transition_application(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<bool, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE applications SET status = ?3 WHERE id = ?1 AND status = ?2",
            params![id.0, expected, next],
        )?;
        tx.commit()?;
        Ok(updated == 1)
    }

    fn applications_by_applicant(
        &self,
        applicant: UserId,
    ) -> Result<Vec<ApplicationSummary>, StoreError> {
        self.application_summaries("a.user_id = ?1", applicant)
    }

    fn applications_for_employer(
        &self,
        employer: UserId,
    ) -> Result<Vec<ApplicationSummary>, StoreError> {
        self.application_summaries("v.user_id = ?1", employer)
    }
}

impl SqliteStore {
    fn application_summaries(
        &self,
        filter: &str,
        user: UserId,
    ) -> Result<Vec<ApplicationSummary>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT a.id, a.user_id, a.vacancy_id, a.resume_id, a.status, a.created_at, v.title, r.title
             FROM applications a
             LEFT JOIN vacancies v ON v.id = a.vacancy_id
             LEFT JOIN resumes r ON r.id = a.resume_id
             WHERE {filter}
             ORDER BY a.id ASC"
        ))?;
        let rows = stmt.query_map(params![user.0], |row| {
            Ok(ApplicationSummary {
                application: application_from_row(row)?,
                vacancy_title: row.get(6)?,
                resume_title: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn attachment_columns(attachment: Option<&Attachment>) -> (Option<&str>, Option<String>) {
    match attachment {
        Some(attachment) => (
            Some(attachment.file_id.as_str()),
            Some(attachment.path.to_string_lossy().into_owned()),
        ),
        None => (None, None),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        role: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn resume_from_row(row: &Row<'_>) -> rusqlite::Result<Resume> {
    Ok(Resume {
        id: ResumeId(row.get(0)?),
        owner: UserId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        experience: row.get(4)?,
        attachment: Attachment::from_parts(row.get(5)?, row.get(6)?),
        created_at: row.get(7)?,
    })
}

fn vacancy_from_row(row: &Row<'_>) -> rusqlite::Result<Vacancy> {
    Ok(Vacancy {
        id: VacancyId(row.get(0)?),
        owner: UserId(row.get(1)?),
        title: row.get(2)?,
        company: row.get(3)?,
        salary: row.get(4)?,
        description: row.get(5)?,
        attachment: Attachment::from_parts(row.get(6)?, row.get(7)?),
        created_at: row.get(8)?,
    })
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    Ok(Application {
        id: ApplicationId(row.get(0)?),
        applicant: UserId(row.get(1)?),
        vacancy: row.get::<_, Option<i64>>(2)?.map(VacancyId),
        resume: row.get::<_, Option<i64>>(3)?.map(ResumeId),
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl ToSql for ApplicationStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for ApplicationStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        ApplicationStatus::from_label(raw)
            .ok_or_else(|| FromSqlError::Other(format!("unknown application status '{raw}'").into()))
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        Role::from_label(raw)
            .ok_or_else(|| FromSqlError::Other(format!("unknown role '{raw}'").into()))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                StoreError::MissingReference
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => StoreError::Corrupt(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}
