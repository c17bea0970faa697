//! User-facing copy.

use chrono::{DateTime, Utc};

use super::conversation::Prompt;
use super::domain::{ApplicationSummary, EntityKind, Resume, Role, Vacancy};

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

fn timestamp(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

pub const MAIN_MENU: &str = "Main menu:";
pub const SEEKER_MENU: &str = "Job seeker menu:";
pub const EMPLOYER_MENU: &str = "Employer menu:";
pub const UNKNOWN_ACTION: &str = "That button is no longer available. Main menu:";
pub const NO_CONVERSATION: &str = "Use the menu below to get started.";
pub const UNSUPPORTED_MESSAGE: &str = "Sorry, I can only handle text, documents and photos.";
pub const SEARCH_AGAIN: &str = "Search results have expired. Please search again.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

pub fn welcome(created: bool) -> &'static str {
    if created {
        "Welcome to the job board! Choose your role:"
    } else {
        "Welcome back! Choose your role:"
    }
}

pub fn role_menu(role: Role) -> &'static str {
    match role {
        Role::JobSeeker => SEEKER_MENU,
        Role::Employer => EMPLOYER_MENU,
    }
}

pub fn prompt(prompt: Prompt) -> &'static str {
    match prompt {
        Prompt::VacancyTitle => "Enter the job title:",
        Prompt::VacancyDescription => "Enter the vacancy description:",
        Prompt::VacancyCompany => "Enter the company name:",
        Prompt::VacancySalary => "Enter the salary (or 'negotiable'):",
        Prompt::ResumeTitle => "Enter the title of your résumé (e.g. 'Python Developer'):",
        Prompt::ResumeDescription => "Describe yourself (education, skills and so on):",
        Prompt::ResumeExperience => "Describe your work experience:",
        Prompt::AttachFile(EntityKind::Vacancy) => {
            "Attach a file to the vacancy (document or photo), or continue without one."
        }
        Prompt::AttachFile(EntityKind::Resume) => {
            "Attach your résumé file (document or photo), or continue without one."
        }
        Prompt::ConfirmSkip(EntityKind::Vacancy) => "Publish the vacancy without a file?",
        Prompt::ConfirmSkip(EntityKind::Resume) => "Save the résumé without a file?",
        Prompt::SearchQuery => "Enter a job title to search for:",
    }
}

/// Reply to input that does not fit the current step.
pub fn retry(prompt: Prompt) -> String {
    match prompt {
        Prompt::AttachFile(_) => {
            "Please send a file or tap 'Continue without a file'.".to_string()
        }
        Prompt::ConfirmSkip(_) => "Please answer with the buttons below.".to_string(),
        other => format!("The value cannot be empty. {}", self::prompt(other)),
    }
}

pub fn created(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vacancy => "Vacancy published!",
        EntityKind::Resume => "Résumé saved!",
    }
}

pub fn created_with_file(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vacancy => "Vacancy published with the attached file!",
        EntityKind::Resume => "Résumé saved with the attached file!",
    }
}

pub fn attach_failed() -> &'static str {
    "Could not save the file. Try again or continue without a file."
}

pub fn deleted(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vacancy => "Vacancy deleted.",
        EntityKind::Resume => "Résumé deleted.",
    }
}

pub fn confirm_delete(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vacancy => "Are you sure you want to delete this vacancy?",
        EntityKind::Resume => "Are you sure you want to delete this résumé?",
    }
}

pub fn not_found(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vacancy => "Vacancy not found.",
        EntityKind::Resume => "Résumé not found.",
    }
}

pub fn application_not_found() -> &'static str {
    "Application not found."
}

pub fn forbidden() -> &'static str {
    "You are not allowed to do that."
}

pub fn empty_list(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vacancy => "You have not posted any vacancies yet.",
        EntityKind::Resume => "You have no résumés yet.",
    }
}

pub fn owned_list(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vacancy => "Your vacancies:",
        EntityKind::Resume => "Your résumés:",
    }
}

pub fn vacancy_detail(vacancy: &Vacancy) -> String {
    format!(
        "Position: {}\nCompany: {}\nSalary: {}\nDescription: {}\nCreated: {}",
        vacancy.title,
        vacancy.company,
        vacancy.salary,
        vacancy.description,
        timestamp(vacancy.created_at)
    )
}

pub fn resume_detail(resume: &Resume) -> String {
    format!(
        "ID: {}\nTitle: {}\nDescription: {}\nExperience: {}\nCreated: {}",
        resume.id,
        resume.title,
        resume.description,
        resume.experience,
        timestamp(resume.created_at)
    )
}

/// Résumé as forwarded to an employer.
pub fn applicant_resume(resume: &Resume) -> String {
    format!(
        "Applicant's résumé:\nTitle: {}\nDescription: {}\nExperience: {}\nCreated: {}",
        resume.title,
        resume.description,
        resume.experience,
        timestamp(resume.created_at)
    )
}

pub fn attachment_caption(kind: EntityKind, title: &str) -> String {
    match kind {
        EntityKind::Vacancy => format!("Vacancy file: {title}"),
        EntityKind::Resume => format!("Résumé file: {title}"),
    }
}

pub fn attachment_unavailable() -> &'static str {
    "The attached file could not be sent."
}

pub fn no_search_results() -> &'static str {
    "No vacancies match your query. Try another title."
}

pub fn pick_resume() -> &'static str {
    "Choose the résumé to apply with:"
}

pub fn need_resume() -> &'static str {
    "You need a résumé before applying. Create one first."
}

pub fn application_alert(vacancy: &Vacancy) -> String {
    format!("New application for your vacancy '{}'!", vacancy.title)
}

pub fn application_sent(vacancy: &Vacancy) -> String {
    format!("Your application for '{}' has been sent.", vacancy.title)
}

pub fn notification_warning() -> &'static str {
    "The employer could not be notified right now; your application is saved."
}

pub fn invitation(vacancy: &Vacancy, employer_handle: Option<&str>) -> String {
    match employer_handle {
        Some(handle) => format!(
            "Good news! You are invited for the vacancy '{}'. Contact the employer: @{handle}",
            vacancy.title
        ),
        None => format!(
            "Good news! You are invited for the vacancy '{}'. The employer will contact you.",
            vacancy.title
        ),
    }
}

pub fn rejection(vacancy: &Vacancy) -> String {
    format!(
        "Unfortunately, your application for '{}' was declined.",
        vacancy.title
    )
}

pub fn invited_applicant(vacancy: &Vacancy, applicant_handle: Option<&str>) -> String {
    match applicant_handle {
        Some(handle) => format!(
            "You invited the applicant for '{}'. Contact them: @{handle}",
            vacancy.title
        ),
        None => format!("You invited the applicant for '{}'.", vacancy.title),
    }
}

pub fn rejected_applicant(vacancy: &Vacancy) -> String {
    format!("You declined the applicant for '{}'.", vacancy.title)
}

pub fn already_decided() -> &'static str {
    "This application has already been answered."
}

pub fn applicant_notice_failed() -> &'static str {
    "The applicant could not be notified right now."
}

pub fn applications(summaries: &[ApplicationSummary], role: Role) -> String {
    if summaries.is_empty() {
        return match role {
            Role::JobSeeker => "You have not applied to any vacancies yet.".to_string(),
            Role::Employer => "No responses to your vacancies yet.".to_string(),
        };
    }

    let heading = match role {
        Role::JobSeeker => "Your applications:",
        Role::Employer => "Responses to your vacancies:",
    };
    let mut text = heading.to_string();
    for summary in summaries {
        text.push_str(&format!(
            "\n• {} ({}): {}",
            summary.vacancy_title.as_deref().unwrap_or("deleted vacancy"),
            summary.resume_title.as_deref().unwrap_or("deleted résumé"),
            summary.application.status
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::board::domain::{
        Application, ApplicationId, ApplicationStatus, ResumeId, UserId, VacancyId,
    };

    fn vacancy() -> Vacancy {
        Vacancy {
            id: VacancyId(1),
            owner: UserId(10),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            salary: "$100k".to_string(),
            description: "desc".to_string(),
            attachment: None,
            created_at: Utc
                .with_ymd_and_hms(2024, 3, 5, 9, 7, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn vacancy_detail_lists_fields_in_order() {
        assert_eq!(
            vacancy_detail(&vacancy()),
            "Position: Backend Engineer\nCompany: Acme\nSalary: $100k\nDescription: desc\nCreated: 05.03.2024 09:07"
        );
    }

    #[test]
    fn invitation_carries_contact_handle() {
        let text = invitation(&vacancy(), Some("acme_hr"));
        assert!(text.contains("@acme_hr"));
        assert!(!invitation(&vacancy(), None).contains('@'));
    }

    #[test]
    fn application_list_shows_status_labels() {
        let summary = ApplicationSummary {
            application: Application {
                id: ApplicationId(1),
                applicant: UserId(3),
                vacancy: Some(VacancyId(1)),
                resume: Some(ResumeId(2)),
                status: ApplicationStatus::Invited,
                created_at: vacancy().created_at,
            },
            vacancy_title: Some("Backend Engineer".to_string()),
            resume_title: Some("Rust Developer".to_string()),
        };
        let text = applications(std::slice::from_ref(&summary), Role::JobSeeker);
        assert!(text.ends_with("Backend Engineer (Rust Developer): invited"));

        let orphaned = ApplicationSummary {
            vacancy_title: None,
            ..summary
        };
        let text = applications(&[orphaned], Role::JobSeeker);
        assert!(text.ends_with("deleted vacancy (Rust Developer): invited"));
        assert!(applications(&[], Role::Employer).starts_with("No responses"));
    }
}
