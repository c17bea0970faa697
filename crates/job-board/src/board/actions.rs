//! Button payloads.
//!
//! The wire format is the flat `snake_case` tag the chat transport echoes back
//! (`view_vacancy_12`, `select_resume_3_12`). Tags are parsed once into
//! [`CallbackAction`] so handlers only ever see typed ids.

use std::fmt;
use std::str::FromStr;

use super::domain::{ApplicationId, ResumeId, VacancyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    ChooseJobSeeker,
    ChooseEmployer,
    MainMenu,
    /// Back to the seeker menu from résumé screens.
    ReturnToMainMenu,
    /// Back to the seeker menu from search results.
    BackToMenu,

    CreateResume,
    MyResumes,
    ViewResume(ResumeId),
    DeleteResume(ResumeId),
    ConfirmDeleteResume(ResumeId),

    PostVacancy,
    MyVacancies,
    ViewVacancy(VacancyId),
    DeleteVacancy(VacancyId),
    ConfirmDeleteVacancy(VacancyId),

    SearchVacancies,
    PreviousVacancy { index: usize },
    NextVacancy { index: usize },
    ApplyVacancy(VacancyId),
    SelectResume { resume: ResumeId, vacancy: VacancyId },
    BackToVacancy(VacancyId),

    Invite(ApplicationId),
    Reject(ApplicationId),
    MyApplications,
    Responses,

    SkipFile,
    ConfirmSkipFile,
    CancelSkipFile,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized callback payload '{raw}'")]
pub struct ActionParseError {
    pub raw: String,
}

impl FromStr for CallbackAction {
    type Err = ActionParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ActionParseError {
            raw: raw.to_string(),
        };

        let fixed = match raw {
            "job_seeker" => Some(CallbackAction::ChooseJobSeeker),
            "employer" => Some(CallbackAction::ChooseEmployer),
            "main_menu" => Some(CallbackAction::MainMenu),
            "return_to_main_menu" => Some(CallbackAction::ReturnToMainMenu),
            "back_to_menu" => Some(CallbackAction::BackToMenu),
            "create_resume" => Some(CallbackAction::CreateResume),
            "my_resumes" => Some(CallbackAction::MyResumes),
            "post_vacancy" => Some(CallbackAction::PostVacancy),
            "my_vacancies" => Some(CallbackAction::MyVacancies),
            "search_vacancies" => Some(CallbackAction::SearchVacancies),
            "my_applications" => Some(CallbackAction::MyApplications),
            "responses" => Some(CallbackAction::Responses),
            "skip_file" => Some(CallbackAction::SkipFile),
            "confirm_skip_file" => Some(CallbackAction::ConfirmSkipFile),
            "cancel_skip_file" => Some(CallbackAction::CancelSkipFile),
            _ => None,
        };
        if let Some(action) = fixed {
            return Ok(action);
        }

        if let Some(rest) = raw.strip_prefix("select_resume_") {
            let (resume, vacancy) = rest.split_once('_').ok_or_else(invalid)?;
            return Ok(CallbackAction::SelectResume {
                resume: ResumeId(parse_id(resume).ok_or_else(invalid)?),
                vacancy: VacancyId(parse_id(vacancy).ok_or_else(invalid)?),
            });
        }

        let (prefix, id) = raw.rsplit_once('_').ok_or_else(invalid)?;
        let action = match prefix {
            "view_resume" => CallbackAction::ViewResume(ResumeId(parse_id(id).ok_or_else(invalid)?)),
            "delete_resume" => {
                CallbackAction::DeleteResume(ResumeId(parse_id(id).ok_or_else(invalid)?))
            }
            "confirm_delete_resume" => {
                CallbackAction::ConfirmDeleteResume(ResumeId(parse_id(id).ok_or_else(invalid)?))
            }
            "view_vacancy" => {
                CallbackAction::ViewVacancy(VacancyId(parse_id(id).ok_or_else(invalid)?))
            }
            "delete_vacancy" => {
                CallbackAction::DeleteVacancy(VacancyId(parse_id(id).ok_or_else(invalid)?))
            }
            "confirm_delete_vacancy" => {
                CallbackAction::ConfirmDeleteVacancy(VacancyId(parse_id(id).ok_or_else(invalid)?))
            }
            "apply_vacancy" => {
                CallbackAction::ApplyVacancy(VacancyId(parse_id(id).ok_or_else(invalid)?))
            }
            "back_to_vacancy" => {
                CallbackAction::BackToVacancy(VacancyId(parse_id(id).ok_or_else(invalid)?))
            }
            "prev_vacancy" => CallbackAction::PreviousVacancy {
                index: id.parse().map_err(|_| invalid())?,
            },
            "next_vacancy" => CallbackAction::NextVacancy {
                index: id.parse().map_err(|_| invalid())?,
            },
            "invite" => CallbackAction::Invite(ApplicationId(parse_id(id).ok_or_else(invalid)?)),
            "reject" => CallbackAction::Reject(ApplicationId(parse_id(id).ok_or_else(invalid)?)),
            _ => return Err(invalid()),
        };
        Ok(action)
    }
}

/// Row ids are positive; anything else never names a record.
fn parse_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|id| *id > 0)
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::ChooseJobSeeker => f.write_str("job_seeker"),
            CallbackAction::ChooseEmployer => f.write_str("employer"),
            CallbackAction::MainMenu => f.write_str("main_menu"),
            CallbackAction::ReturnToMainMenu => f.write_str("return_to_main_menu"),
            CallbackAction::BackToMenu => f.write_str("back_to_menu"),
            CallbackAction::CreateResume => f.write_str("create_resume"),
            CallbackAction::MyResumes => f.write_str("my_resumes"),
            CallbackAction::ViewResume(id) => write!(f, "view_resume_{id}"),
            CallbackAction::DeleteResume(id) => write!(f, "delete_resume_{id}"),
            CallbackAction::ConfirmDeleteResume(id) => write!(f, "confirm_delete_resume_{id}"),
            CallbackAction::PostVacancy => f.write_str("post_vacancy"),
            CallbackAction::MyVacancies => f.write_str("my_vacancies"),
            CallbackAction::ViewVacancy(id) => write!(f, "view_vacancy_{id}"),
            CallbackAction::DeleteVacancy(id) => write!(f, "delete_vacancy_{id}"),
            CallbackAction::ConfirmDeleteVacancy(id) => write!(f, "confirm_delete_vacancy_{id}"),
            CallbackAction::SearchVacancies => f.write_str("search_vacancies"),
            CallbackAction::PreviousVacancy { index } => write!(f, "prev_vacancy_{index}"),
            CallbackAction::NextVacancy { index } => write!(f, "next_vacancy_{index}"),
            CallbackAction::ApplyVacancy(id) => write!(f, "apply_vacancy_{id}"),
            CallbackAction::SelectResume { resume, vacancy } => {
                write!(f, "select_resume_{resume}_{vacancy}")
            }
            CallbackAction::BackToVacancy(id) => write!(f, "back_to_vacancy_{id}"),
            CallbackAction::Invite(id) => write!(f, "invite_{id}"),
            CallbackAction::Reject(id) => write!(f, "reject_{id}"),
            CallbackAction::MyApplications => f.write_str("my_applications"),
            CallbackAction::Responses => f.write_str("responses"),
            CallbackAction::SkipFile => f.write_str("skip_file"),
            CallbackAction::ConfirmSkipFile => f.write_str("confirm_skip_file"),
            CallbackAction::CancelSkipFile => f.write_str("cancel_skip_file"),
        }
    }
}
