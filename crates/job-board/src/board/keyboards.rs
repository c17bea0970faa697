//! Inline keyboard layouts. Buttons carry typed actions; the transport encodes
//! them with `CallbackAction`'s `Display`.

use serde::Serialize;

use super::actions::CallbackAction;
use super::domain::{ApplicationId, Resume, ResumeId, Vacancy, VacancyId};
use super::navigation::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

impl Button {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

impl Serialize for Button {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Button", 2)?;
        state.serialize_field("text", &self.label)?;
        state.serialize_field("callback_data", &self.action.to_string())?;
        state.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    #[serde(rename = "inline_keyboard")]
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    fn column(buttons: impl IntoIterator<Item = Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|button| vec![button]).collect(),
        }
    }

    /// Every action reachable from this keyboard, row by row.
    pub fn actions(&self) -> impl Iterator<Item = CallbackAction> + '_ {
        self.rows.iter().flatten().map(|button| button.action)
    }

    pub fn contains(&self, action: CallbackAction) -> bool {
        self.actions().any(|candidate| candidate == action)
    }
}

pub fn main_menu() -> Keyboard {
    Keyboard::column([
        Button::new("👨‍💼 I'm a job seeker", CallbackAction::ChooseJobSeeker),
        Button::new("👨‍💻 I'm an employer", CallbackAction::ChooseEmployer),
    ])
}

pub fn seeker_menu() -> Keyboard {
    Keyboard::column([
        Button::new("Create résumé", CallbackAction::CreateResume),
        Button::new("My résumés", CallbackAction::MyResumes),
        Button::new("Search vacancies", CallbackAction::SearchVacancies),
        Button::new("My applications", CallbackAction::MyApplications),
        Button::new("⬅️ Main menu", CallbackAction::MainMenu),
    ])
}

pub fn employer_menu() -> Keyboard {
    Keyboard::column([
        Button::new("📝 Post a vacancy", CallbackAction::PostVacancy),
        Button::new("📋 My vacancies", CallbackAction::MyVacancies),
        Button::new("📬 Responses", CallbackAction::Responses),
        Button::new("⬅️ Main menu", CallbackAction::MainMenu),
    ])
}

pub fn skip_file() -> Keyboard {
    Keyboard::column([Button::new("Continue without a file", CallbackAction::SkipFile)])
}

pub fn confirm_skip() -> Keyboard {
    Keyboard {
        rows: vec![vec![
            Button::new("Yes", CallbackAction::ConfirmSkipFile),
            Button::new("No", CallbackAction::CancelSkipFile),
        ]],
    }
}

pub fn vacancy_list(vacancies: &[Vacancy]) -> Keyboard {
    let mut keyboard = Keyboard::column(
        vacancies
            .iter()
            .map(|vacancy| Button::new(&vacancy.title, CallbackAction::ViewVacancy(vacancy.id))),
    );
    keyboard
        .rows
        .push(vec![Button::new("⬅️ Back", CallbackAction::ChooseEmployer)]);
    keyboard
}

pub fn vacancy_detail(id: VacancyId) -> Keyboard {
    Keyboard::column([
        Button::new("⬅️ Back to my vacancies", CallbackAction::MyVacancies),
        Button::new("🗑 Delete vacancy", CallbackAction::DeleteVacancy(id)),
    ])
}

pub fn confirm_delete_vacancy(id: VacancyId) -> Keyboard {
    Keyboard {
        rows: vec![vec![
            Button::new("Yes", CallbackAction::ConfirmDeleteVacancy(id)),
            Button::new("No", CallbackAction::ViewVacancy(id)),
        ]],
    }
}

pub fn resume_list(resumes: &[Resume]) -> Keyboard {
    let mut keyboard = Keyboard::column(
        resumes
            .iter()
            .map(|resume| Button::new(&resume.title, CallbackAction::ViewResume(resume.id))),
    );
    keyboard.rows.push(vec![Button::new(
        "◀️ Back to menu",
        CallbackAction::ReturnToMainMenu,
    )]);
    keyboard
}

pub fn resume_detail(id: ResumeId) -> Keyboard {
    Keyboard {
        rows: vec![vec![
            Button::new("◀️ Back to my résumés", CallbackAction::MyResumes),
            Button::new("🗑 Delete résumé", CallbackAction::DeleteResume(id)),
        ]],
    }
}

pub fn confirm_delete_resume(id: ResumeId) -> Keyboard {
    Keyboard {
        rows: vec![vec![
            Button::new("✅ Yes", CallbackAction::ConfirmDeleteResume(id)),
            Button::new("❌ No", CallbackAction::MyResumes),
        ]],
    }
}

/// Arrows only where a neighbour exists; both carry the index they were rendered at.
pub fn vacancy_navigation(id: VacancyId, cursor: Cursor) -> Keyboard {
    let mut rows = Vec::new();

    let mut arrows = Vec::new();
    if cursor.has_previous() {
        arrows.push(Button::new(
            "⬅️",
            CallbackAction::PreviousVacancy {
                index: cursor.index,
            },
        ));
    }
    if cursor.has_next() {
        arrows.push(Button::new(
            "➡️",
            CallbackAction::NextVacancy {
                index: cursor.index,
            },
        ));
    }
    if !arrows.is_empty() {
        rows.push(arrows);
    }

    rows.push(vec![Button::new("Apply", CallbackAction::ApplyVacancy(id))]);
    rows.push(vec![Button::new("Back to menu", CallbackAction::BackToMenu)]);
    Keyboard { rows }
}

pub fn resume_selection(resumes: &[Resume], vacancy: VacancyId) -> Keyboard {
    let mut keyboard = Keyboard::column(resumes.iter().map(|resume| {
        Button::new(
            &resume.title,
            CallbackAction::SelectResume {
                resume: resume.id,
                vacancy,
            },
        )
    }));
    keyboard.rows.push(vec![Button::new(
        "Back to vacancy",
        CallbackAction::BackToVacancy(vacancy),
    )]);
    keyboard
}

pub fn application_response(id: ApplicationId) -> Keyboard {
    Keyboard {
        rows: vec![vec![
            Button::new("Invite", CallbackAction::Invite(id)),
            Button::new("Reject", CallbackAction::Reject(id)),
        ]],
    }
}

pub fn back_to(action: CallbackAction) -> Keyboard {
    Keyboard::column([Button::new("⬅️ Back", action)])
}
