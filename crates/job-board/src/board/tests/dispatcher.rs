use std::sync::Arc;

use super::common::*;

use crate::board::actions::CallbackAction;
use crate::board::attachments::AttachmentStore;
use crate::board::conversation::Prompt;
use crate::board::domain::{ApplicationStatus, EntityKind, UserId};
use crate::board::events::{Event, EventPayload};
use crate::board::store::BoardStore;
use crate::board::{views, BoardService, Dispatcher};

#[tokio::test]
async fn start_twice_registers_once() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();
    let newcomer = UserId(555);
    let start = Event {
        username: Some("newcomer".to_string()),
        ..event(newcomer, EventPayload::Start)
    };

    dispatcher.handle(start.clone()).await;
    dispatcher.handle(start).await;

    let greetings: Vec<_> = harness
        .messenger
        .delivered_to(newcomer)
        .iter()
        .map(|delivery| delivery.text().to_string())
        .collect();
    assert_eq!(greetings, [views::welcome(true), views::welcome(false)]);

    let user = harness
        .store
        .user(newcomer)
        .expect("lookup works")
        .expect("registered");
    assert_eq!(user.username.as_deref(), Some("newcomer"));
    assert!(user.role.is_none());
}

#[tokio::test]
async fn vacancy_conversation_end_to_end() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();

    dispatcher.handle(tap(EMPLOYER, "post_vacancy")).await;
    for input in ["Backend Engineer", "desc", "Acme", "$100k"] {
        dispatcher.handle(say(EMPLOYER, input)).await;
    }
    let offer = harness.messenger.last_to(EMPLOYER);
    assert!(offer
        .keyboard()
        .expect("skip button")
        .contains(CallbackAction::SkipFile));

    dispatcher.handle(tap(EMPLOYER, "skip_file")).await;
    dispatcher.handle(tap(EMPLOYER, "confirm_skip_file")).await;

    assert_eq!(
        harness.messenger.last_to(EMPLOYER).text(),
        "Vacancy published!"
    );
    let stored = harness
        .store
        .vacancies_by_owner(EMPLOYER)
        .expect("listing works");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].salary, "$100k");
}

#[tokio::test]
async fn text_without_conversation_shows_the_role_menu() {
    let harness = Harness::new();
    harness.dispatcher().handle(say(SEEKER, "hi")).await;

    let reply = harness.messenger.last_to(SEEKER);
    assert_eq!(reply.text(), views::NO_CONVERSATION);
    assert!(reply
        .keyboard()
        .expect("menu")
        .contains(CallbackAction::SearchVacancies));
}

#[tokio::test]
async fn unknown_callback_falls_back_to_main_menu() {
    let harness = Harness::new();
    harness
        .dispatcher()
        .handle(tap(SEEKER, "launch_rockets"))
        .await;

    match harness.messenger.last_to(SEEKER) {
        Delivery::Edit { text, keyboard, .. } => {
            assert_eq!(text, views::UNKNOWN_ACTION);
            assert!(keyboard
                .expect("main menu")
                .contains(CallbackAction::ChooseEmployer));
        }
        other => panic!("expected an edit, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_edit_falls_back_to_a_new_message() {
    let harness = Harness::new();
    harness.messenger.fail_edits();
    harness.dispatcher().handle(tap(SEEKER, "main_menu")).await;

    assert!(matches!(
        harness.messenger.last_to(SEEKER),
        Delivery::Text { ref text, .. } if text == views::MAIN_MENU
    ));
}

#[tokio::test]
async fn choosing_a_role_persists_it() {
    let harness = Harness::new();
    let newcomer = UserId(556);
    let dispatcher = harness.dispatcher();
    dispatcher.handle(event(newcomer, EventPayload::Start)).await;
    dispatcher.handle(tap(newcomer, "employer")).await;

    let user = harness
        .store
        .user(newcomer)
        .expect("lookup works")
        .expect("registered");
    assert_eq!(user.role, Some(crate::board::Role::Employer));
    assert_eq!(harness.messenger.last_to(newcomer).text(), views::EMPLOYER_MENU);
}

#[tokio::test]
async fn stale_navigation_asks_to_search_again() {
    let harness = Harness::new();
    harness
        .dispatcher()
        .handle(tap(SEEKER, "next_vacancy_0"))
        .await;

    assert_eq!(harness.messenger.last_to(SEEKER).text(), views::SEARCH_AGAIN);
}

#[tokio::test]
async fn search_then_navigate_renders_arrows() {
    let harness = Harness::new();
    harness.vacancy(EMPLOYER, "Rust One");
    harness.vacancy(EMPLOYER, "Rust Two");
    let dispatcher = harness.dispatcher();

    dispatcher.handle(tap(SEEKER, "search_vacancies")).await;
    dispatcher.handle(say(SEEKER, "rust")).await;
    let first = harness.messenger.last_to(SEEKER);
    assert!(first.text().starts_with("Position: Rust One"));
    let keyboard = first.keyboard().expect("navigation");
    assert!(keyboard.contains(CallbackAction::NextVacancy { index: 0 }));
    assert!(!keyboard.contains(CallbackAction::PreviousVacancy { index: 0 }));

    dispatcher.handle(tap(SEEKER, "next_vacancy_0")).await;
    let second = harness.messenger.last_to(SEEKER);
    assert!(second.text().starts_with("Position: Rust Two"));
    let keyboard = second.keyboard().expect("navigation");
    assert!(keyboard.contains(CallbackAction::PreviousVacancy { index: 1 }));
    assert!(!keyboard.contains(CallbackAction::NextVacancy { index: 1 }));
}

#[tokio::test]
async fn apply_and_invite_through_buttons() {
    let harness = Harness::new();
    let vacancy = harness.vacancy(EMPLOYER, "Backend Engineer");
    let resume = harness.resume(SEEKER, "Rust Developer");
    harness.messenger.with_handle(EMPLOYER, "acme_hr");
    let dispatcher = harness.dispatcher();

    dispatcher
        .handle(tap(SEEKER, &format!("apply_vacancy_{}", vacancy.id)))
        .await;
    let picker = harness.messenger.last_to(SEEKER);
    let select = CallbackAction::SelectResume {
        resume: resume.id,
        vacancy: vacancy.id,
    };
    assert!(picker.keyboard().expect("résumé picker").contains(select));

    dispatcher.handle(tap(SEEKER, &select.to_string())).await;
    let applications = harness
        .service
        .incoming_applications(EMPLOYER)
        .expect("listed");
    assert_eq!(applications.len(), 1);
    let id = applications[0].application.id;

    harness.messenger.clear();
    dispatcher.handle(tap(EMPLOYER, &format!("invite_{id}"))).await;

    assert_eq!(
        harness
            .store
            .application(id)
            .expect("lookup works")
            .map(|application| application.status),
        Some(ApplicationStatus::Invited)
    );
    let to_seeker = harness.messenger.delivered_to(SEEKER);
    assert_eq!(to_seeker.len(), 1);
    assert!(to_seeker[0].text().contains("@acme_hr"));

    harness.messenger.clear();
    dispatcher.handle(tap(EMPLOYER, &format!("reject_{id}"))).await;
    assert_eq!(
        harness.messenger.last_to(EMPLOYER).text(),
        views::already_decided()
    );
    assert!(harness.messenger.delivered_to(SEEKER).is_empty());
}

#[tokio::test]
async fn delete_requires_confirmation_and_ownership() {
    let harness = Harness::new();
    let resume = harness.resume(SEEKER, "Rust Developer");
    let dispatcher = harness.dispatcher();

    dispatcher
        .handle(tap(OTHER, &format!("delete_resume_{}", resume.id)))
        .await;
    assert_eq!(harness.messenger.last_to(OTHER).text(), views::forbidden());

    dispatcher
        .handle(tap(SEEKER, &format!("delete_resume_{}", resume.id)))
        .await;
    assert!(harness
        .messenger
        .last_to(SEEKER)
        .keyboard()
        .expect("confirmation")
        .contains(CallbackAction::ConfirmDeleteResume(resume.id)));
    assert!(harness.store.resume(resume.id).expect("lookup").is_some());

    dispatcher
        .handle(tap(SEEKER, &format!("confirm_delete_resume_{}", resume.id)))
        .await;
    assert!(harness.store.resume(resume.id).expect("lookup").is_none());
}

#[tokio::test]
async fn failed_upload_reoffers_the_skip_button() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();
    harness.resume_at_file_step(SEEKER);

    dispatcher
        .handle(event(
            SEEKER,
            EventPayload::File(document("vanished", "cv.pdf")),
        ))
        .await;

    let reply = harness.messenger.last_to(SEEKER);
    assert_eq!(reply.text(), views::attach_failed());
    assert!(reply
        .keyboard()
        .expect("skip button")
        .contains(CallbackAction::SkipFile));
}

#[tokio::test]
async fn unsupported_input_at_file_step_reoffers_the_skip_button() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();
    harness.resume_at_file_step(SEEKER);

    dispatcher
        .handle(event(SEEKER, EventPayload::Unsupported))
        .await;

    let reply = harness.messenger.last_to(SEEKER);
    assert_eq!(
        reply.text(),
        views::retry(Prompt::AttachFile(EntityKind::Resume))
    );
    assert!(reply
        .keyboard()
        .expect("skip button")
        .contains(CallbackAction::SkipFile));

    harness.messenger.clear();
    dispatcher
        .handle(event(OTHER, EventPayload::Unsupported))
        .await;
    let reply = harness.messenger.last_to(OTHER);
    assert_eq!(reply.text(), views::UNSUPPORTED_MESSAGE);
    assert!(reply.keyboard().is_none());
}

#[tokio::test]
async fn store_outage_is_reported_to_the_user() {
    let messenger = Arc::new(RecordingMessenger::default());
    let uploads = tempfile::tempdir().expect("uploads dir");
    let service = Arc::new(BoardService::new(
        Arc::new(UnavailableStore),
        Arc::clone(&messenger),
        Arc::new(AttachmentStore::new(uploads.path())),
    ));
    let dispatcher = Dispatcher::new(service);

    dispatcher.handle(event(SEEKER, EventPayload::Start)).await;

    let reply = messenger.last_to(SEEKER);
    assert_eq!(reply.text(), views::GENERIC_FAILURE);
    assert!(reply
        .keyboard()
        .expect("fallback menu")
        .contains(CallbackAction::ChooseJobSeeker));
}
