//! Feed visibility through the full service stack over the in-memory
//! store.

use domains::{DomainError, Target};
use integration_tests::{auth, seed_admin, seed_student, seed_teacher, test_state};
use services::notices::NoticeDraft;

fn draft(
    target: Target,
    department: Option<&str>,
    session: Option<&str>,
    section: Option<&str>,
) -> NoticeDraft {
    NoticeDraft {
        text: "notice".into(),
        category: "General".into(),
        target,
        department: department.map(Into::into),
        session: session.map(Into::into),
        section: section.map(Into::into),
        image: None,
    }
}

#[tokio::test]
async fn feeds_follow_the_role_rules() {
    let (state, store) = test_state();
    let admin = seed_admin(&store).await;
    let cse_teacher = seed_teacher(&store, "CSE").await;
    let eee_teacher = seed_teacher(&store, "EEE").await;
    let student = seed_student(&store, "CSE", "2022", "A").await;

    let author = auth(&cse_teacher);
    state
        .notices
        .create(draft(Target::All, None, None, None), &author)
        .await
        .unwrap();
    state
        .notices
        .create(draft(Target::Teachers, Some("CSE"), None, None), &author)
        .await
        .unwrap();
    state
        .notices
        .create(
            draft(Target::Students, Some("EEE"), Some("2021"), Some("B")),
            &author,
        )
        .await
        .unwrap();

    // Admin: everything.
    let feed = state.notices.get_visible(&auth(&admin), None).await.unwrap();
    assert_eq!(feed.len(), 3);

    // The authoring teacher: all three (the student notice is their own).
    let feed = state.notices.get_visible(&author, None).await.unwrap();
    assert_eq!(feed.len(), 3);

    // A teacher from another department: only the open target=all notice.
    let feed = state
        .notices
        .get_visible(&auth(&eee_teacher), None)
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].notice.target, Target::All);

    // The CSE student: the open notice, never the teachers one, and not
    // the student notice whose every dimension is foreign and closed.
    let feed = state
        .notices
        .get_visible(&auth(&student), None)
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].notice.target, Target::All);
}

#[tokio::test]
async fn create_clears_student_dimensions_for_other_targets() {
    let (state, store) = test_state();
    let teacher = seed_teacher(&store, "CSE").await;

    let notice = state
        .notices
        .create(
            draft(Target::Teachers, Some("CSE"), Some("2022"), Some("A")),
            &auth(&teacher),
        )
        .await
        .unwrap();
    assert_eq!(notice.session, None);
    assert_eq!(notice.section, None);
    assert_eq!(notice.department.as_deref(), Some("CSE"));
}

#[tokio::test]
async fn teacher_listing_is_admin_only() {
    let (state, store) = test_state();
    let teacher = seed_teacher(&store, "CSE").await;
    let admin = seed_admin(&store).await;

    state
        .notices
        .create(draft(Target::All, None, None, None), &auth(&teacher))
        .await
        .unwrap();

    let err = state
        .notices
        .list_teacher_notices(&auth(&teacher))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let listed = state
        .notices
        .list_teacher_notices(&auth(&admin))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn category_filter_composes_with_visibility() {
    let (state, store) = test_state();
    let teacher = seed_teacher(&store, "CSE").await;
    let student = seed_student(&store, "CSE", "2022", "A").await;

    let mut exams = draft(Target::Students, None, None, None);
    exams.category = "Exams".into();
    state.notices.create(exams, &auth(&teacher)).await.unwrap();
    let mut hidden = draft(Target::Teachers, None, None, None);
    hidden.category = "Exams".into();
    state.notices.create(hidden, &auth(&teacher)).await.unwrap();

    let feed = state
        .notices
        .get_visible(&auth(&student), Some("Exams"))
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);

    let feed = state
        .notices
        .get_visible(&auth(&student), Some("Sports"))
        .await
        .unwrap();
    assert!(feed.is_empty());
}
