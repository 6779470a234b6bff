// tests/integration/search.rs

use signdomen::directory::{UserSearch, user_filter};
use signdomen::error::SearchError;

use crate::support::{MockSession, entry};

const BASE: &str = "OU=Milano,DC=acme,DC=local";
const ALT: &str = "OU=Users,OU=Milano,DC=acme,DC=local";

#[tokio::test]
async fn drops_entries_without_valid_email() {
    let mut session = MockSession::default().with_base(
        BASE,
        vec![
            entry("jdoe", Some("jdoe@acme.com")),
            entry("nomail", None),
            entry("blank", Some("   ")),
            entry("broken", Some("broken.acme.com")),
            entry("asmith", Some("asmith@acme.com")),
        ],
    );

    let users = UserSearch::new("Acme")
        .search(&mut session, BASE, &user_filter(""))
        .await
        .unwrap();

    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["jdoe", "asmith"]);
    assert!(users.iter().all(|u| u.company == "Acme"));
}

#[tokio::test]
async fn no_retry_when_primary_base_has_entries() {
    // Даже если все записи без email, повторного поиска нет
    let mut session = MockSession::default().with_base(BASE, vec![entry("nomail", None)]);

    let users = UserSearch::new("Acme")
        .search(&mut session, BASE, &user_filter(""))
        .await
        .unwrap();

    assert!(users.is_empty());
    assert_eq!(session.searched, vec![BASE]);
}

#[tokio::test]
async fn retries_alternate_base_exactly_once() {
    let mut session =
        MockSession::default().with_base(ALT, vec![entry("jdoe", Some("jdoe@acme.com"))]);

    let users = UserSearch::new("Acme")
        .search(&mut session, BASE, &user_filter(""))
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(session.searched, vec![BASE, ALT]);
}

#[tokio::test]
async fn empty_everywhere_is_not_an_error() {
    let mut session = MockSession::default();

    let users = UserSearch::new("Acme")
        .search(&mut session, BASE, &user_filter("doe"))
        .await
        .unwrap();

    assert!(users.is_empty());
    assert_eq!(session.searched.len(), 2);
}

#[tokio::test]
async fn rejected_search_is_surfaced() {
    let mut session = MockSession {
        reject: true,
        ..Default::default()
    };

    let err = UserSearch::new("Acme")
        .search(&mut session, BASE, &user_filter(""))
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::Rejected { rc: 50, .. }));
    assert_eq!(session.searched, vec![BASE]);
}
