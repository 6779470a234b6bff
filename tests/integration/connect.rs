// tests/integration/connect.rs

use signdomen::directory::{ConnectionConfig, DirectoryClient, Transport};
use signdomen::error::ConnectionError;

use crate::support::MockConnector;

fn config() -> ConnectionConfig {
    ConnectionConfig {
        server: "dc.acme.local".to_string(),
        domain: "ACME".to_string(),
        base_dn: "DC=acme,DC=local".to_string(),
        username: "jdoe".to_string(),
        password: "P@ssw0rd".to_string(),
    }
}

#[tokio::test]
async fn stops_at_first_accepted_format() {
    // Принимается только третий формат: первые два пробуются и отклоняются
    let connector = MockConnector::accepting("jdoe@ACME", Transport::Plain);
    let client = DirectoryClient::new(&connector);
    client.connect(&config()).await.unwrap();

    assert_eq!(
        connector.attempts(),
        vec![
            ("ACME\\jdoe".to_string(), Transport::Plain),
            ("jdoe@dc.acme.local".to_string(), Transport::Plain),
            ("jdoe@ACME".to_string(), Transport::Plain),
        ]
    );
}

#[tokio::test]
async fn first_format_wins_without_further_attempts() {
    let connector = MockConnector::accepting("ACME\\jdoe", Transport::Plain);
    let client = DirectoryClient::new(&connector);
    client.connect(&config()).await.unwrap();

    assert_eq!(connector.attempts().len(), 1);
}

#[tokio::test]
async fn falls_back_to_ldaps_once() {
    let connector = MockConnector::accepting("ACME\\jdoe", Transport::Secure);
    let client = DirectoryClient::new(&connector);
    client.connect(&config()).await.unwrap();

    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 5);
    assert_eq!(attempts[4], ("ACME\\jdoe".to_string(), Transport::Secure));
}

#[tokio::test]
async fn aggregates_every_failure() {
    let connector = MockConnector::default();
    let client = DirectoryClient::new(&connector);

    match client.connect(&config()).await {
        Err(ConnectionError::Exhausted { server, attempts }) => {
            assert_eq!(server, "dc.acme.local");
            assert_eq!(attempts.len(), 5);
            assert!(attempts.iter().all(|a| a.reason == "invalid credentials"));
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("bind should fail"),
    }
}

#[tokio::test]
async fn empty_password_is_rejected_before_binding() {
    let connector = MockConnector::accepting("jdoe", Transport::Plain);
    let client = DirectoryClient::new(&connector);
    let mut cfg = config();
    cfg.password.clear();

    assert!(matches!(
        client.connect(&cfg).await,
        Err(ConnectionError::MissingPassword(user)) if user == "jdoe"
    ));
    assert!(connector.attempts().is_empty());
}
