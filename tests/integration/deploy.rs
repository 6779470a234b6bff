// tests/integration/deploy.rs

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use signdomen::deploy::{DeploymentWriter, NoRegistry, SignatureRegistry};
use signdomen::error::{RegistrationWarning, WriteError};
use signdomen::models::{CompanyInfo, UserRecord};
use signdomen::signature::{render_html, render_text};
use tempfile::TempDir;

fn user(username: &str) -> UserRecord {
    UserRecord {
        username: username.to_string(),
        display_name: format!("{} (Carton Group)", username),
        email: format!("{}@acme.com", username),
        phone: "+39 02 1234".to_string(),
        ..Default::default()
    }
}

fn company() -> CompanyInfo {
    CompanyInfo {
        name: "Acme Group".to_string(),
        ..Default::default()
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Запоминает имена подписей, может имитировать отказ
#[derive(Default)]
struct RecordingRegistry {
    registered: RefCell<Vec<String>>,
    fail: bool,
}

impl SignatureRegistry for RecordingRegistry {
    fn register_default(&self, signature_name: &str) -> Result<(), RegistrationWarning> {
        if self.fail {
            return Err(RegistrationWarning::Unsupported);
        }
        self.registered.borrow_mut().push(signature_name.to_string());
        Ok(())
    }
}

#[test]
fn profile_deployment_writes_two_sibling_files() {
    let root = TempDir::new().unwrap();
    let writer = DeploymentWriter::new(company(), root.path(), RecordingRegistry::default());

    let deployment = writer.deploy_to_profile(&user("jdoe"), None).unwrap();

    let folder = root
        .path()
        .join("jdoe")
        .join("AppData")
        .join("Roaming")
        .join("Microsoft")
        .join("Signatures");
    assert_eq!(file_names(&folder), ["Firma-Acme-Group.htm", "Firma-Acme-Group.txt"]);
    assert_eq!(
        deployment.html_path.with_extension(""),
        deployment.text_path.with_extension("")
    );
    assert!(deployment.registration_warning.is_none());

    let html = fs::read_to_string(&deployment.html_path).unwrap();
    assert_eq!(html, render_html(&user("jdoe"), &company()));
    let text = fs::read_to_string(&deployment.text_path).unwrap();
    assert_eq!(text, render_text(&user("jdoe"), &company()));
    assert!(text.starts_with("jdoe\n"));
}

#[test]
fn profile_deployment_honours_target_identity() {
    let root = TempDir::new().unwrap();
    let registry = RecordingRegistry::default();
    let writer = DeploymentWriter::new(company(), root.path(), registry);

    writer.deploy_to_profile(&user("jdoe"), Some("jane.doe")).unwrap();

    assert!(root.path().join("jane.doe").is_dir());
    assert!(!root.path().join("jdoe").exists());
}

#[test]
fn registration_failure_is_only_a_warning() {
    let root = TempDir::new().unwrap();
    let registry = RecordingRegistry {
        fail: true,
        ..Default::default()
    };
    let writer = DeploymentWriter::new(company(), root.path(), registry);

    let deployment = writer.deploy_to_profile(&user("jdoe"), None).unwrap();

    assert!(matches!(
        deployment.registration_warning,
        Some(RegistrationWarning::Unsupported)
    ));
    assert!(deployment.html_path.is_file());
    assert!(deployment.text_path.is_file());
}

#[test]
fn registers_signature_name() {
    let root = TempDir::new().unwrap();
    let registry = RecordingRegistry::default();
    let writer = DeploymentWriter::new(company(), root.path(), &registry);

    writer.deploy_to_profile(&user("jdoe"), None).unwrap();
    writer.deploy_to_profile(&user("asmith"), None).unwrap();

    assert_eq!(
        *registry.registered.borrow(),
        vec!["Firma-Acme-Group", "Firma-Acme-Group"]
    );
}

#[test]
fn export_creates_one_folder_per_user() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let writer = DeploymentWriter::new(company(), dir.path(), NoRegistry);
    let users = [user("jdoe"), user("asmith")];

    let report = writer.export_many(users.iter(), &out);

    assert_eq!(report.succeeded(), 2);
    for name in ["jdoe", "asmith"] {
        assert_eq!(file_names(&out.join(name)), ["firma.htm", "firma.txt"]);
    }
    assert_eq!(report.outcomes[0].0, "jdoe");
    assert_eq!(report.outcomes[0].1.as_ref().unwrap(), &out.join("jdoe"));
}

#[test]
fn one_bad_identity_does_not_stop_the_batch() {
    let root = TempDir::new().unwrap();
    let writer = DeploymentWriter::new(company(), root.path(), NoRegistry);
    let users = [user("jdoe"), user("../evil"), user("asmith")];

    let report = writer.deploy_many(users.iter());

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcomes[1].1,
        Err(WriteError::InvalidIdentity(_))
    ));
    assert!(root.path().join("asmith").is_dir());
}

#[test]
fn write_failure_is_reported_per_identity() {
    let dir = TempDir::new().unwrap();
    // Файл на месте папки экспорта
    let out = dir.path().join("out");
    fs::write(&out, "not a directory").unwrap();
    let writer = DeploymentWriter::new(company(), dir.path(), NoRegistry);

    let err = writer.export_to_folder(&user("jdoe"), &out).unwrap_err();
    assert!(matches!(err, WriteError::CreateDir { .. }));
}
