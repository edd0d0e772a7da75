//! Security Tests for Camera Credentials
//!
//! The camera password must reach the capture binary and nothing else:
//! not logs, not debug output, not error messages.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thermocap::credentials::{REDACTED, SECRET_ENV_VAR, USER_ENV_VAR};
use thermocap::{handle_startup_error, CaptureSession, Credentials, Error};

const SECRET: &str = "s3cr3t-camera-pass";

fn session() -> CaptureSession {
    CaptureSession::new(
        "camera-pt-rgbt-mobotix",
        Credentials::new("admin", SECRET),
        PathBuf::from("/data"),
        1,
        Duration::from_secs(120),
    )
}

#[test]
fn test_debug_output_hides_secret() {
    let credentials = Credentials::new("admin", SECRET);
    let debug = format!("{:?}", credentials);
    assert!(debug.contains("admin"));
    assert!(!debug.contains(SECRET));
    assert!(debug.contains(REDACTED));

    let session_debug = format!("{:?}", session());
    assert!(!session_debug.contains(SECRET));
}

#[test]
fn test_logged_command_hides_secret() {
    let session = session();
    let logged = session.redacted_command(Path::new("/thermal-raw"));
    assert!(!logged.contains(SECRET));
    assert_eq!(
        logged,
        format!(
            "/thermal-raw --url camera-pt-rgbt-mobotix --user admin --password {} --dir /data",
            REDACTED
        )
    );

    // The real arguments still carry it
    assert!(session.command_args().iter().any(|arg| arg == SECRET));
}

#[test]
fn test_redact_scrubs_every_occurrence() {
    let credentials = Credentials::new("admin", SECRET);
    let text = format!("auth {} failed; retry with {}", SECRET, SECRET);
    let redacted = credentials.redact(&text);
    assert!(!redacted.contains(SECRET));
    assert_eq!(redacted.matches(REDACTED).count(), 2);
}

#[test]
fn test_environment_lookup() {
    // Env vars are process-global, so every case lives in this one test
    env::remove_var(USER_ENV_VAR);
    env::remove_var(SECRET_ENV_VAR);
    match Credentials::from_env() {
        Err(Error::MissingCredential { var }) => assert_eq!(var, USER_ENV_VAR),
        other => panic!("unexpected result: {other:?}"),
    }

    env::set_var(USER_ENV_VAR, "admin");
    match Credentials::from_env() {
        Err(Error::MissingCredential { var }) => assert_eq!(var, SECRET_ENV_VAR),
        other => panic!("unexpected result: {other:?}"),
    }

    env::set_var(SECRET_ENV_VAR, "");
    assert!(Credentials::from_env().is_err());

    env::set_var(SECRET_ENV_VAR, SECRET);
    let credentials = Credentials::from_env().unwrap();
    assert_eq!(credentials.user(), "admin");
    assert_eq!(credentials.expose_secret(), SECRET);

    env::remove_var(USER_ENV_VAR);
    env::remove_var(SECRET_ENV_VAR);
}

#[test]
fn test_missing_credential_message_names_variables_only() {
    let message = handle_startup_error(&Error::MissingCredential {
        var: SECRET_ENV_VAR.to_string(),
    });
    assert!(message.contains(SECRET_ENV_VAR));
    assert!(message.contains(USER_ENV_VAR));
}
