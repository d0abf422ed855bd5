//! Integration tests for the browser session.
//!
//! These require a local Chrome/Chromium installation.
//! Run with: cargo test --test upload -- --ignored

use pixlift::canva::{CanvaSession, UploadTarget};
use pixlift::Credentials;

/// Check if a Chrome/Chromium binary is present.
fn chrome_available() -> bool {
    [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium-browser",
        "/usr/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ]
    .iter()
    .any(|path| std::path::Path::new(path).exists())
}

fn dummy_credentials() -> Credentials {
    Credentials {
        email: "nobody@example.com".into(),
        password: "not-a-real-password".into(),
    }
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_launch_screenshot_close() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    let success_shot = tmp.path().join("after_upload.png");
    let failure_shot = tmp.path().join("error.png");

    let session = CanvaSession::launch(dummy_credentials(), success_shot, false)
        .await
        .expect("Failed to launch browser");

    // The failure screenshot path is exercised without touching Canva: it
    // captures whatever page the session currently shows.
    session
        .capture_failure(&failure_shot)
        .await
        .expect("Failed to capture screenshot");

    let metadata = std::fs::metadata(&failure_shot).expect("Screenshot not written");
    assert!(metadata.len() > 0, "Screenshot file is empty");

    session.close().await;
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_sessions_are_isolated() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let tmp = tempfile::tempdir().expect("Failed to create temp dir");

    // Two sequential sessions must not share state; each launch gets a
    // fresh profile, so closing the first cannot break the second.
    for name in ["first.png", "second.png"] {
        let shot = tmp.path().join(name);
        let session = CanvaSession::launch(dummy_credentials(), shot.clone(), false)
            .await
            .expect("Failed to launch browser");
        session
            .capture_failure(&shot)
            .await
            .expect("Failed to capture screenshot");
        assert!(shot.exists());
        session.close().await;
    }
}
