//! End-to-end lifecycle tests: bootstrap, sign-in, remote sign-out, and
//! teardown through the assembled shell.

use std::collections::HashMap;
use std::sync::Arc;

use authshell::identity::memory::InMemoryIdentity;
use authshell::{
    AppShell, GuardDecision, Principal, Session, ShellConfig, SignUpOutcome,
};

fn session_for(email: &str) -> Session {
    Session::new(
        format!("tok-{}", email),
        None,
        Principal {
            id: "u1".to_string(),
            email: email.to_string(),
        },
    )
}

#[tokio::test]
async fn bootstrap_without_session_redirects_protected_navigation() {
    let identity = Arc::new(InMemoryIdentity::new());
    let shell = AppShell::new(identity);

    let guard = shell.guard();
    let mut watcher = guard.watch();
    assert_eq!(watcher.decision(), GuardDecision::Loading);

    shell.initialize().await;

    let decision = watcher.changed().await;
    assert_eq!(decision, GuardDecision::Redirect("/auth".to_string()));
    assert_eq!(guard.evaluate(), GuardDecision::Redirect("/auth".to_string()));
}

#[tokio::test]
async fn bootstrap_restores_existing_session() {
    let identity = Arc::new(InMemoryIdentity::new());
    // A session established before this process started.
    identity.emit(Some(session_for("a@b.com"))).await;

    let shell = AppShell::new(identity);
    let state = shell.initialize().await;

    assert!(!state.initializing);
    assert_eq!(state.principal().unwrap().email, "a@b.com");
    assert_eq!(shell.guard().evaluate(), GuardDecision::Admit);
}

#[tokio::test]
async fn sign_in_sign_out_round_trip() {
    let identity = Arc::new(InMemoryIdentity::new());
    identity.seed_user("a@b.com", "pw");

    let shell = AppShell::new(identity);
    shell.initialize().await;

    let guard = shell.guard();
    assert_eq!(guard.evaluate(), GuardDecision::Redirect("/auth".to_string()));

    // The store is updated before the operation settles.
    shell.credentials().sign_in("a@b.com", "pw").await.unwrap();
    assert_eq!(
        shell.store().snapshot().principal().unwrap().email,
        "a@b.com"
    );
    assert_eq!(guard.evaluate(), GuardDecision::Admit);

    let headers = shell.decorator().decorate(&HashMap::new());
    let bearer = headers.get("Authorization").unwrap();
    assert!(bearer.starts_with("Bearer tok-"));

    // Sign-out drops the session; the decorator and guard follow.
    shell.credentials().sign_out().await.unwrap();
    assert!(shell.store().snapshot().session.is_none());
    let headers = shell.decorator().decorate(&HashMap::new());
    assert!(!headers.contains_key("Authorization"));
    assert_eq!(guard.evaluate(), GuardDecision::Redirect("/auth".to_string()));
}

#[tokio::test]
async fn remote_sign_out_reaches_the_guard() {
    let identity = Arc::new(InMemoryIdentity::new());
    identity.seed_user("a@b.com", "pw");

    let shell = AppShell::new(identity.clone());
    shell.initialize().await;
    shell.credentials().sign_in("a@b.com", "pw").await.unwrap();

    let guard = shell.guard();
    let mut watcher = guard.watch();
    assert_eq!(watcher.decision(), GuardDecision::Admit);

    // Signed out on another device: the provider notifies, the listener
    // replaces, the guard re-evaluates.
    identity.emit(None).await;
    assert_eq!(
        watcher.changed().await,
        GuardDecision::Redirect("/auth".to_string())
    );
}

#[tokio::test]
async fn notifications_after_shutdown_do_not_reach_the_store() {
    let identity = Arc::new(InMemoryIdentity::new());
    identity.seed_user("a@b.com", "pw");

    let shell = AppShell::new(identity.clone());
    shell.initialize().await;
    shell.credentials().sign_in("a@b.com", "pw").await.unwrap();

    shell.shutdown().await;
    // A late delivery is a no-op.
    identity.emit(None).await;

    assert_eq!(
        shell.store().snapshot().principal().unwrap().email,
        "a@b.com"
    );

    // Shutdown twice is fine.
    shell.shutdown().await;
}

#[tokio::test]
async fn sign_up_with_confirmation_then_sign_in() {
    let identity = Arc::new(InMemoryIdentity::with_confirmation_required());
    let shell = AppShell::with_config(
        identity.clone(),
        ShellConfig {
            sign_in_route: "/login".to_string(),
            ..ShellConfig::default()
        },
    );
    shell.initialize().await;

    let outcome = shell.credentials().sign_up("new@b.com", "pw").await.unwrap();
    assert_eq!(outcome, SignUpOutcome::ConfirmationPending);
    assert_eq!(
        shell.guard().evaluate(),
        GuardDecision::Redirect("/login".to_string())
    );

    identity.confirm_user("new@b.com");
    shell.credentials().sign_in("new@b.com", "pw").await.unwrap();
    assert_eq!(shell.guard().evaluate(), GuardDecision::Admit);
}
