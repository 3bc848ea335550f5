use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use authshell::identity::memory::InMemoryIdentity;
use authshell::AppShell;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if it exists
    let env_file_path = dotenvy::dotenv().ok();

    // Initialize the tracing subscriber for structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "authshell=debug,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!("authshell demo starting");
    match env_file_path {
        Some(path) => info!("loaded environment variables from {}", path.display()),
        None => info!("no .env file found, using existing environment variables"),
    }

    // A seeded in-process provider stands in for the remote identity service.
    let identity = Arc::new(InMemoryIdentity::new());
    identity.seed_user("a@b.com", "pw");

    let shell = AppShell::new(identity);
    let state = shell.initialize().await;
    info!(
        initializing = state.initializing,
        authenticated = state.is_authenticated(),
        "shell ready"
    );

    let guard = shell.guard();
    info!(decision = ?guard.evaluate(), "guard before sign-in");

    // A failed attempt surfaces the provider's message as a value.
    if let Err(e) = shell.credentials().sign_in("a@b.com", "wrong").await {
        warn!(error = %e, "sign-in rejected as expected");
    }

    match shell.credentials().sign_in("a@b.com", "pw").await {
        Ok(()) => info!("signed in"),
        Err(e) => warn!(error = %e, "sign-in failed"),
    }
    info!(decision = ?guard.evaluate(), "guard after sign-in");

    let headers = shell.decorator().decorate(&HashMap::new());
    info!(authorization = ?headers.get("Authorization"), "decorated request headers");

    if let Err(e) = shell.credentials().sign_out().await {
        warn!(error = %e, "sign-out failed");
    }
    info!(decision = ?guard.evaluate(), "guard after sign-out");

    shell.shutdown().await;
    info!("authshell demo finished");
}
