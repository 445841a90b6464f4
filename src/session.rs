//! Login and logout against the backend.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use crate::context::Context;

/// `Basic base64(username:token)`, with both parts trimmed.
pub fn basic_auth_header(username: &str, token: &str) -> String {
    let raw = format!("{}:{}", username.trim(), token.trim());
    format!("Basic {}", B64.encode(raw))
}

/// Validate the credentials; only a `valid` status counts as logged in.
pub async fn login(ctx: &Context, username: &str, token: &str) -> bool {
    let header = basic_auth_header(username, token);
    let _busy = ctx.busy();
    match ctx.backend.validate_credentials(&header).await {
        Ok(status) if status.is_valid() => {
            tracing::info!(user = %username.trim(), "logged in");
            ctx.notifier
                .success(&format!("Logged in as {}.", username.trim()));
            true
        }
        Ok(status) => {
            tracing::info!(status = %status.status, "credentials rejected");
            ctx.notifier.error(
                "Invalid credentials. The provided username or access token is incorrect.",
            );
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "credential validation failed");
            ctx.notifier
                .error(&format!("Invalid credentials. {}", e));
            false
        }
    }
}

/// `true` while the backend still accepts the current session.
pub async fn check_session(ctx: &Context) -> bool {
    match ctx.backend.check_auth_token().await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "session check failed");
            false
        }
    }
}

/// End the session. A failed logout request is only logged.
pub async fn logout(ctx: &Context) {
    let _busy = ctx.busy();
    if let Err(e) = ctx.backend.logout().await {
        tracing::error!(error = %e, "logout failed");
    }
    ctx.notifier.info("Logged out.");
}
