// server/src/cli/handlers_user.rs
use std::str::FromStr;

use lib::commands::UserCommand;
use lib::services::accounts::{NewUser, UserUpdate};
use models::roles::Role;

use crate::cli::cli::{AppState, NOT_LOGGED_IN};

pub async fn handle_login(email: &str, password: &str, state: &AppState) -> String {
    match state.accounts.authenticate(email, password).await {
        Ok(ctx) => {
            let greeting = format!("Logged in as {} ({}).", ctx.full_name, ctx.role);
            *state.session.lock().await = Some(ctx);
            greeting
        }
        Err(e) => format!("Error: {}", e),
    }
}

pub async fn handle_logout(state: &AppState) -> String {
    let mut session = state.session.lock().await;
    match session.take() {
        Some(ctx) => format!("Logged out {}.", ctx.full_name),
        None => NOT_LOGGED_IN.to_string(),
    }
}

pub async fn handle_whoami(state: &AppState) -> String {
    match state.current_session().await {
        Some(ctx) => format!("{} ({})", ctx.full_name, ctx.role),
        None => "Not logged in.".to_string(),
    }
}

pub async fn handle_dashboard(state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };
    match state.dashboard.dashboard(&ctx).await {
        Ok(dashboard) => serde_json::to_string_pretty(&dashboard)
            .unwrap_or_else(|e| format!("Error: {}", e)),
        Err(e) => format!("Error: {}", e),
    }
}

pub async fn handle_user_command(action: UserCommand, state: &AppState) -> String {
    let Some(ctx) = state.current_session().await else {
        return NOT_LOGGED_IN.to_string();
    };

    match action {
        UserCommand::Register {
            email,
            password,
            first_name,
            last_name,
            role,
        } => {
            let role = match Role::from_str(&role) {
                Ok(role) => role,
                Err(e) => return format!("Error: {}", e),
            };
            state
                .accounts
                .register_user(
                    &ctx,
                    NewUser {
                        email,
                        password,
                        first_name,
                        last_name,
                        role,
                    },
                )
                .await
                .map(|user| format!("User {} has been registered successfully.", user.email))
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
        UserCommand::List => state
            .accounts
            .list_users(&ctx)
            .await
            .map(|users| {
                users
                    .iter()
                    .map(|u| {
                        format!(
                            "{:>4}  {:<30} {:<15} {}",
                            u.id,
                            u.email,
                            u.role,
                            if u.is_active { "active" } else { "inactive" }
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_else(|e| format!("Error: {}", e)),
        UserCommand::Update {
            user_id,
            email,
            first_name,
            last_name,
            role,
            password,
        } => {
            let role = match role.map(|r| Role::from_str(&r)).transpose() {
                Ok(role) => role,
                Err(e) => return format!("Error: {}", e),
            };
            state
                .accounts
                .update_user(
                    &ctx,
                    user_id,
                    UserUpdate {
                        email,
                        first_name,
                        last_name,
                        role,
                        is_active: None,
                        password,
                    },
                )
                .await
                .map(|_| "User updated successfully.".to_string())
                .unwrap_or_else(|e| format!("Error: {}", e))
        }
        UserCommand::Deactivate { user_id } => set_active(state, &ctx, user_id, false).await,
        UserCommand::Activate { user_id } => set_active(state, &ctx, user_id, true).await,
        UserCommand::Delete { user_id } => state
            .accounts
            .delete_user(&ctx, user_id)
            .await
            .map(|_| "User deleted successfully.".to_string())
            .unwrap_or_else(|e| format!("Error: {}", e)),
    }
}

async fn set_active(
    state: &AppState,
    ctx: &lib::access::AuthContext,
    user_id: i32,
    is_active: bool,
) -> String {
    state
        .accounts
        .update_user(
            ctx,
            user_id,
            UserUpdate {
                is_active: Some(is_active),
                ..Default::default()
            },
        )
        .await
        .map(|user| {
            format!(
                "User {} is now {}.",
                user.email,
                if is_active { "active" } else { "inactive" }
            )
        })
        .unwrap_or_else(|e| format!("Error: {}", e))
}
