//! Command dispatch: turns parsed arguments into service calls.

use std::path::PathBuf;

use domain::models::{
    CodeFilters, CreateCodeRequest, CreateMode, ExportOptions, UpdateCodeRequest,
};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::cli::{Command, CreateArgs, CreateCommand, ExportArgs, ListArgs, UpdateArgs};
use crate::error::ApiError;

/// Runs one command and returns its JSON result.
pub async fn run(
    command: Command,
    state: &AppState,
    operator: Option<&str>,
) -> Result<Value, ApiError> {
    match command {
        Command::Migrate => migrate(state).await,
        Command::List(args) => {
            let response = state.codes.list_codes(&list_filters(args)).await?;
            to_json(&response)
        }
        Command::Create(create) => {
            let result = state.codes.create_code(create_request(create)).await?;
            to_json(&result)
        }
        Command::Update(args) => {
            let id = args.id;
            let view = state.codes.update_code(id, update_request(args)).await?;
            to_json(&view)
        }
        Command::Delete { id } => {
            state.codes.delete_code(id).await?;
            Ok(json!({ "deleted": id }))
        }
        Command::Batches { limit } => {
            let batches = state.codes.list_recent_batches(limit).await?;
            to_json(&batches)
        }
        Command::Export(args) => export(state, args, &state.operator(operator)).await,
        Command::Dashboard => {
            let dashboard = state.codes.dashboard().await?;
            to_json(&dashboard)
        }
    }
}

async fn migrate(state: &AppState) -> Result<Value, ApiError> {
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&state.pool)
        .await?;
    info!("Migrations completed");
    Ok(json!({ "migrated": true }))
}

async fn export(state: &AppState, args: ExportArgs, operator: &str) -> Result<Value, ApiError> {
    let options = ExportOptions {
        content: args.content.into(),
        scope: args.scope.into(),
        batch_key: args.batch_key,
        range_start: args.range_start,
        range_end: args.range_end,
    };
    let file = state.codes.export_codes(&options, operator, args.format).await?;

    let path = args.output.unwrap_or_else(|| PathBuf::from(&file.file_name));
    tokio::fs::write(&path, &file.bytes).await?;

    Ok(json!({
        "path": path.display().to_string(),
        "content_type": file.content_type,
        "records": file.record_count,
        "bytes": file.bytes.len(),
    }))
}

pub fn list_filters(args: ListArgs) -> CodeFilters {
    CodeFilters {
        page: args.page,
        page_size: args.page_size,
        search: args.search,
        status: args.status,
        expires_from: args.expires_from,
        expires_to: args.expires_to,
    }
}

pub fn create_request(command: CreateCommand) -> CreateCodeRequest {
    let (mode, quantity, plain_code, common) = match command {
        CreateCommand::Random { quantity, common } => {
            (CreateMode::Random, Some(quantity), None, common)
        }
        CreateCommand::Custom { code, common } => (CreateMode::Custom, None, Some(code), common),
    };
    let CreateArgs {
        expires_at,
        max_uses,
        description,
    } = common;

    CreateCodeRequest {
        mode,
        quantity,
        plain_code,
        expires_at,
        max_uses,
        description,
    }
}

pub fn update_request(args: UpdateArgs) -> UpdateCodeRequest {
    UpdateCodeRequest {
        expires_at: args.expires_at,
        max_uses: args.max_uses,
        description: args.description,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize result: {}", e)))
}
