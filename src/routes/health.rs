use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::db::tables;
use crate::AppState;

/// Liveness plus a read probe against the drills table
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.clone();
    let probe = tokio::task::spawn_blocking(move || -> crate::Result<()> {
        let read_txn = db.begin_read()?;
        read_txn.open_table(tables::DRILLS)?;
        Ok(())
    })
    .await;

    let database = match probe {
        Ok(Ok(())) => "connected",
        Ok(Err(e)) => {
            tracing::error!("Database probe failed: {}", e);
            "disconnected"
        }
        Err(e) => {
            tracing::error!("Database probe task failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
