use axum::{body::Bytes, extract::State, Json};
use chrono::Local;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::registro::Registro;
use crate::AppState;

pub const SAVED_MESSAGE: &str = "Registro guardado con éxito";

/// `POST /guardar_registro`: append one submission to the spreadsheet.
///
/// The body is parsed here rather than through the `Json` extractor so that
/// malformed input takes the same 500 path as a failed append.
pub async fn guardar_registro(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let payload: Value = serde_json::from_slice(&body)?;
    let fields = payload.as_object().ok_or(AppError::NotAnObject)?;

    let registro = Registro::from_submission(fields, Local::now().naive_local());
    let usuario = registro.field("usuario_nombre").unwrap_or_default().to_string();
    let ejercicio = registro.field("ejercicio").unwrap_or_default().to_string();
    let serie = registro.field("serie").unwrap_or_default().to_string();
    let recorded_at = registro.timestamp().to_string();

    state.sink.append_row(registro.into_row()).await?;

    tracing::info!(
        usuario_nombre = %usuario,
        ejercicio = %ejercicio,
        serie = %serie,
        recorded_at = %recorded_at,
        "Record saved"
    );

    Ok(Json(json!({ "message": SAVED_MESSAGE })))
}
