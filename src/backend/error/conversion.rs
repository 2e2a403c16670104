/**
 * Error Conversion
 *
 * `IntoResponse` for `ChatError`, so handlers can return it directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "success": false,
 *   "error": { "code": 404, "message": "Chat room g1 not found" }
 * }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::ChatError;

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        self.log_if_internal();

        let status = self.status_code();
        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": status.as_u16(),
                "message": self.message(),
            },
        });

        (status, Json(body)).into_response()
    }
}
