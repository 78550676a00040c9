use crate::models::outcome::WriteOutcome;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// 受保护写入的 HTTP 表示：创建成功返回 201，被忽略返回 200 并附带原因
impl<T: Serialize> IntoResponse for WriteOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            WriteOutcome::Created(data) => (
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "created": true,
                    "data": data
                })),
            )
                .into_response(),
            WriteOutcome::Ignored(reason) => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "created": false,
                    "reason": reason
                })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outcome::IgnoreReason;

    #[test]
    fn test_outcome_status_codes() {
        let created = WriteOutcome::Created(json!({"id": "1"})).into_response();
        assert_eq!(created.status(), StatusCode::CREATED);

        let ignored: WriteOutcome<serde_json::Value> = WriteOutcome::Ignored(IgnoreReason::Duplicate);
        assert_eq!(ignored.into_response().status(), StatusCode::OK);
    }
}
