use axum::Json;
use serde::Serialize;

pub const API_CODE_OK: i32 = 0;
pub const API_CODE_BAD_REQUEST: i32 = 40000;
pub const API_CODE_ERROR: i32 = 50000;

fn code_message(code: i32) -> &'static str {
    match code {
        API_CODE_OK => "ok",
        API_CODE_BAD_REQUEST => "bad request",
        _ => "error",
    }
}

/// Generic response envelope. Business responses always use HTTP 200; the
/// `code` field carries the outcome. Error detail travels in `data`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: API_CODE_OK,
        message: code_message(API_CODE_OK).to_string(),
        data,
    })
}

pub fn error(code: i32, detail: impl Into<String>) -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        code,
        message: code_message(code).to_string(),
        data: detail.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let response = ok(serde_json::json!({"status": "ok"}));
        assert_eq!(response.code, API_CODE_OK);
        assert_eq!(response.message, "ok");

        let response = error(API_CODE_BAD_REQUEST, "missing user_id");
        assert_eq!(response.code, API_CODE_BAD_REQUEST);
        assert_eq!(response.message, "bad request");
        assert_eq!(response.data, "missing user_id");

        let response = error(API_CODE_ERROR, "boom");
        assert_eq!(response.message, "error");
    }
}
