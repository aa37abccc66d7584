use crate::{
    auth::AuthUser,
    entities::store,
    errors::{ApiError, ServiceError},
    services::common::Page,
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has been deserialized and validated.
///
/// Malformed bodies are rejected with `INVALID_JSON`, rule violations with
/// `VALIDATION_FAILED`; both are 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest {
                message: rejection.body_text(),
                error_code: Some("INVALID_JSON".to_string()),
            })?;
        value
            .validate()
            .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))?;
        Ok(Self(value))
    }
}

/// Page bounds from the query, clamped to the configured limits.
pub fn page(state: &AppState, page: Option<u64>, limit: Option<u64>) -> Page {
    Page::new(
        page,
        limit,
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    )
}

pub fn paginated<T>(items: Vec<T>, total: u64, page: Page) -> PaginatedResponse<T> {
    PaginatedResponse {
        items,
        total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
    }
}

/// 201 with the standard envelope
pub fn created<T>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// The caller's store, which must be active for seller routes.
pub async fn seller_store(state: &AppState, user: &AuthUser) -> Result<store::Model, ServiceError> {
    state.services.stores.resolve_seller_store(user.user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 2))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(named) =
            ValidatedJson::<Named>::from_request(json_request(r#"{"name":"ok"}"#), &())
                .await
                .unwrap();
        assert_eq!(named.name, "ok");
    }

    #[tokio::test]
    async fn rejects_rule_violations_and_bad_json() {
        let err = ValidatedJson::<Named>::from_request(json_request(r#"{"name":"x"}"#), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err = ValidatedJson::<Named>::from_request(json_request("{"), &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }

    #[test]
    fn paginated_reports_total_pages() {
        let page = Page::new(Some(2), Some(10), 20, 100);
        let body = paginated(vec![1, 2, 3], 23, page);
        assert_eq!(body.total_pages, 3);
        assert_eq!(body.page, 2);
        assert_eq!(body.limit, 10);
    }
}
