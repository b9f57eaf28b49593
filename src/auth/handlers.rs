use axum::http::StatusCode;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{present, ActionEnvelope, AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        password::{hash_in_background, verify_in_background, DUMMY_HASH},
        repo_types::NewUser,
    },
    error::{ApiError, StoreError},
    event::{HandlerEvent, HandlerResponse},
    state::AppState,
};

const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Entry point for the auth function: `POST {action: "register" | "login", ...}`.
#[instrument(
    skip(state, event),
    fields(method = %event.http_method, origin = event.header("origin").unwrap_or("-"))
)]
pub async fn handle(state: &AppState, event: HandlerEvent) -> HandlerResponse {
    match dispatch(state, &event).await {
        Ok(resp) => resp,
        Err(e) => {
            if e.status().is_client_error() {
                warn!(error = %e, kind = e.kind(), "auth request rejected");
            }
            e.into_handler_response()
        }
    }
}

async fn dispatch(state: &AppState, event: &HandlerEvent) -> Result<HandlerResponse, ApiError> {
    match event.method().as_str() {
        "OPTIONS" => return Ok(HandlerResponse::preflight(ALLOWED_METHODS)),
        "POST" => {}
        _ => return Err(ApiError::MethodNotAllowed),
    }

    let body: Value = event.json_body()?;
    let envelope: ActionEnvelope = decode(body.clone())?;

    let user = match envelope.action.as_deref() {
        Some("register") => register(state, decode(body)?).await?,
        Some("login") => login(state, decode(body)?).await?,
        _ => return Err(ApiError::UnknownAction),
    };

    Ok(HandlerResponse::json(
        StatusCode::OK,
        &AuthResponse { success: true, user },
    ))
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Validation(format!("invalid request: {e}")))
}

pub async fn register(state: &AppState, payload: RegisterRequest) -> Result<PublicUser, ApiError> {
    let (Some(email), Some(password), Some(full_name)) = (
        present(payload.email),
        present(payload.password),
        present(payload.full_name),
    ) else {
        return Err(ApiError::Validation(
            "email, password and full_name are required".into(),
        ));
    };

    let password_hash = hash_in_background(password).await?;

    let new = NewUser {
        email,
        password_hash,
        full_name,
        phone: payload.phone.unwrap_or_default(),
        is_seller: payload.is_seller.unwrap_or(false),
    };

    let user = match state.store.create_user(new).await {
        Ok(u) => u,
        Err(StoreError::UniqueViolation) => {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, email = %user.email, is_seller = user.is_seller, "user registered");
    Ok(user.into())
}

pub async fn login(state: &AppState, payload: LoginRequest) -> Result<PublicUser, ApiError> {
    let (Some(email), Some(password)) = (present(payload.email), present(payload.password)) else {
        return Err(ApiError::Validation("email and password are required".into()));
    };

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        // Pay the same Argon2 cost as a real mismatch.
        let _ = verify_in_background(password, DUMMY_HASH.to_string()).await;
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Authentication);
    };

    let ok = match verify_in_background(password, user.password_hash.clone()).await {
        Ok(v) => v,
        Err(ApiError::Credential(detail)) => {
            warn!(user_id = user.id, error = %detail, "stored hash unreadable");
            false
        }
        Err(e) => return Err(e),
    };

    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Authentication);
    }

    info!(user_id = user.id, "user logged in");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(body: Value) -> HandlerEvent {
        HandlerEvent::new("POST", Some(body.to_string()))
    }

    fn body_of(resp: &HandlerResponse) -> Value {
        serde_json::from_str(&resp.body).unwrap()
    }

    #[tokio::test]
    async fn register_returns_public_fields_only() {
        let state = AppState::memory();
        let resp = handle(
            &state,
            post(json!({"action": "register", "email": "a@b.com", "password": "x", "full_name": "A"})),
        )
        .await;
        assert_eq!(resp.status_code, 200);
        let body = body_of(&resp);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], "a@b.com");
        assert_eq!(body["user"]["full_name"], "A");
        assert_eq!(body["user"]["is_seller"], false);
        assert!(body["user"]["id"].is_i64());
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("password_hash").is_none());
        assert!(!resp.body.contains("argon2"));
        assert_eq!(resp.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[tokio::test]
    async fn register_then_login_and_wrong_password() {
        let state = AppState::memory();
        handle(
            &state,
            post(json!({"action": "register", "email": "a@b.com", "password": "x", "full_name": "A", "is_seller": true})),
        )
        .await;

        let ok = handle(&state, post(json!({"action": "login", "email": "a@b.com", "password": "x"}))).await;
        assert_eq!(ok.status_code, 200);
        assert_eq!(body_of(&ok)["user"]["is_seller"], true);

        let bad = handle(&state, post(json!({"action": "login", "email": "a@b.com", "password": "wrong"}))).await;
        assert_eq!(bad.status_code, 401);
        let unknown = handle(&state, post(json!({"action": "login", "email": "z@b.com", "password": "x"}))).await;
        assert_eq!(unknown.status_code, 401);
        // Same message whether the email or the password was wrong.
        assert_eq!(body_of(&bad)["error"], body_of(&unknown)["error"]);
        assert!(body_of(&bad)["error"].is_string());
    }

    #[tokio::test]
    async fn register_requires_fields() {
        let state = AppState::memory();
        for body in [
            json!({"action": "register", "password": "x", "full_name": "A"}),
            json!({"action": "register", "email": "", "password": "x", "full_name": "A"}),
            json!({"action": "register", "email": "a@b.com", "full_name": "A"}),
            json!({"action": "register", "email": "a@b.com", "password": "x", "full_name": null}),
        ] {
            let resp = handle(&state, post(body)).await;
            assert_eq!(resp.status_code, 400);
            assert_eq!(body_of(&resp)["kind"], "validation");
        }
    }

    #[tokio::test]
    async fn legacy_digest_row_gets_generic_401() {
        let state = AppState::memory();
        state
            .store
            .create_user(NewUser {
                email: "old@b.com".into(),
                password_hash: "2d711642b726b04401627ca9fbac32f5c8530fb1903cc4db02258717921a4881".into(),
                full_name: "Old".into(),
                phone: String::new(),
                is_seller: false,
            })
            .await
            .unwrap();
        let resp = handle(&state, post(json!({"action": "login", "email": "old@b.com", "password": "x"}))).await;
        assert_eq!(resp.status_code, 401);
        assert_eq!(body_of(&resp)["kind"], "authentication");
    }

    #[tokio::test]
    async fn login_requires_fields() {
        let state = AppState::memory();
        let resp = handle(&state, post(json!({"action": "login", "email": "a@b.com"}))).await;
        assert_eq!(resp.status_code, 400);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = AppState::memory();
        let body = json!({"action": "register", "email": "d@b.com", "password": "x", "full_name": "D"});
        assert_eq!(handle(&state, post(body.clone())).await.status_code, 200);
        let resp = handle(&state, post(body)).await;
        assert_eq!(resp.status_code, 409);
        assert_eq!(body_of(&resp)["kind"], "conflict");
        assert_eq!(body_of(&resp)["error"], "Email already registered");
    }

    #[tokio::test]
    async fn concurrent_registration_has_one_winner() {
        let state = AppState::memory();
        let body = json!({"action": "register", "email": "race@b.com", "password": "x", "full_name": "R"});
        let (a, b) = tokio::join!(
            handle(&state, post(body.clone())),
            handle(&state, post(body.clone())),
        );
        let mut codes = [a.status_code, b.status_code];
        codes.sort_unstable();
        assert_eq!(codes, [200, 409]);
    }

    #[tokio::test]
    async fn unknown_action_and_methods() {
        let state = AppState::memory();
        let resp = handle(&state, post(json!({"action": "delete"}))).await;
        assert_eq!(resp.status_code, 400);
        assert_eq!(body_of(&resp)["kind"], "unknown_action");

        let resp = handle(&state, post(json!({}))).await;
        assert_eq!(resp.status_code, 400);

        let resp = handle(&state, HandlerEvent::new("GET", None)).await;
        assert_eq!(resp.status_code, 405);
        assert_eq!(body_of(&resp)["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn options_is_an_empty_preflight() {
        let state = AppState::memory();
        let resp = handle(&state, HandlerEvent::new("OPTIONS", Some("garbage".into()))).await;
        assert_eq!(resp.status_code, 200);
        assert!(resp.body.is_empty());
        assert_eq!(resp.header("Access-Control-Allow-Methods"), Some(ALLOWED_METHODS));
    }

    #[test]
    fn public_user_serialization() {
        let user = PublicUser {
            id: 7,
            email: "test@example.com".to_string(),
            full_name: "Test".to_string(),
            is_seller: false,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}
