//! Workflow and HTTP tests for the auth crate, run against the in-memory store

#[cfg(test)]
mod support {
    use std::sync::Arc;

    use crate::application::config::AuthConfig;
    use crate::application::{SignInInput, SignInUseCase, SignUpInput, SignUpOutput, SignUpUseCase};
    use crate::application::token::TokenPair;
    use crate::infra::memory::InMemoryAuthRepository;

    pub const SECRET: &[u8] = b"auth-tests-signing-secret-32byte";

    pub fn config() -> Arc<AuthConfig> {
        Arc::new(AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::with_secret(SECRET.to_vec())
        })
    }

    pub fn repo() -> Arc<InMemoryAuthRepository> {
        Arc::new(InMemoryAuthRepository::new())
    }

    pub async fn register(
        repo: &Arc<InMemoryAuthRepository>,
        user_name: &str,
        email: &str,
        password: &str,
    ) -> crate::AuthResult<SignUpOutput> {
        SignUpUseCase::new(repo.clone(), repo.clone(), config())
            .execute(SignUpInput {
                user_name: user_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                user_agent: Some("test-agent".to_string()),
            })
            .await
    }

    pub async fn login(
        repo: &Arc<InMemoryAuthRepository>,
        email: &str,
        password: &str,
    ) -> crate::AuthResult<TokenPair> {
        SignInUseCase::new(repo.clone(), repo.clone(), config())
            .execute(SignInInput {
                email: email.to_string(),
                password: password.to_string(),
                user_agent: None,
            })
            .await
    }
}

#[cfg(test)]
mod sign_up_tests {
    use super::support::*;
    use crate::application::token::TokenService;
    use crate::domain::repository::SessionRepository;
    use crate::domain::value_object::user_role::Role;
    use crate::error::AuthError;
    use crate::infra::memory::InMemoryAuthRepository;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_registration_issues_tokens_bound_to_new_user() {
        let repo = repo();
        let output = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();

        assert!(!output.tokens.access_token.is_empty());
        assert!(!output.tokens.refresh_token.is_empty());

        let tokens = TokenService::new(config());
        let payload = tokens.verify_access(&output.tokens.access_token).unwrap();
        assert_eq!(payload.user_id, output.user_id);
        assert_eq!(payload.user_name, "Admin");
        assert!(payload.roles.contains(Role::User));
        assert!(!payload.roles.contains(Role::Admin));

        let sessions = repo.find_all_for_user(&output.user_id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].refresh_token, output.tokens.refresh_token);
        assert_eq!(sessions[0].user_agent.as_deref(), Some("test-agent"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_without_writes() {
        let repo = repo();
        register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();

        let result = register(&repo, "Someone", "ADMIN@mail.ru", "OtherPass").await;

        assert!(matches!(result, Err(AuthError::DuplicateEmail)));
        assert_eq!(repo.user_count().await, 1);
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_user_name_ignores_case() {
        let repo = repo();
        register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();

        let result = register(&repo, "admin", "other@mail.ru", "AdminPass").await;
        assert!(matches!(result, Err(AuthError::DuplicateUserName)));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_store() {
        let repo = repo();

        let cases = [
            ("ab", "admin@mail.ru", "AdminPass"),
            ("Admin", "not-an-email", "AdminPass"),
            ("Admin", "admin@mail.ru", "abc"),
            ("Admin", "admin@mail.ru", "    "),
        ];
        for (name, email, password) in cases {
            let result = register(&repo, name, email, password).await;
            assert!(
                matches!(result, Err(AuthError::Validation(_))),
                "{name}/{email} should fail validation"
            );
        }

        assert_eq!(repo.user_count().await, 0);
        assert_eq!(repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_default_role_is_internal_error() {
        let repo = Arc::new(InMemoryAuthRepository::with_roles(vec![Role::Admin]));
        let result = register(&repo, "Admin", "admin@mail.ru", "AdminPass").await;

        assert!(matches!(result, Err(AuthError::Internal(_))));
        assert_eq!(repo.user_count().await, 0);
    }
}

#[cfg(test)]
mod sign_in_tests {
    use super::support::*;
    use crate::domain::repository::SessionRepository;
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_login_issues_fresh_refresh_tokens() {
        let repo = repo();
        let signed_up = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();

        let first = login(&repo, "admin@mail.ru", "AdminPass").await.unwrap();
        let second = login(&repo, "Admin@Mail.ru", "AdminPass").await.unwrap();

        assert_ne!(first.refresh_token, signed_up.tokens.refresh_token);
        assert_ne!(first.refresh_token, second.refresh_token);

        // Earlier sessions survive (multi-device)
        let sessions = repo.find_all_for_user(&signed_up.user_id).await.unwrap();
        assert_eq!(sessions.len(), 3);
    }

    #[tokio::test]
    async fn test_wrong_password_issues_nothing() {
        let repo = repo();
        register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();

        let result = login(&repo, "admin@mail.ru", "WrongPass").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_email_is_not_found() {
        let repo = repo();
        let result = login(&repo, "nobody@mail.ru", "AdminPass").await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_empty_password_is_validation_error() {
        let repo = repo();
        register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();

        let result = login(&repo, "admin@mail.ru", "").await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }
}

#[cfg(test)]
mod refresh_tests {
    use super::support::*;
    use crate::application::token::{RefreshClaims, TokenService, TokenType};
    use crate::application::{RefreshInput, RefreshUseCase, SignOutUseCase};
    use crate::domain::repository::SessionRepository;
    use crate::domain::value_object::user_id::UserId;
    use crate::error::AuthError;
    use crate::infra::memory::InMemoryAuthRepository;
    use std::sync::Arc;

    async fn refresh(
        repo: &Arc<InMemoryAuthRepository>,
        token: &str,
    ) -> crate::AuthResult<crate::application::TokenPair> {
        RefreshUseCase::new(repo.clone(), repo.clone(), config())
            .execute(RefreshInput {
                refresh_token: token.to_string(),
                user_agent: Some("refresh-agent".to_string()),
            })
            .await
    }

    async fn logout(repo: &Arc<InMemoryAuthRepository>, token: &str) -> crate::AuthResult<u64> {
        SignOutUseCase::new(repo.clone(), config())
            .execute(token)
            .await
    }

    #[tokio::test]
    async fn test_rotation_is_single_use() {
        let repo = repo();
        let r1 = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap()
            .tokens
            .refresh_token;

        let r2 = refresh(&repo, &r1).await.unwrap().refresh_token;
        assert_ne!(r1, r2);

        let reused = refresh(&repo, &r1).await;
        assert!(matches!(reused, Err(AuthError::SessionMismatch)));

        let r3 = refresh(&repo, &r2).await.unwrap().refresh_token;
        assert_ne!(r2, r3);
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_rotation_keeps_session_and_updates_user_agent() {
        let repo = repo();
        let signed_up = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();
        let before = repo.find_all_for_user(&signed_up.user_id).await.unwrap();

        let pair = refresh(&repo, &signed_up.tokens.refresh_token).await.unwrap();

        let after = repo.find_by_token(&pair.refresh_token).await.unwrap().unwrap();
        assert_eq!(after.session_id, before[0].session_id);
        assert_eq!(after.user_agent.as_deref(), Some("refresh-agent"));

        let payload = TokenService::new(config())
            .verify_access(&pair.access_token)
            .unwrap();
        assert_eq!(payload.user_id, signed_up.user_id);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_one_winner() {
        let repo = repo();
        let r1 = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap()
            .tokens
            .refresh_token;

        let (a, b) = tokio::join!(refresh(&repo, &r1), refresh(&repo, &r1));

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert!(
            matches!(a, Err(AuthError::SessionMismatch)) || matches!(b, Err(AuthError::SessionMismatch))
        );
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let repo = repo();
        let tokens = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap()
            .tokens;

        let result = refresh(&repo, &tokens.access_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let repo = repo();
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: UserId::new().to_string(),
            nonce: "expired".to_string(),
            typ: TokenType::Refresh,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let result = refresh(&repo, &token).await;
        assert!(matches!(result, Err(AuthError::ExpiredToken)));
    }

    #[tokio::test]
    async fn test_refresh_for_unknown_user() {
        let repo = repo();
        let token = TokenService::new(config())
            .issue_refresh_token(&UserId::new())
            .unwrap();

        let result = refresh(&repo, &token).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_logout_blocks_refresh() {
        let repo = repo();
        let signed_up = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();
        login(&repo, "admin@mail.ru", "AdminPass").await.unwrap();

        let r = signed_up.tokens.refresh_token;
        assert_eq!(logout(&repo, &r).await.unwrap(), 2);

        assert!(matches!(
            refresh(&repo, &r).await,
            Err(AuthError::SessionMismatch)
        ));
        assert_eq!(repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_logout_with_stale_token_is_rejected() {
        let repo = repo();
        let r1 = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap()
            .tokens
            .refresh_token;
        let r2 = refresh(&repo, &r1).await.unwrap().refresh_token;

        assert!(matches!(
            logout(&repo, &r1).await,
            Err(AuthError::SessionMismatch)
        ));
        // The live session is untouched
        assert!(refresh(&repo, &r2).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_with_garbage_is_invalid_token() {
        let repo = repo();
        assert!(matches!(
            logout(&repo, "garbage").await,
            Err(AuthError::InvalidToken)
        ));
    }
}

#[cfg(test)]
mod profile_tests {
    use super::support::*;
    use crate::application::{ProfileUpdateInput, ProfileUseCase};
    use crate::domain::value_object::user_id::UserId;
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_get_profile() {
        let repo = repo();
        let signed_up = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();

        let profile = ProfileUseCase::new(repo.clone());
        let user = profile.get(&signed_up.user_id).await.unwrap();
        assert_eq!(user.email.as_str(), "admin@mail.ru");

        assert!(matches!(
            profile.get(&UserId::new()).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_rules() {
        let repo = repo();
        let admin = register(&repo, "Admin", "admin@mail.ru", "AdminPass")
            .await
            .unwrap();
        register(&repo, "Bob", "bob@mail.ru", "BobPass1")
            .await
            .unwrap();
        let profile = ProfileUseCase::new(repo.clone());

        let same_email = profile
            .update(
                &admin.user_id,
                ProfileUpdateInput {
                    email: Some("admin@mail.ru".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(same_email, Err(AuthError::Validation(_))));

        let taken_email = profile
            .update(
                &admin.user_id,
                ProfileUpdateInput {
                    email: Some("bob@mail.ru".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken_email, Err(AuthError::DuplicateEmail)));

        let taken_name = profile
            .update(
                &admin.user_id,
                ProfileUpdateInput {
                    user_name: Some("BOB".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(taken_name, Err(AuthError::DuplicateUserName)));

        // Changing only the case of one's own name is allowed
        let updated = profile
            .update(
                &admin.user_id,
                ProfileUpdateInput {
                    user_name: Some("ADMIN".to_string()),
                    avatar_url: Some("https://cdn.example.com/admin.png".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.user_name.original(), "ADMIN");
        assert_eq!(
            updated.avatar_url.as_deref(),
            Some("https://cdn.example.com/admin.png")
        );
    }
}

#[cfg(test)]
mod sessions_tests {
    use super::support::*;
    use crate::application::SessionsUseCase;
    use crate::domain::value_object::{
        user_id::UserId,
        user_role::{Role, RoleSet},
    };
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_list_and_revoke() {
        let repo = repo();
        let bob = register(&repo, "Bob", "bob@mail.ru", "BobPass1")
            .await
            .unwrap();
        login(&repo, "bob@mail.ru", "BobPass1").await.unwrap();

        let sessions = SessionsUseCase::new(repo.clone(), repo.clone());
        assert_eq!(sessions.list(&bob.user_id).await.unwrap().len(), 2);

        let user_roles = RoleSet::single(Role::User);
        assert!(matches!(
            sessions.revoke_user(&user_roles, &bob.user_id).await,
            Err(AuthError::Forbidden)
        ));

        let admin_roles: RoleSet = [Role::User, Role::Admin].into_iter().collect();
        assert!(matches!(
            sessions.revoke_user(&admin_roles, &UserId::new()).await,
            Err(AuthError::UserNotFound)
        ));
        assert_eq!(sessions.revoke_user(&admin_roles, &bob.user_id).await.unwrap(), 2);
        assert!(sessions.list(&bob.user_id).await.unwrap().is_empty());
    }
}

#[cfg(test)]
mod http_tests {
    use super::support::*;
    use crate::domain::entity::user::UserPatch;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::user_role::{Role, RoleSet};
    use crate::infra::memory::InMemoryAuthRepository;
    use crate::presentation::dto::{ProfileResponse, TokenResponse};
    use crate::presentation::router::auth_router_generic;
    use crate::application::token::TokenService;
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(repo: &InMemoryAuthRepository) -> Router {
        Router::new().nest(
            "/auth",
            auth_router_generic(repo.clone(), (*config()).clone()),
        )
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, "http-test")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn bearer_request(method: Method, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_admin(app: &Router) -> TokenResponse {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/registration",
                json!({"username": "Admin", "email": "admin@mail.ru", "password": "AdminPass"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        serde_json::from_value(body_json(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_registration_then_duplicate_is_conflict() {
        let repo = InMemoryAuthRepository::new();
        let app = app(&repo);

        let tokens = register_admin(&app).await;
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/registration",
                json!({"username": "Other", "email": "admin@mail.ru", "password": "AdminPass"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let problem = body_json(response).await;
        assert_eq!(problem["status"], 409);
        assert_eq!(problem["detail"], "Email is already registered");
    }

    #[tokio::test]
    async fn test_login_status_codes() {
        let repo = InMemoryAuthRepository::new();
        let app = app(&repo);
        register_admin(&app).await;

        let ok = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                json!({"email": "admin@mail.ru", "password": "AdminPass"}),
            ))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let body = body_json(ok).await;
        assert!(body["accessToken"].is_string());
        assert!(body["refreshToken"].is_string());

        let bad_password = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                json!({"email": "admin@mail.ru", "password": "nope"}),
            ))
            .await
            .unwrap();
        assert_eq!(bad_password.status(), StatusCode::BAD_REQUEST);

        let unknown = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                json!({"email": "ghost@mail.ru", "password": "AdminPass"}),
            ))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_accepts_patch_and_post_and_logout_revokes() {
        let repo = InMemoryAuthRepository::new();
        let app = app(&repo);
        let tokens = register_admin(&app).await;

        let patched = app
            .clone()
            .oneshot(json_request(
                Method::PATCH,
                "/auth/refresh",
                json!({"refresh": tokens.refresh_token}),
            ))
            .await
            .unwrap();
        assert_eq!(patched.status(), StatusCode::OK);
        let rotated: TokenResponse = serde_json::from_value(body_json(patched).await).unwrap();

        // The old token was rotated away
        let reused = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/refresh",
                json!({"refresh": tokens.refresh_token}),
            ))
            .await
            .unwrap();
        assert_eq!(reused.status(), StatusCode::FORBIDDEN);

        let posted = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/refresh",
                json!({"refresh": rotated.refresh_token}),
            ))
            .await
            .unwrap();
        assert_eq!(posted.status(), StatusCode::OK);
        let latest: TokenResponse = serde_json::from_value(body_json(posted).await).unwrap();

        let logout = app
            .clone()
            .oneshot(json_request(
                Method::DELETE,
                "/auth/logout",
                json!({"refresh": latest.refresh_token}),
            ))
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::OK);
        assert!(body_json(logout).await["message"].is_string());

        let after_logout = app
            .clone()
            .oneshot(json_request(
                Method::PATCH,
                "/auth/refresh",
                json!({"refresh": latest.refresh_token}),
            ))
            .await
            .unwrap();
        assert_eq!(after_logout.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_me_requires_bearer_token() {
        let repo = InMemoryAuthRepository::new();
        let app = app(&repo);
        let tokens = register_admin(&app).await;

        let anonymous = app
            .clone()
            .oneshot(Request::get("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let forged = app
            .clone()
            .oneshot(bearer_request(Method::GET, "/auth/me", "not.a.token", None))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

        // Refresh tokens do not authorize requests
        let wrong_type = app
            .clone()
            .oneshot(bearer_request(Method::GET, "/auth/me", &tokens.refresh_token, None))
            .await
            .unwrap();
        assert_eq!(wrong_type.status(), StatusCode::UNAUTHORIZED);

        let ok = app
            .clone()
            .oneshot(bearer_request(Method::GET, "/auth/me", &tokens.access_token, None))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let profile: ProfileResponse = serde_json::from_value(body_json(ok).await).unwrap();
        assert_eq!(profile.username, "Admin");
        assert_eq!(profile.email, "admin@mail.ru");
        assert_eq!(profile.roles, vec!["USER"]);
    }

    #[tokio::test]
    async fn test_update_me() {
        let repo = InMemoryAuthRepository::new();
        let app = app(&repo);
        let tokens = register_admin(&app).await;

        let same = app
            .clone()
            .oneshot(bearer_request(
                Method::PATCH,
                "/auth/me",
                &tokens.access_token,
                Some(json!({"email": "admin@mail.ru"})),
            ))
            .await
            .unwrap();
        assert_eq!(same.status(), StatusCode::BAD_REQUEST);

        let changed = app
            .clone()
            .oneshot(bearer_request(
                Method::PATCH,
                "/auth/me",
                &tokens.access_token,
                Some(json!({"email": "root@mail.ru", "avatarUrl": "https://cdn.example.com/a.png"})),
            ))
            .await
            .unwrap();
        assert_eq!(changed.status(), StatusCode::OK);
        let profile: ProfileResponse = serde_json::from_value(body_json(changed).await).unwrap();
        assert_eq!(profile.email, "root@mail.ru");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[tokio::test]
    async fn test_sessions_listing_hides_tokens() {
        let repo = InMemoryAuthRepository::new();
        let app = app(&repo);
        let tokens = register_admin(&app).await;

        let response = app
            .clone()
            .oneshot(bearer_request(Method::GET, "/auth/sessions", &tokens.access_token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let sessions = body.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["userAgent"], "http-test");
        assert!(!body.to_string().contains(&tokens.refresh_token));
    }

    #[tokio::test]
    async fn test_admin_route_checks_role() {
        let repo = InMemoryAuthRepository::new();
        let app = app(&repo);
        let admin_tokens = register_admin(&app).await;
        let admin_id = TokenService::new(config())
            .verify_access(&admin_tokens.access_token)
            .unwrap()
            .user_id;

        let uri = format!("/auth/users/{}/sessions", admin_id);

        let no_token = app
            .clone()
            .oneshot(Request::delete(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(no_token.status(), StatusCode::UNAUTHORIZED);

        let as_user = app
            .clone()
            .oneshot(bearer_request(Method::DELETE, &uri, &admin_tokens.access_token, None))
            .await
            .unwrap();
        assert_eq!(as_user.status(), StatusCode::FORBIDDEN);

        // Grant ADMIN, then sign in again for a token carrying the role
        repo.update_fields(
            &admin_id,
            UserPatch {
                roles: Some([Role::User, Role::Admin].into_iter().collect::<RoleSet>()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let login = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/auth/login",
                json!({"email": "admin@mail.ru", "password": "AdminPass"}),
            ))
            .await
            .unwrap();
        let admin: TokenResponse = serde_json::from_value(body_json(login).await).unwrap();

        let bad_id = app
            .clone()
            .oneshot(bearer_request(
                Method::DELETE,
                "/auth/users/not-a-uuid/sessions",
                &admin.access_token,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

        let revoked = app
            .clone()
            .oneshot(bearer_request(Method::DELETE, &uri, &admin.access_token, None))
            .await
            .unwrap();
        assert_eq!(revoked.status(), StatusCode::OK);
        assert_eq!(body_json(revoked).await["revoked"], 2);
    }

    #[tokio::test]
    async fn test_unconfigured_secret_rejects_empty_key_tokens() {
        let repo = InMemoryAuthRepository::new();
        let app = Router::new().nest(
            "/auth",
            auth_router_generic(repo.clone(), crate::AuthConfig::default()),
        );

        let now = chrono::Utc::now().timestamp();
        let user_id = crate::domain::value_object::user_id::UserId::new();
        let forged = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &json!({
                "sub": user_id.to_string(),
                "name": "mallory",
                "roles": ["USER", "ADMIN"],
                "typ": "access",
                "iat": now,
                "exp": now + 3600,
            }),
            &jsonwebtoken::EncodingKey::from_secret(b""),
        )
        .unwrap();

        let response = app
            .oneshot(bearer_request(
                Method::DELETE,
                &format!("/auth/users/{}/sessions", user_id),
                &forged,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
