use serde_json::json;

use crate::common::{PASSWORD, Role, SUPER_EMAIL, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn student_can_log_in_and_receives_an_http_only_cookie() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com", Role::Student, Some("CSE"))
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["email"], "ada@example.com");
        assert_eq!(res.body["user"]["isStudent"], true);
        assert!(res.body["user"].get("password").is_none());

        let cookie = res
            .cookies
            .iter()
            .find(|c| c.starts_with("auth_token="))
            .expect("auth_token cookie not set");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=10800"));
    }

    #[tokio::test]
    async fn super_admin_token_lasts_one_hour() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": SUPER_EMAIL, "password": crate::common::SUPER_PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["user"]["isSuper"], true);
        assert!(res.cookies.iter().any(|c| c.contains("Max-Age=3600")));
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_whitespace() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com", Role::Student, None).await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "  ADA@Example.com ", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com", Role::Student, None).await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": "not-the-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_rejected_like_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn banned_student_cannot_log_in() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_user("ada@example.com", Role::Student, None).await;

        let res = app
            .put_with_token(&routes::student_status(id), &json!({"status": "banned"}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ACCOUNT_BANNED");
    }

    #[tokio::test]
    async fn empty_fields_are_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"email": "", "password": ""}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_identity_in_the_token() {
        let app = TestApp::spawn().await;
        let (id, token) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["email"], "ada@example.com");
        assert_eq!(res.body["isStudent"], true);
        assert_eq!(res.body["isAdmin"], false);
    }

    #[tokio::test]
    async fn the_cookie_alone_authenticates_requests() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com", Role::Student, None).await;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        let res = client
            .post(app.url(routes::LOGIN))
            .json(&json!({"email": "ada@example.com", "password": PASSWORD}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);

        let res = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(res.status(), 200);

        let res = client.post(app.url(routes::LOGOUT)).send().await.unwrap();
        assert_eq!(res.status(), 204);

        let res = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn request_without_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn forged_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod role_gate {
    use super::*;

    #[tokio::test]
    async fn student_cannot_reach_admin_endpoints() {
        let app = TestApp::spawn().await;
        let (_, token) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.get_with_token(routes::STUDENTS, &token).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_cannot_take_quizzes() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(routes::CHECK_STATUS, &json!({"eventId": 1}), &admin)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_cannot_reach_super_admin_endpoints() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(routes::ADMINS, &admin).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn super_admin_passes_admin_gates() {
        let app = TestApp::spawn().await;
        let root = app.super_token().await;

        let res = app.get_with_token(routes::STUDENTS, &root).await;

        assert_eq!(res.status, 200, "{}", res.text);
    }
}
