use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set};
use serde_json::{Value, json};

use quiz_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, Judge0Config, SeedConfig, ServerConfig,
};
use quiz_server::entity::user::{self, UserStatus};
use quiz_server::runner::{CodeRunner, RunOutcome, RunRequest, RunnerError};
use quiz_server::state::AppState;
use quiz_server::utils::hash;

pub const SUPER_EMAIL: &str = "root@example.com";
pub const SUPER_PASSWORD: &str = "root-password";
pub const PASSWORD: &str = "password123";

/// Source code that makes [`FakeRunner`] fail as if Judge0 were down.
pub const RUNNER_DOWN: &str = "__runner_down__";

pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const ME: &str = "/api/v1/auth/me";

    pub const VALIDATE_QUIZ: &str = "/api/v1/student/validate-quiz";
    pub const CHECK_STATUS: &str = "/api/v1/student/check-status";
    pub const START_EVENT: &str = "/api/v1/student/start-event";
    pub const EVENT_RESULT: &str = "/api/v1/student/event-result";
    pub const RUN_CODE: &str = "/api/v1/student/run-code";
    pub const SUBMIT_CONTEST: &str = "/api/v1/student/submit-contest";
    pub const STUDENT_EVENTS: &str = "/api/v1/student/events";
    pub const PROFILE: &str = "/api/v1/student/profile";

    pub fn student_event(id: i32) -> String {
        format!("/api/v1/student/events/{id}")
    }

    pub fn student_event_problems(id: i32) -> String {
        format!("/api/v1/student/events/{id}/problems")
    }

    pub const STUDENTS: &str = "/api/v1/admin/students";
    pub const STUDENTS_BULK: &str = "/api/v1/admin/students/bulk";

    pub fn student(id: i32) -> String {
        format!("/api/v1/admin/students/{id}")
    }

    pub fn student_status(id: i32) -> String {
        format!("/api/v1/admin/students/{id}/status")
    }

    pub const EVENTS: &str = "/api/v1/admin/events";

    pub fn event(id: i32) -> String {
        format!("/api/v1/admin/events/{id}")
    }

    pub fn event_status(id: i32) -> String {
        format!("/api/v1/admin/events/{id}/status")
    }

    pub fn event_leaderboard(id: i32) -> String {
        format!("/api/v1/admin/events/{id}/leaderboard")
    }

    pub fn event_problems(id: i32) -> String {
        format!("/api/v1/admin/events/{id}/problems")
    }

    pub fn event_problem(id: i32, problem_id: i32) -> String {
        format!("/api/v1/admin/events/{id}/problems/{problem_id}")
    }

    pub const ADMINS: &str = "/api/v1/super/admins";

    pub fn admin(id: i32) -> String {
        format!("/api/v1/super/admins/{id}")
    }

    pub const ARTICLES: &str = "/api/v1/articles";

    pub fn article(id: i32) -> String {
        format!("/api/v1/articles/{id}")
    }

    pub const LEADERBOARD: &str = "/api/v1/leaderboard";
}

/// Echoes the source code as stdout. A run is accepted when the source equals
/// the expected output, so a test picks its verdicts by choosing the source.
pub struct FakeRunner;

#[async_trait]
impl CodeRunner for FakeRunner {
    async fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunnerError> {
        if request.source_code == RUNNER_DOWN {
            return Err(RunnerError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        let accepted = request
            .expected_output
            .as_deref()
            .is_none_or(|expected| expected.trim() == request.source_code.trim());
        Ok(RunOutcome {
            stdout: Some(request.source_code.clone()),
            stderr: None,
            compile_output: None,
            status_id: if accepted { 3 } else { 4 },
            status: if accepted { "Accepted" } else { "Wrong Answer" }.into(),
            time: Some("0.01".into()),
            memory: Some(1024),
        })
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    /// Raw `Set-Cookie` headers.
    pub cookies: Vec<String>,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let cookies = res
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            cookies,
        }
    }
}

/// Role flags for a test account.
#[derive(Clone, Copy)]
pub enum Role {
    Student,
    Admin,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let database = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            // One connection keeps the in-memory database alive and shared.
            max_connections: 1,
            min_connections: 1,
        };
        let db = quiz_server::database::init_db(&database)
            .await
            .expect("Failed to initialize database");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database,
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                cookie_secure: false,
                token_hours: 3,
                super_token_hours: 1,
            },
            judge0: Judge0Config::default(),
            seed: SeedConfig {
                super_name: Some("Root".to_string()),
                super_email: Some(SUPER_EMAIL.to_string()),
                super_password: Some(SUPER_PASSWORD.to_string()),
            },
        };

        quiz_server::seed::seed_super_admin(&db, &app_config.seed)
            .await
            .expect("Failed to seed super-admin");

        let state = AppState {
            db: db.clone(),
            config: app_config,
            runner: Arc::new(FakeRunner),
        };

        let app = quiz_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
        }
    }

    /// Run raw SQL against the test database, for breaking things on purpose.
    pub async fn exec_sql(&self, sql: &str) {
        self.db
            .execute_unprepared(sql)
            .await
            .unwrap_or_else(|e| panic!("SQL failed: {sql}: {e}"));
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Log in and return the token from the response body.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .post_without_token(routes::LOGIN, &json!({"email": email, "password": password}))
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        res.body["token"]
            .as_str()
            .expect("Login response missing token")
            .to_string()
    }

    pub async fn super_token(&self) -> String {
        self.login(SUPER_EMAIL, SUPER_PASSWORD).await
    }

    /// Insert an account directly and return its ID.
    pub async fn create_user(&self, email: &str, role: Role, department: Option<&str>) -> i32 {
        let now = chrono::Utc::now();
        let model = user::ActiveModel {
            name: Set(email.split('@').next().unwrap_or(email).to_string()),
            email: Set(email.to_string()),
            password: Set(hash::hash_password(PASSWORD).expect("Failed to hash password")),
            roll_number: Set(None),
            department: Set(department.map(str::to_string)),
            is_admin: Set(matches!(role, Role::Admin)),
            is_student: Set(matches!(role, Role::Student)),
            is_super: Set(false),
            status: Set(UserStatus::Active),
            created_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        model
            .insert(&self.db)
            .await
            .expect("Failed to insert user")
            .id
    }

    /// Create an account and return `(id, token)`.
    pub async fn create_authenticated_user(
        &self,
        email: &str,
        role: Role,
        department: Option<&str>,
    ) -> (i32, String) {
        let id = self.create_user(email, role, department).await;
        let token = self.login(email, PASSWORD).await;
        (id, token)
    }

    pub async fn admin_token(&self) -> String {
        self.create_authenticated_user("admin@example.com", Role::Admin, None)
            .await
            .1
    }

    /// Create an event through the API and move it to `status`. Returns its ID.
    pub async fn create_event(&self, admin_token: &str, body: &Value, status: &str) -> i32 {
        let res = self.post_with_token(routes::EVENTS, body, admin_token).await;
        assert_eq!(res.status, 201, "Event creation failed: {}", res.text);
        let id = res.body["id"].as_i64().expect("Event id missing") as i32;

        if status != "queue" {
            let res = self
                .put_with_token(&routes::event_status(id), &json!({"status": status}), admin_token)
                .await;
            assert_eq!(res.status, 200, "Status change failed: {}", res.text);
        }
        id
    }

    /// Active three-question quiz worth 10 points per question.
    /// Correct answers: B, A, D.
    pub async fn create_quiz(&self, admin_token: &str) -> i32 {
        self.create_event(admin_token, &sample_quiz(), "active").await
    }

    pub async fn start(&self, token: &str, event_id: i32) -> TestResponse {
        self.post_with_token(routes::START_EVENT, &json!({"eventId": event_id}), token)
            .await
    }

    pub async fn submit_quiz(&self, token: &str, quiz_id: i32, answers: Value) -> TestResponse {
        self.post_with_token(
            routes::VALIDATE_QUIZ,
            &json!({"quizId": quiz_id, "studentAnswers": answers}),
            token,
        )
        .await
    }
}

pub fn sample_quiz() -> Value {
    json!({
        "title": "Weekly Quiz",
        "kind": "quiz",
        "pointsPerQuestion": 10.0,
        "questions": [
            {"question": "Q1", "options": ["A", "B", "C", "D"], "correctAnswer": "B"},
            {"question": "Q2", "options": ["A", "B", "C", "D"], "correctAnswer": "A"},
            {"question": "Q3", "options": ["A", "B", "C", "D"], "correctAnswer": "D"},
        ],
    })
}
