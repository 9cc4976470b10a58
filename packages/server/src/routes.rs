use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{admin, article, auth, contest, event, leaderboard, problem, quiz, student, user};
use crate::state::AppState;

/// Everything under `/api`. Only `/v1` exists today.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1())
}

fn v1() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/student", student_routes())
        .nest("/admin/students", student_admin_routes())
        .nest("/admin/events", event_routes())
        .nest("/super/admins", admin_routes())
        .nest("/articles", article_routes())
        .nest("/leaderboard", leaderboard_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::me))
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(quiz::validate_quiz))
        .routes(routes!(quiz::check_status))
        .routes(routes!(quiz::start_event))
        .routes(routes!(quiz::event_result))
        .routes(routes!(contest::run_code))
        .routes(routes!(contest::submit_contest))
        .routes(routes!(student::list_events))
        .routes(routes!(student::get_event))
        .routes(routes!(student::list_event_problems))
        .routes(routes!(student::get_profile, student::update_profile))
}

fn student_admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_students, user::create_student))
        .routes(routes!(user::bulk_create_students))
        .routes(routes!(
            user::get_student,
            user::update_student,
            user::delete_student
        ))
        .routes(routes!(user::set_student_status))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(event::list_events, event::create_event))
        .routes(routes!(
            event::get_event,
            event::update_event,
            event::delete_event
        ))
        .routes(routes!(event::set_event_status))
        .routes(routes!(event::event_leaderboard))
        .routes(routes!(problem::list_problems, problem::create_problem))
        .routes(routes!(
            problem::get_problem,
            problem::update_problem,
            problem::delete_problem
        ))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(admin::list_admins, admin::create_admin))
        .routes(routes!(admin::update_admin, admin::delete_admin))
}

fn article_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(article::list_articles, article::create_article))
        .routes(routes!(
            article::get_article,
            article::update_article,
            article::delete_article
        ))
}

fn leaderboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(leaderboard::get_leaderboard))
}
