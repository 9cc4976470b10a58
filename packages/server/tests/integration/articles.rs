use serde_json::json;

use crate::common::{Role, TestApp, routes};

async fn write_article(app: &TestApp, admin: &str, title: &str, published: bool) -> i32 {
    let res = app
        .post_with_token(
            routes::ARTICLES,
            &json!({"title": title, "content": "# Notes", "published": published}),
            admin,
        )
        .await;
    assert_eq!(res.status, 201, "Article creation failed: {}", res.text);
    res.body["id"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn students_see_published_articles_only() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let published = write_article(&app, &admin, "Scoring rules", true).await;
    let draft = write_article(&app, &admin, "Upcoming", false).await;
    let (_, student) = app
        .create_authenticated_user("ada@example.com", Role::Student, None)
        .await;

    let res = app.get_with_token(routes::ARTICLES, &student).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 1);
    assert_eq!(res.body["data"][0]["id"], published);

    assert_eq!(app.get_with_token(&routes::article(draft), &student).await.status, 404);
    assert_eq!(app.get_with_token(&routes::article(published), &student).await.status, 200);

    let res = app.get_with_token(routes::ARTICLES, &admin).await;
    assert_eq!(res.body["pagination"]["total"], 2);
}

#[tokio::test]
async fn publishing_a_draft_makes_it_visible() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let draft = write_article(&app, &admin, "Upcoming", false).await;
    let (_, student) = app
        .create_authenticated_user("ada@example.com", Role::Student, None)
        .await;

    let res = app
        .patch_with_token(&routes::article(draft), &json!({"published": true}), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["title"], "Upcoming");

    let res = app.get_with_token(&routes::article(draft), &student).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["content"], "# Notes");
}

#[tokio::test]
async fn students_cannot_write_articles() {
    let app = TestApp::spawn().await;
    let (_, student) = app
        .create_authenticated_user("ada@example.com", Role::Student, None)
        .await;

    let res = app
        .post_with_token(routes::ARTICLES, &json!({"title": "Hi", "content": ""}), &student)
        .await;

    assert_eq!(res.status, 403);
}

#[tokio::test]
async fn reading_requires_a_session() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::ARTICLES).await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn delete_removes_the_article() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let id = write_article(&app, &admin, "Old news", true).await;

    assert_eq!(app.delete_with_token(&routes::article(id), &admin).await.status, 204);
    assert_eq!(app.get_with_token(&routes::article(id), &admin).await.status, 404);
}
