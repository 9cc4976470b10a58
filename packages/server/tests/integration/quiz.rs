use serde_json::json;

use crate::common::{Role, TestApp, routes};

mod grading {
    use super::*;

    #[tokio::test]
    async fn two_of_three_correct_scores_twenty_points() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        assert_eq!(app.start(&student, quiz).await.status, 201);

        let res = app
            .submit_quiz(&student, quiz, json!({"0": "B", "1": "C", "2": "D"}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["CorrectAnswerCount"], 2);
        assert_eq!(res.body["Points"], 20.0);
        assert_eq!(res.body["QuizResult"]["0"]["correctAnswer"], "B");
        assert_eq!(res.body["QuizResult"]["1"]["studentAnswer"], "C");
        assert_eq!(res.body["QuizResult"]["1"]["correctAnswer"], "A");
        assert!(res.body.get("error").is_none(), "{}", res.text);
        assert!(res.body["message"].is_string());
    }

    #[tokio::test]
    async fn answers_may_be_sent_as_an_array() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        let res = app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["CorrectAnswerCount"], 3);
        assert_eq!(res.body["Points"], 30.0);
    }

    #[tokio::test]
    async fn unanswered_questions_score_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        let res = app.submit_quiz(&student, quiz, json!({"2": "D"})).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["CorrectAnswerCount"], 1);
        assert_eq!(res.body["Points"], 10.0);
        assert!(res.body["QuizResult"]["0"]["studentAnswer"].is_null());
    }

    #[tokio::test]
    async fn quiz_without_questions_scores_zero() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app
            .create_event(
                &admin,
                &json!({"title": "Empty", "kind": "quiz", "pointsPerQuestion": 5.0}),
                "active",
            )
            .await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        let res = app.submit_quiz(&student, quiz, json!({})).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["CorrectAnswerCount"], 0);
        assert_eq!(res.body["Points"], 0.0);
        assert_eq!(res.body["QuizResult"], json!({}));
    }

    #[tokio::test]
    async fn missing_quiz_id_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app
            .post_with_token(
                routes::VALIDATE_QUIZ,
                &json!({"studentAnswers": {"0": "A"}}),
                &student,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_answers_are_a_validation_error() {
        let app = TestApp::spawn().await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app
            .post_with_token(routes::VALIDATE_QUIZ, &json!({"quizId": 1}), &student)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found() {
        let app = TestApp::spawn().await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.submit_quiz(&student, 999, json!({"0": "A"})).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn coding_event_cannot_be_graded_as_a_quiz() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let contest = app
            .create_event(&admin, &json!({"title": "Contest", "kind": "coding"}), "active")
            .await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.submit_quiz(&student, contest, json!({})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod recording {
    use super::*;

    #[tokio::test]
    async fn submission_without_start_is_graded_but_not_recorded() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["Points"], 30.0);
        assert_eq!(res.body["error"], "Event has not been started");

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.status, 404);

        let res = app
            .post_with_token(routes::CHECK_STATUS, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["eventStatus"], "not_started");
    }

    #[tokio::test]
    async fn result_holds_the_recorded_score() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (student_id, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;
        app.submit_quiz(&student, quiz, json!({"0": "B", "1": "C", "2": "D"}))
            .await;

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let result = &res.body["result"];
        assert_eq!(result["userId"], student_id);
        assert_eq!(result["eventId"], quiz);
        assert_eq!(result["points"], 20.0);
        assert_eq!(result["breakdown"], json!({"quiz": 20.0}));
        assert_eq!(result["submissionCount"], 1);
    }

    #[tokio::test]
    async fn lower_resubmission_keeps_the_best_score() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        app.submit_quiz(&student, quiz, json!({"0": "B", "1": "C", "2": "D"}))
            .await;
        let res = app
            .submit_quiz(&student, quiz, json!({"0": "B", "1": "C", "2": "C"}))
            .await;
        assert_eq!(res.body["Points"], 10.0);
        assert!(res.body.get("error").is_none(), "{}", res.text);

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["result"]["points"], 20.0);
        assert_eq!(res.body["result"]["lastPoints"], 10.0);
        assert_eq!(res.body["result"]["submissionCount"], 2);

        let res = app.get_with_token(routes::PROFILE, &student).await;
        assert_eq!(res.body["summary"]["totalScore"], 20.0);
        assert_eq!(res.body["summary"]["contestsParticipated"], 1);
    }

    #[tokio::test]
    async fn higher_resubmission_replaces_the_score() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        app.submit_quiz(&student, quiz, json!(["B"])).await;
        app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["result"]["points"], 30.0);
    }

    #[tokio::test]
    async fn concurrent_submissions_are_all_counted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        let (a, b) = tokio::join!(
            app.submit_quiz(&student, quiz, json!(["B"])),
            app.submit_quiz(&student, quiz, json!(["B", "A"])),
        );
        assert_eq!(a.status, 200);
        assert_eq!(b.status, 200);

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["result"]["points"], 20.0);
        assert_eq!(res.body["result"]["submissionCount"], 2);
    }
}

mod attempts {
    use super::*;

    #[tokio::test]
    async fn status_moves_from_not_started_to_completed() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (student_id, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        let body = json!({"eventId": quiz});

        let res = app.post_with_token(routes::CHECK_STATUS, &body, &student).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["eventStatus"], "not_started");
        assert!(res.body["data"].is_null());

        app.start(&student, quiz).await;
        let res = app.post_with_token(routes::CHECK_STATUS, &body, &student).await;
        assert_eq!(res.body["eventStatus"], "in_progress");
        assert_eq!(res.body["data"]["userId"], student_id);
        assert!(res.body["data"]["completedAt"].is_null());

        app.submit_quiz(&student, quiz, json!(["B"])).await;
        let res = app.post_with_token(routes::CHECK_STATUS, &body, &student).await;
        assert_eq!(res.body["eventStatus"], "completed");
        assert!(res.body["data"]["completedAt"].is_string());
        assert!(res.body["data"]["resultId"].is_number());

        let again = app.post_with_token(routes::CHECK_STATUS, &body, &student).await;
        assert_eq!(again.body, res.body);
    }

    #[tokio::test]
    async fn starting_twice_is_not_an_error() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let first = app.start(&student, quiz).await;
        assert_eq!(first.status, 201, "{}", first.text);
        assert_eq!(first.body["success"], true);

        let second = app.start(&student, quiz).await;
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.body["success"], true);
        assert_eq!(second.body["message"], "Event already started");
    }

    #[tokio::test]
    async fn starting_after_completion_keeps_the_attempt_completed() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;
        app.submit_quiz(&student, quiz, json!(["B"])).await;

        let res = app.start(&student, quiz).await;
        assert_eq!(res.status, 200);

        let res = app
            .post_with_token(routes::CHECK_STATUS, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["eventStatus"], "completed");
    }

    #[tokio::test]
    async fn queued_event_cannot_be_started() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app
            .create_event(&admin, &crate::common::sample_quiz(), "queue")
            .await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.start(&student, quiz).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn event_for_another_department_cannot_be_started() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let mut body = crate::common::sample_quiz();
        body["departments"] = json!(["ECE"]);
        let quiz = app.create_event(&admin, &body, "active").await;
        let (_, cse) = app
            .create_authenticated_user("ada@example.com", Role::Student, Some("CSE"))
            .await;
        let (_, ece) = app
            .create_authenticated_user("bob@example.com", Role::Student, Some("ECE"))
            .await;

        assert_eq!(app.start(&cse, quiz).await.status, 404);
        assert_eq!(app.start(&ece, quiz).await.status, 201);
    }

    #[tokio::test]
    async fn missing_event_id_is_a_validation_error() {
        let app = TestApp::spawn().await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.post_with_token(routes::START_EVENT, &json!({}), &student).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod student_views {
    use super::*;

    #[tokio::test]
    async fn student_sees_open_events_without_answers() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let open = app.create_quiz(&admin).await;
        app.create_event(&admin, &crate::common::sample_quiz(), "queue")
            .await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.get_with_token(routes::STUDENT_EVENTS, &student).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let events = res.body.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["id"], open);
        assert_eq!(events[0]["questionCount"], 3);
        assert_eq!(events[0]["questions"][0]["options"], json!(["A", "B", "C", "D"]));
        assert!(!res.text.contains("correctAnswer"));

        let res = app.get_with_token(&routes::student_event(open), &student).await;
        assert_eq!(res.status, 200);
        assert!(!res.text.contains("correctAnswer"));
    }

    #[tokio::test]
    async fn department_restricted_events_are_hidden_from_others() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let mut body = crate::common::sample_quiz();
        body["departments"] = json!(["ECE"]);
        let quiz = app.create_event(&admin, &body, "published").await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, Some("CSE"))
            .await;

        let res = app.get_with_token(routes::STUDENT_EVENTS, &student).await;
        assert_eq!(res.body, json!([]));

        let res = app.get_with_token(&routes::student_event(quiz), &student).await;
        assert_eq!(res.status, 404);
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn queued_quiz_cannot_be_submitted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app
            .create_event(&admin, &crate::common::sample_quiz(), "queue")
            .await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;

        let res = app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert!(!res.text.contains("correctAnswer"));
    }

    #[tokio::test]
    async fn quiz_for_another_department_cannot_be_submitted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let mut body = crate::common::sample_quiz();
        body["departments"] = json!(["CSE"]);
        let quiz = app.create_event(&admin, &body, "active").await;
        let (_, student) = app
            .create_authenticated_user("bob@example.com", Role::Student, Some("ECE"))
            .await;

        let res = app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;

        assert_eq!(res.status, 404);
        assert!(!res.text.contains("correctAnswer"));
    }

    #[tokio::test]
    async fn ended_quiz_keeps_its_final_score() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;
        app.submit_quiz(&student, quiz, json!(["B"])).await;

        let res = app
            .put_with_token(&routes::event_status(quiz), &json!({"status": "ended"}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;
        assert_eq!(res.status, 404);

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["result"]["points"], 10.0);
        assert_eq!(res.body["result"]["submissionCount"], 1);
    }

    #[tokio::test]
    async fn banned_student_cannot_submit() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (id, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        app.put_with_token(&routes::student_status(id), &json!({"status": "banned"}), &admin)
            .await;
        let res = app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ACCOUNT_BANNED");

        let res = app.get_with_token(&routes::event_leaderboard(quiz), &admin).await;
        assert_eq!(res.body["data"], json!([]));
    }
}

mod store_failures {
    use super::*;

    #[tokio::test]
    async fn failed_status_lookup_reports_unknown() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        app.exec_sql("DROP TABLE event_attempt").await;
        let res = app
            .post_with_token(routes::CHECK_STATUS, &json!({"eventId": quiz}), &student)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["eventStatus"], "unknown");
        assert!(res.body["data"].is_null());
    }

    #[tokio::test]
    async fn unreadable_breakdown_is_not_overwritten() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (student_id, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;
        app.submit_quiz(&student, quiz, json!(["B", "A"])).await;

        app.exec_sql(&format!(
            "UPDATE event_result SET breakdown = '\"garbage\"' WHERE user_id = {student_id}"
        ))
        .await;
        let res = app.submit_quiz(&student, quiz, json!(["B"])).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["Points"], 10.0);
        assert_eq!(res.body["error"], "Failed to record submission");

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["result"]["points"], 20.0);
        assert_eq!(res.body["result"]["submissionCount"], 1);
    }

    #[tokio::test]
    async fn lost_version_race_is_reported_after_retries() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let quiz = app.create_quiz(&admin).await;
        let (_, student) = app
            .create_authenticated_user("ada@example.com", Role::Student, None)
            .await;
        app.start(&student, quiz).await;

        // Every completion write loses, as if another submission always got there first.
        app.exec_sql(
            "CREATE TRIGGER lose_every_claim BEFORE UPDATE ON event_attempt \
             WHEN NEW.status = 'completed' BEGIN SELECT RAISE(IGNORE); END",
        )
        .await;

        let res = app.submit_quiz(&student, quiz, json!(["B", "A", "D"])).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["Points"], 30.0);
        assert_eq!(
            res.body["error"],
            "Another submission was being recorded at the same time; please resubmit"
        );

        let res = app
            .post_with_token(routes::EVENT_RESULT, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.status, 404);

        let res = app
            .post_with_token(routes::CHECK_STATUS, &json!({"eventId": quiz}), &student)
            .await;
        assert_eq!(res.body["eventStatus"], "in_progress");
    }
}
