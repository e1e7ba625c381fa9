//! Tests for input validation.

use crate::db::validation::*;
use crate::db::{DbError, NewIssue, NewProject, NewSprint, NewUser};

fn field_names(err: DbError) -> Vec<String> {
    match err {
        DbError::Validation { errors } => errors.into_iter().map(|e| e.field).collect(),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

fn user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        display_name: "Someone".to_string(),
        ..Default::default()
    }
}

#[test]
fn username_length_bounds() {
    assert!(validate_new_user(&user("abc")).is_ok());
    assert!(validate_new_user(&user(&"a".repeat(50))).is_ok());
    assert_eq!(
        field_names(validate_new_user(&user("ab")).unwrap_err()),
        vec!["username"]
    );
    assert!(validate_new_user(&user(&"a".repeat(51))).is_err());
}

#[test]
fn username_charset() {
    assert!(validate_new_user(&user("dish_washer-99")).is_ok());
    assert!(validate_new_user(&user("dish washer")).is_err());
    assert!(validate_new_user(&user("dïsh")).is_err());
}

#[test]
fn email_must_have_both_sides() {
    let mut u = user("alice");
    u.email = Some("alice@home".to_string());
    assert!(validate_new_user(&u).is_ok());

    u.email = Some("@home".to_string());
    assert_eq!(field_names(validate_new_user(&u).unwrap_err()), vec!["email"]);
}

#[test]
fn project_key_rules() {
    let project = |key: &str| NewProject {
        name: "Home".to_string(),
        key: key.to_string(),
        description: None,
        created_by: 1,
    };

    assert!(validate_new_project(&project("HOME")).is_ok());
    assert!(validate_new_project(&project("H2")).is_ok());
    assert!(validate_new_project(&project("H")).is_err());
    assert!(validate_new_project(&project("home")).is_err());
    assert!(validate_new_project(&project("2HOME")).is_err());
    assert!(validate_new_project(&project("HOMEHOMEHOM")).is_err());
    assert!(validate_new_project(&project("HO-ME")).is_err());
}

#[test]
fn issue_collects_every_failing_field() {
    let issue = NewIssue {
        project_id: 1,
        reporter_id: 1,
        summary: "x".repeat(600),
        description: Some("y".repeat(10_001)),
        story_points: Some(101),
        due_date: Some("next week".to_string()),
        ..Default::default()
    };

    let fields = field_names(validate_new_issue(&issue).unwrap_err());
    assert_eq!(
        fields,
        vec!["summary", "description", "due_date", "story_points"]
    );
}

#[test]
fn issue_summary_bounds() {
    let mut issue = NewIssue {
        project_id: 1,
        reporter_id: 1,
        summary: "x".repeat(500),
        ..Default::default()
    };
    assert!(validate_new_issue(&issue).is_ok());

    issue.summary = String::new();
    assert!(validate_new_issue(&issue).is_err());
}

#[test]
fn story_points_bounds_are_inclusive() {
    for points in [0, 100] {
        let issue = NewIssue {
            project_id: 1,
            reporter_id: 1,
            summary: "Mow".to_string(),
            story_points: Some(points),
            ..Default::default()
        };
        assert!(validate_new_issue(&issue).is_ok(), "{} points", points);
    }
}

#[test]
fn status_must_be_machine_friendly() {
    assert!(validate_status("in_progress").is_ok());
    assert!(validate_status("").is_err());
    assert!(validate_status("In Progress").is_err());
}

#[test]
fn sprint_end_must_follow_start() {
    let sprint = |start: Option<&str>, end: Option<&str>| NewSprint {
        board_id: 1,
        name: "Spring cleaning".to_string(),
        goal: None,
        start_date: start.map(str::to_string),
        end_date: end.map(str::to_string),
    };

    assert!(validate_new_sprint(&sprint(Some("2025-04-01"), Some("2025-04-14"))).is_ok());
    assert!(validate_new_sprint(&sprint(None, Some("2025-04-14"))).is_ok());
    assert_eq!(
        field_names(
            validate_new_sprint(&sprint(Some("2025-04-14"), Some("2025-04-14"))).unwrap_err()
        ),
        vec!["end_date"]
    );
    assert!(validate_new_sprint(&sprint(Some("2025-04-14"), Some("2025-04-01"))).is_err());
}

#[test]
fn comment_content_bounds() {
    assert!(validate_comment_content("Nice job.").is_ok());
    assert!(validate_comment_content("").is_err());
    assert!(validate_comment_content(&"z".repeat(5001)).is_err());
}
