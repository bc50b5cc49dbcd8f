//! Export renderer tests: HTML page, poll shaping and PDF certificate
//! driven from the same quiz value.

use chrono::NaiveDate;
use quizforge::export::{
    render_certificate, render_html, CertificateRequest, PollQuestion, POLL_EXPLANATION_MAX_CHARS,
    POLL_OPTION_MAX_CHARS, POLL_QUESTION_MAX_CHARS,
};
use quizforge::quiz::{Question, Quiz};

fn sample_quiz() -> Quiz {
    Quiz {
        questions: vec![
            Question {
                scenario: "Which upload kinds go through transcription?".into(),
                options: vec![
                    "Audio and video".into(),
                    "Documents".into(),
                    "Spreadsheets".into(),
                ],
                correct_option_id: 0,
                explanation: "Media files are transcribed; documents are parsed.".into(),
            },
            Question {
                scenario: "What happens to the temp file after extraction?".into(),
                options: vec!["It is kept".into(), "It is deleted".into()],
                correct_option_id: 1,
                explanation: "Temp files are removed on every exit path.".into(),
            },
        ],
    }
}

#[test]
fn test_html_contains_every_question_and_option() {
    let quiz = sample_quiz();
    let html = render_html(&quiz, "Pipeline Basics");
    for q in &quiz.questions {
        assert!(html.contains(&q.scenario));
        for option in &q.options {
            assert!(html.contains(option));
        }
    }
    assert_eq!(
        html.matches("<fieldset").count(),
        quiz.questions.len()
    );
}

#[test]
fn test_html_embeds_scoring_key() {
    let html = render_html(&sample_quiz(), "Pipeline Basics");
    assert!(html.contains("const ANSWER_KEY = [0,1];"));
    assert!(html.contains("Check answers"));
}

#[test]
fn test_poll_shapes_respect_platform_limits() {
    let mut quiz = sample_quiz();
    quiz.questions[0].scenario = "x".repeat(1000);
    quiz.questions[0].options[1] = "y".repeat(500);
    quiz.questions[0].explanation = "z".repeat(500);

    for q in &quiz.questions {
        let poll = PollQuestion::from(q);
        assert!(poll.question.chars().count() <= POLL_QUESTION_MAX_CHARS);
        assert!(poll.explanation.chars().count() <= POLL_EXPLANATION_MAX_CHARS);
        for option in &poll.options {
            assert!(option.chars().count() <= POLL_OPTION_MAX_CHARS);
        }
        assert!(poll.correct_option_id < poll.options.len());
    }
}

#[test]
fn test_certificate_round_trip_to_pdf_bytes() {
    let request = CertificateRequest {
        student_name: "Амина Сейтқазы".into(),
        course_title: "Introduction to Pipelines".into(),
        logo_png: None,
        issued_on: NaiveDate::from_ymd_opt(2026, 8, 29).unwrap(),
    };
    let bytes = render_certificate(&request, None).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 500);
}
