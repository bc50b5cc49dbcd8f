//! Self-contained HTML quiz export.
//!
//! The page works offline: styling and scoring script are inline and
//! nothing references an external asset. Each question renders as one
//! radio-button fieldset; scoring compares the selected option index
//! against an embedded answer key, entirely client-side.

use crate::quiz::Quiz;

/// Escape text for safe interpolation into HTML markup.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a quiz as a standalone interactive HTML document.
pub fn render_html(quiz: &Quiz, title: &str) -> String {
    let title = escape_html(title);
    let answer_key: Vec<usize> = quiz.questions.iter().map(|q| q.correct_option_id).collect();
    let explanations: Vec<&str> = quiz
        .questions
        .iter()
        .map(|q| q.explanation.as_str())
        .collect();

    let mut questions_html = String::new();
    for (i, q) in quiz.questions.iter().enumerate() {
        let mut options_html = String::new();
        for (j, option) in q.options.iter().enumerate() {
            options_html.push_str(&format!(
                "      <label><input type=\"radio\" name=\"q{i}\" value=\"{j}\"> {}</label>\n",
                escape_html(option)
            ));
        }
        questions_html.push_str(&format!(
            "    <fieldset class=\"question\" data-question=\"{i}\">\n      \
             <legend>{}. {}</legend>\n{options_html}      \
             <p class=\"feedback\" id=\"feedback-{i}\"></p>\n    </fieldset>\n",
            i + 1,
            escape_html(&q.scenario)
        ));
    }

    let answer_key_json = serde_json::to_string(&answer_key).unwrap_or_else(|_| "[]".into());
    // A literal "</script>" inside an explanation would end the script block.
    let explanations_json = serde_json::to_string(&explanations)
        .unwrap_or_else(|_| "[]".into())
        .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    body {{ font-family: Georgia, serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; color: #262730; }}
    fieldset.question {{ border: 1px solid #d1d5db; border-radius: 6px; margin-bottom: 1rem; padding: 1rem; }}
    legend {{ font-weight: 600; }}
    label {{ display: block; margin: 0.25rem 0; }}
    .feedback {{ font-style: italic; margin: 0.5rem 0 0; }}
    .correct {{ color: #15803d; }}
    .incorrect {{ color: #b91c1c; }}
    button {{ padding: 0.5rem 1.5rem; font-size: 1rem; }}
    #score {{ font-size: 1.25rem; font-weight: 600; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <form id="quiz">
{questions_html}    <button type="submit">Check answers</button>
    <p id="score"></p>
  </form>
  <script>
    const ANSWER_KEY = {answer_key_json};
    const EXPLANATIONS = {explanations_json};
    document.getElementById("quiz").addEventListener("submit", function (ev) {{
      ev.preventDefault();
      let score = 0;
      ANSWER_KEY.forEach(function (correct, i) {{
        const chosen = document.querySelector('input[name="q' + i + '"]:checked');
        const feedback = document.getElementById("feedback-" + i);
        if (chosen !== null && parseInt(chosen.value, 10) === correct) {{
          score += 1;
          feedback.textContent = "Correct. " + EXPLANATIONS[i];
          feedback.className = "feedback correct";
        }} else {{
          feedback.textContent = "Incorrect. " + EXPLANATIONS[i];
          feedback.className = "feedback incorrect";
        }}
      }});
      document.getElementById("score").textContent =
        "Score: " + score + " / " + ANSWER_KEY.length;
    }});
  </script>
</body>
</html>
"#
    )
}
