use super::ExplainMode;

const TEACHER_EXPLAIN: &str = r#"You are a programming teacher.
Analyze the following code file "{name}" and explain each function in a beginner-friendly way.
Return only JSON as an array of objects with "functionName" and "explanation" fields.
Keep each explanation to 2 concise lines and include what concept the function demonstrates.
If no functions are present, return an empty array.

Code:
{code}

Response format:
[
  {"functionName": "function_name", "explanation": "clear two-line teaching explanation"},
  ...
]"#;

const REVIEWER_EXPLAIN: &str = r#"You are a senior code reviewer.
Analyze the following code file "{name}" and review each function.
Return only JSON as an array of objects with "functionName" and "explanation" fields.
Each explanation should be concise and include one practical review point (quality, correctness, readability, or maintainability).
If no functions are present, return an empty array.

Code:
{code}

Response format:
[
  {"functionName": "function_name", "explanation": "concise review insight"},
  ...
]"#;

const VIBE_EDIT: &str = r#"You are a coding agent inside an IDE.
Complete the user's request by editing only the active file.
Return only strict JSON with this shape:
{
  "summary": "short summary",
  "updatedContent": "full updated file content"
}

User request:
{request}

Active file:
{name}

Current content:
{code}"#;

/// Fill `{key}` placeholders in one pass so substituted text is never rescanned
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let extra: usize = vars.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match hit {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn explain_prompt(mode: ExplainMode, file_name: &str, code: &str) -> String {
    let template = match mode {
        ExplainMode::Teacher => TEACHER_EXPLAIN,
        ExplainMode::Reviewer => REVIEWER_EXPLAIN,
    };
    render(template, &[("name", file_name), ("code", code)])
}

pub fn edit_prompt(request: &str, file_name: &str, code: &str) -> String {
    render(
        VIBE_EDIT,
        &[("request", request), ("name", file_name), ("code", code)],
    )
}
