//! `Exec` key tokenizing.

/// Splits an `Exec` value into argv tokens.
///
/// Backslash escapes the next character, double quotes group whitespace, and
/// tokens beginning with `%` (field codes like `%u`, `%F`) are dropped.
pub fn parse_exec(exec: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for c in exec.chars() {
        if escape {
            current.push(c);
            escape = false;
            continue;
        }

        match c {
            '\\' => escape = true,
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => push_token(&mut tokens, &mut current),
            c => current.push(c),
        }
    }
    push_token(&mut tokens, &mut current);

    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    if current.is_empty() {
        return;
    }
    let token = std::mem::take(current);
    if !token.starts_with('%') {
        tokens.push(token);
    }
}
