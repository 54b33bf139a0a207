//! Markup Cleanup
//!
//! Best-effort normalization of model-produced policy markup: strips
//! markdown code fences and attempts to balance tag nesting. Well-formed
//! nesting is attempted, not guaranteed; callers must not assume
//! schema-valid output.

use std::sync::LazyLock;

use regex::Regex;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n?(.*?)\n?\s*```\s*$").expect("static pattern")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").expect("static pattern"));

/// Elements that never take a closing tag
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Normalize a model-produced markup fragment
pub fn normalize_fragment(raw: &str) -> String {
    let unfenced = match CODE_FENCE.captures(raw) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => raw,
    };

    balance_tags(unfenced.trim())
}

/// Best-effort tag balancing: drops closing tags that were never opened
/// and appends closers for tags left open. Attribute syntax and nesting
/// order inside the fragment are passed through untouched.
fn balance_tags(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut stack: Vec<String> = Vec::new();
    let mut last_end = 0;

    for caps in TAG.captures_iter(input) {
        let whole = caps.get(0).expect("capture 0 always present");
        let name = caps[1].to_lowercase();

        output.push_str(&input[last_end..whole.start()]);
        last_end = whole.end();

        let tag_text = whole.as_str();
        let is_closing = tag_text.starts_with("</");
        let is_self_closing = tag_text.ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str());

        if is_closing {
            if let Some(pos) = stack.iter().rposition(|open| *open == name) {
                // Close anything opened after it first
                while stack.len() > pos + 1 {
                    let unclosed = stack.pop().expect("len checked");
                    output.push_str(&format!("</{unclosed}>"));
                }
                stack.pop();
                output.push_str(tag_text);
            }
            // Unmatched closer: drop it
        } else {
            output.push_str(tag_text);
            if !is_self_closing {
                stack.push(name);
            }
        }
    }

    output.push_str(&input[last_end..]);

    while let Some(unclosed) = stack.pop() {
        output.push_str(&format!("</{unclosed}>"));
    }

    output
}
