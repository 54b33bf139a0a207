//! Visual Markup Diff
//!
//! Word-level diff of two markup fragments, rendered inline with
//! `<del>`/`<ins>` spans so an editor can show what a revision changed.

use similar::{ChangeTag, TextDiff};

/// Render a visual diff of `old` vs `new`. Unchanged runs pass through
/// verbatim; removed runs are wrapped in `<del>`, added runs in `<ins>`.
pub fn html_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_words(old, new);

    let mut output = String::with_capacity(old.len() + new.len());
    let mut open: Option<ChangeTag> = None;

    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if open != Some(tag) {
            close_span(&mut output, open);
            open_span(&mut output, tag);
            open = Some(tag);
        }
        output.push_str(change.value());
    }
    close_span(&mut output, open);

    output
}

fn open_span(output: &mut String, tag: ChangeTag) {
    match tag {
        ChangeTag::Delete => output.push_str("<del>"),
        ChangeTag::Insert => output.push_str("<ins>"),
        ChangeTag::Equal => {}
    }
}

fn close_span(output: &mut String, tag: Option<ChangeTag>) {
    match tag {
        Some(ChangeTag::Delete) => output.push_str("</del>"),
        Some(ChangeTag::Insert) => output.push_str("</ins>"),
        _ => {}
    }
}
