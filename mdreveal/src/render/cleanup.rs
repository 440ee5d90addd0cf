use super::Line;
use crate::options::LineBreakMode;

const BREAK: &str = "<br>";

/// Drop blank lines and join the rest.
///
/// A separator is only placed between two inline lines; block markup (headers, lists, quotes,
/// rules and code blocks) is emitted flush against its neighbours.
pub(super) fn join_lines(lines: &[Line], mode: LineBreakMode) -> String {
    let separator = match mode {
        LineBreakMode::Break => BREAK,
        LineBreakMode::Space => " ",
    };

    let mut out = String::new();
    let mut prev_inline: Option<bool> = None;
    for line in lines {
        if !line.block && line.text.trim().is_empty() {
            continue;
        }
        if prev_inline == Some(true) && !line.block {
            out.push_str(separator);
        }
        out.push_str(&line.text);
        prev_inline = Some(!line.block);
    }

    if mode == LineBreakMode::Break {
        collapse_breaks(&mut out);
    }
    out
}

/// Collapse runs of `<br>` into one. Only reachable when raw HTML is passed through.
fn collapse_breaks(out: &mut String) {
    const DOUBLE: &str = "<br><br>";
    while out.contains(DOUBLE) {
        *out = out.replace(DOUBLE, BREAK);
    }
}
