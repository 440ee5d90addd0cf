use super::Line;
use crate::syntax::{self, ListKind};

/// Open list while scanning lines.
struct ListBlock {
    kind: ListKind,
    items: Vec<String>,
}

impl ListBlock {
    fn into_line(self) -> Line {
        let tag = match self.kind {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        };
        let mut html = String::with_capacity(16 + self.items.iter().map(String::len).sum::<usize>());
        html.push('<');
        html.push_str(tag);
        html.push('>');
        for item in &self.items {
            html.push_str(item);
        }
        html.push_str("</");
        html.push_str(tag);
        html.push('>');
        Line::block(html)
    }
}

/// Fold runs of list-item lines into single `<ul>`/`<ol>` block lines.
///
/// A run ends at any other line (blank lines included) or when the list kind changes. The block
/// takes the position of the run's first line. Ordered items keep their literal number.
pub(super) fn fold_lists(lines: Vec<Line>) -> Vec<Line> {
    let mut out = Vec::with_capacity(lines.len());
    let mut open: Option<ListBlock> = None;

    for line in lines {
        let marker = if line.block {
            None
        } else {
            syntax::parse_list_marker(&line.text)
        };

        let Some(marker) = marker else {
            if let Some(block) = open.take() {
                out.push(block.into_line());
            }
            out.push(line);
            continue;
        };

        let item = match marker.kind {
            ListKind::Unordered => format!("<li>{}</li>", marker.content),
            ListKind::Ordered => format!("<li value=\"{}\">{}</li>", marker.number, marker.content),
        };

        match open.as_mut() {
            Some(block) if block.kind == marker.kind => block.items.push(item),
            _ => {
                if let Some(block) = open.take() {
                    out.push(block.into_line());
                }
                open = Some(ListBlock {
                    kind: marker.kind,
                    items: vec![item],
                });
            }
        }
    }

    if let Some(block) = open.take() {
        out.push(block.into_line());
    }
    out
}
