use crate::services::mirror::MirrorRecord;

// ---------- small output helpers ----------

/// Left-aligned columns separated by at least two spaces. The last cell of
/// a row is never padded.
pub fn render_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        let last = row.len().saturating_sub(1);
        for (i, cell) in row.iter().enumerate() {
            out.push_str(cell);
            if i < last {
                let pad = widths[i] - cell.chars().count() + 2;
                out.extend(std::iter::repeat(' ').take(pad));
            }
        }
        out.push('\n');
    }
    out
}

/// `up   (Tue, 1 Jul 2003 10:52:37 +0000)` / `down (...)`.
pub fn state_cell(m: &MirrorRecord) -> String {
    let since = m
        .state_since_utc()
        .map(|t| t.to_rfc2822())
        .unwrap_or_else(|| m.state_since.to_string());
    if m.up {
        format!("up   ({since})")
    } else {
        format!("down ({since})")
    }
}
