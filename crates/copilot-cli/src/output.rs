use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Column widths fitting every header and cell.
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

fn render_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let w = widths.get(i).copied().unwrap_or(0);
            format!("{:w$}", cell.as_ref())
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let widths = column_widths(headers, &rows);
    println!("{}", render_row(headers, &widths));
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));
    for row in &rows {
        println!("{}", render_row(row, &widths));
    }
}

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_cover_headers_and_cells() {
        let rows = vec![vec!["1".to_string(), "Atlas Billing".to_string()]];
        assert_eq!(column_widths(&["ID", "NAME"], &rows), vec![2, 13]);
    }

    #[test]
    fn rows_are_padded_and_trimmed() {
        assert_eq!(render_row(&["a", "b"], &[3, 3]), "a    b");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 8), "a lon...");
    }
}
