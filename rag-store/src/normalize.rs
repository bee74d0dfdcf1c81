//! Text normalization applied to corpus fields before indexing.

/// Normalizes a short single-line field (questions).
///
/// - Trims both ends.
/// - Collapses every whitespace run (including newlines) into one space.
pub fn normalize_inline(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a multi-line field (answers) with minimal layout disruption.
///
/// - Trims trailing whitespace on each line.
/// - Collapses multiple blank lines into a single one.
/// - Drops leading and trailing blank lines.
pub fn normalize_block(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut blank_run = 0usize;

    for line in s.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_collapses_whitespace() {
        assert_eq!(
            normalize_inline("  Hạn nộp\n hồ sơ   là khi nào? "),
            "Hạn nộp hồ sơ là khi nào?"
        );
        assert_eq!(normalize_inline(" \t\n"), "");
    }

    #[test]
    fn block_keeps_lines_but_squeezes_blanks() {
        let raw = "\n  Bước 1: đăng ký.   \n\n\n Bước 2: nộp lệ phí.\n\n";
        assert_eq!(normalize_block(raw), "Bước 1: đăng ký.\n\n Bước 2: nộp lệ phí.");
    }
}
