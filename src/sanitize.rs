//! Cleans captured script output before it is drawn inside the TUI.

const MAX_LINE_CHARS: usize = 1024;
const MAX_LINES: usize = 500;

enum EscapeMode {
    Esc,
    Csi,
    Osc,
    OscEsc,
    StTerminated,
    StEsc,
}

/// Splits `output` into display lines with escape sequences and control characters
/// removed. A carriage return keeps only what was written after it, the way a
/// terminal would show a redrawn progress line.
pub fn sanitize_output(output: &str) -> Vec<String> {
    let mut lines: Vec<String> = output
        .split('\n')
        .map(|raw| raw.rsplit('\r').find(|part| !part.is_empty()).unwrap_or(""))
        .map(sanitize_line)
        .collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if lines.len() > MAX_LINES {
        let dropped = lines.len() - MAX_LINES;
        lines.drain(..dropped);
        lines.insert(0, format!("...[{dropped} earlier lines omitted]"));
    }
    lines
}

pub fn sanitize_line(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_LINE_CHARS));
    let mut esc_mode: Option<EscapeMode> = None;
    let mut char_count = 0usize;

    for c in input.chars() {
        if let Some(mode) = esc_mode.as_ref() {
            esc_mode = match mode {
                EscapeMode::Esc => match c {
                    '[' => Some(EscapeMode::Csi),
                    ']' => Some(EscapeMode::Osc),
                    'P' | 'X' | '^' | '_' => Some(EscapeMode::StTerminated),
                    _ => None,
                },
                EscapeMode::Csi if ('@'..='~').contains(&c) => None,
                EscapeMode::Csi => Some(EscapeMode::Csi),
                EscapeMode::Osc => match c {
                    '\x07' => None,
                    '\x1b' => Some(EscapeMode::OscEsc),
                    _ => Some(EscapeMode::Osc),
                },
                EscapeMode::OscEsc => match c {
                    '\\' => None,
                    '\x1b' => Some(EscapeMode::OscEsc),
                    _ => Some(EscapeMode::Osc),
                },
                EscapeMode::StTerminated if c == '\x1b' => Some(EscapeMode::StEsc),
                EscapeMode::StTerminated => Some(EscapeMode::StTerminated),
                EscapeMode::StEsc => match c {
                    '\\' => None,
                    '\x1b' => Some(EscapeMode::StEsc),
                    _ => Some(EscapeMode::StTerminated),
                },
            };
            continue;
        }

        match c {
            '\x1b' => esc_mode = Some(EscapeMode::Esc),
            '\t' => {
                out.push_str("    ");
                char_count += 4;
            }
            c if c.is_control() => {}
            c => {
                out.push(c);
                char_count += 1;
            }
        }

        if char_count >= MAX_LINE_CHARS {
            out.push_str(" ...[truncated]");
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        assert_eq!(sanitize_line("\u{1b}[31merror\u{1b}[0m: nope"), "error: nope");
    }

    #[test]
    fn strips_title_sequences() {
        assert_eq!(sanitize_line("a\u{1b}]0;title\u{7}b"), "ab");
        assert_eq!(sanitize_line("a\u{1b}Ppayload\u{1b}\\b"), "ab");
    }

    #[test]
    fn carriage_return_keeps_last_redraw() {
        let lines = sanitize_output("progress 10%\rprogress 100%\ndone\n\n");
        assert_eq!(lines, ["progress 100%", "done"]);
    }

    #[test]
    fn long_output_keeps_the_tail() {
        let text: String = (0..MAX_LINES + 10).map(|i| format!("line {i}\n")).collect();
        let lines = sanitize_output(&text);
        assert_eq!(lines.len(), MAX_LINES + 1);
        assert!(lines[0].contains("10 earlier lines"));
        assert_eq!(lines.last().unwrap(), &format!("line {}", MAX_LINES + 9));
    }
}
