//! `git status --porcelain` parsing
//!
//! Maps porcelain v1 entries onto change events so that a change set can be
//! built from the working tree itself (manual commits, status previews).

use autocommit_core::ChangeEvent;

/// Parse porcelain v1 output into change events
///
/// Renames and copies yield a deletion of the source (renames only) and an
/// addition of the destination. Unrecognized lines are skipped.
pub fn parse_porcelain(output: &str) -> Vec<ChangeEvent> {
    let mut changes = Vec::new();

    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }
        let (code, rest) = line.split_at(2);
        let path_part = &rest[1..];
        let mut code_chars = code.chars();
        let index = code_chars.next().unwrap_or(' ');
        let worktree = code_chars.next().unwrap_or(' ');

        match (index, worktree) {
            ('?', '?') | ('A', _) => changes.push(ChangeEvent::added(unquote(path_part))),
            ('R', _) | ('C', _) => {
                if let Some((from, to)) = path_part.split_once(" -> ") {
                    if index == 'R' {
                        changes.push(ChangeEvent::deleted(unquote(from)));
                    }
                    changes.push(ChangeEvent::added(unquote(to)));
                }
            }
            ('D', _) | (_, 'D') => changes.push(ChangeEvent::deleted(unquote(path_part))),
            ('!', '!') => {}
            _ => changes.push(ChangeEvent::modified(unquote(path_part))),
        }
    }

    changes
}

/// Strip git's C-style quoting from a path
fn unquote(path: &str) -> String {
    let Some(inner) = path.strip_prefix('"').and_then(|p| p.strip_suffix('"')) else {
        return path.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.bytes().peekable();
    while let Some(b) = chars.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(d @ b'0'..=b'7') => {
                // Three-digit octal escape for non-ASCII bytes
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&o @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(o - b'0');
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
