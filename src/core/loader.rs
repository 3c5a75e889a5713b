use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::error::MazeError;
use crate::core::grid::{CellKind, Grid};

// Quoted weight token, or any single non-separator character.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]*)"|([^\s,])"#).expect("static token regex"))
}

fn tokenize(line: &str) -> Vec<(String, bool)> {
    token_pattern()
        .captures_iter(line)
        .filter_map(|cap| {
            if let Some(q) = cap.get(1) {
                Some((q.as_str().trim().to_string(), true))
            } else {
                cap.get(2).map(|m| (m.as_str().to_string(), false))
            }
        })
        .collect()
}

fn classify(token: &str, quoted: bool) -> Option<(CellKind, i32)> {
    if !quoted {
        return match token {
            "#" => Some((CellKind::Wall, 0)),
            "S" => Some((CellKind::Start, 0)),
            "G" => Some((CellKind::Goal, 0)),
            _ => None,
        };
    }
    token.parse::<i32>().ok().map(|w| (CellKind::Road, w))
}

/// Parses the maze text format.
///
/// One row per line; each token is `#`, `S`, `G` or a quoted weight such as
/// `"3"`. The first row fixes the column count and every other row must
/// match it. Blank lines are ignored but line numbers in errors stay 1-based
/// physical line numbers.
pub fn parse_maze(text: &str) -> Result<Grid, MazeError> {
    let mut cells = Vec::new();
    let mut weights = Vec::new();
    let mut cols: Option<usize> = None;
    let mut rows = 0;
    let mut start_seen = false;
    let mut goal_seen = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let tokens = tokenize(line);
        let expected = *cols.get_or_insert(tokens.len());
        if tokens.len() != expected {
            return Err(MazeError::RowLength {
                line: line_no,
                expected,
                found: tokens.len(),
            });
        }

        for (col, (token, quoted)) in tokens.iter().enumerate() {
            let (kind, weight) = classify(token, *quoted).ok_or_else(|| MazeError::InvalidToken {
                line: line_no,
                column: col + 1,
                token: token.clone(),
            })?;

            let seen = match kind {
                CellKind::Start => Some((&mut start_seen, "start")),
                CellKind::Goal => Some((&mut goal_seen, "goal")),
                _ => None,
            };
            if let Some((flag, name)) = seen {
                if *flag {
                    return Err(MazeError::Duplicate {
                        kind: name,
                        line: line_no,
                        column: col + 1,
                    });
                }
                *flag = true;
            }

            cells.push(kind);
            weights.push(weight);
        }
        rows += 1;
    }

    match cols {
        Some(c) if c > 0 && rows > 0 => Ok(Grid::new(rows, c, cells, weights)),
        _ => Err(MazeError::Empty),
    }
}

impl FromStr for Grid {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_maze(s)
    }
}

impl Grid {
    /// Reads and parses a maze file; the file name becomes the grid label.
    pub fn load(path: impl AsRef<Path>) -> Result<Grid, MazeError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MazeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(parse_maze(&text)?.with_label(label))
    }
}
