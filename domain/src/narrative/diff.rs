//! Word-level diff between an agent's raw output and its enforced rewrite.

use std::fmt;

/// A run of consecutive words with the same status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffToken {
    Equal(String),
    Inserted(String),
    Removed(String),
}

impl DiffToken {
    pub fn text(&self) -> &str {
        match self {
            DiffToken::Equal(s) | DiffToken::Inserted(s) | DiffToken::Removed(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordDiff {
    tokens: Vec<DiffToken>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Inserted,
    Removed,
}

impl WordDiff {
    /// Diff two texts on whitespace-separated words using a longest common
    /// subsequence. Removals are emitted before insertions at a substitution.
    pub fn between(before: &str, after: &str) -> Self {
        let a: Vec<&str> = before.split_whitespace().collect();
        let b: Vec<&str> = after.split_whitespace().collect();

        // lcs[i][j] = LCS length of a[i..] and b[j..]
        let mut lcs = vec![vec![0u32; b.len() + 1]; a.len() + 1];
        for i in (0..a.len()).rev() {
            for j in (0..b.len()).rev() {
                lcs[i][j] = if a[i] == b[j] {
                    lcs[i + 1][j + 1] + 1
                } else {
                    lcs[i + 1][j].max(lcs[i][j + 1])
                };
            }
        }

        let mut ops: Vec<(Op, &str)> = Vec::with_capacity(a.len().max(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i] == b[j] {
                ops.push((Op::Equal, a[i]));
                i += 1;
                j += 1;
            } else if lcs[i + 1][j] >= lcs[i][j + 1] {
                ops.push((Op::Removed, a[i]));
                i += 1;
            } else {
                ops.push((Op::Inserted, b[j]));
                j += 1;
            }
        }
        ops.extend(a[i..].iter().map(|w| (Op::Removed, *w)));
        ops.extend(b[j..].iter().map(|w| (Op::Inserted, *w)));

        Self {
            tokens: coalesce(ops),
        }
    }

    pub fn tokens(&self) -> &[DiffToken] {
        &self.tokens
    }

    /// True when the rewrite kept every word.
    pub fn is_unchanged(&self) -> bool {
        self.tokens
            .iter()
            .all(|t| matches!(t, DiffToken::Equal(_)))
    }

    pub fn inserted_words(&self) -> usize {
        self.count(|t| matches!(t, DiffToken::Inserted(_)))
    }

    pub fn removed_words(&self) -> usize {
        self.count(|t| matches!(t, DiffToken::Removed(_)))
    }

    fn count(&self, pred: impl Fn(&DiffToken) -> bool) -> usize {
        self.tokens
            .iter()
            .filter(|t| pred(t))
            .map(|t| t.text().split_whitespace().count())
            .sum()
    }
}

fn coalesce(ops: Vec<(Op, &str)>) -> Vec<DiffToken> {
    let mut tokens = Vec::new();
    let mut current: Option<(Op, String)> = None;

    for (op, word) in ops {
        match &mut current {
            Some((kind, text)) if *kind == op => {
                text.push(' ');
                text.push_str(word);
            }
            _ => {
                if let Some(run) = current.take() {
                    tokens.push(to_token(run));
                }
                current = Some((op, word.to_string()));
            }
        }
    }
    if let Some(run) = current {
        tokens.push(to_token(run));
    }
    tokens
}

fn to_token((op, text): (Op, String)) -> DiffToken {
    match op {
        Op::Equal => DiffToken::Equal(text),
        Op::Inserted => DiffToken::Inserted(text),
        Op::Removed => DiffToken::Removed(text),
    }
}

/// Plain-text rendering in `[-removed-]{+inserted+}` notation.
impl fmt::Display for WordDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match token {
                DiffToken::Equal(s) => f.write_str(s)?,
                DiffToken::Inserted(s) => write!(f, "{{+{s}+}}")?,
                DiffToken::Removed(s) => write!(f, "[-{s}-]")?,
            }
        }
        Ok(())
    }
}
