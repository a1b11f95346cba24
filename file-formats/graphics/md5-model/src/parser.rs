//! Line tokenizer shared by the `.md5mesh` and `.md5anim` readers
//!
//! Both formats are line oriented. A line is split into whitespace separated
//! tokens; double-quoted strings form a single token (quotes removed),
//! parentheses are separators only, and `//` starts a comment that runs to
//! the end of the line.

use std::str::FromStr;

use crate::error::{Md5Error, Result};
use crate::skeleton::MD5_VERSION;

/// A tokenized, non-empty line together with its 1-based line number
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    pub number: usize,
    pub tokens: Vec<String>,
}

impl Line {
    /// First token of the line, used as the statement keyword
    pub fn keyword(&self) -> &str {
        self.tokens.first().map_or("", String::as_str)
    }

    /// Whether this line closes a `{ ... }` block
    pub fn is_block_end(&self) -> bool {
        self.keyword() == "}"
    }

    /// Whether the line ends by opening a block
    pub fn opens_block(&self) -> bool {
        self.tokens.last().is_some_and(|t| t == "{")
    }

    /// Parse the token at `index` into `T`, naming `what` in the error
    pub fn field<T: FromStr>(&self, index: usize, what: &str) -> Result<T> {
        let token = self.tokens.get(index).ok_or_else(|| {
            Md5Error::parse(self.number, format!("missing {what} in '{}'", self.keyword()))
        })?;
        token.parse::<T>().map_err(|_| {
            Md5Error::parse(self.number, format!("invalid {what} '{token}'"))
        })
    }

    /// Parse three consecutive float tokens starting at `index`
    pub fn vec3(&self, index: usize, what: &str) -> Result<[f32; 3]> {
        Ok([
            self.field(index, what)?,
            self.field(index + 1, what)?,
            self.field(index + 2, what)?,
        ])
    }

    /// Parse every token of the line as a float
    pub fn floats(&self) -> Result<Vec<f32>> {
        (0..self.tokens.len())
            .map(|i| self.field::<f32>(i, "value"))
            .collect()
    }

    /// Check an `MD5Version` line against the supported format version
    pub fn check_version(&self) -> Result<()> {
        let actual: i32 = self.field(1, "version")?;
        if actual != MD5_VERSION {
            return Err(Md5Error::UnsupportedVersion {
                expected: MD5_VERSION,
                actual,
            });
        }
        Ok(())
    }

    /// Require at least `count` tokens on the line
    pub fn expect_tokens(&self, count: usize, what: &str) -> Result<()> {
        if self.tokens.len() < count {
            return Err(Md5Error::parse(
                self.number,
                format!(
                    "{what} needs {count} fields, found {}",
                    self.tokens.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Iterator over the tokenized, non-empty lines of a document
pub(crate) struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> LineReader<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().enumerate(),
        }
    }

    /// Return the next line inside a block, failing if the input ends first
    pub fn next_in_block(&mut self, block: &str) -> Result<Line> {
        self.next().ok_or_else(|| {
            Md5Error::Validation(format!("unexpected end of file inside '{block}' block"))
        })
    }
}

impl Iterator for LineReader<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let tokens = tokenize(raw);
            if !tokens.is_empty() {
                return Some(Line {
                    number: index + 1,
                    tokens,
                });
            }
        }
        None
    }
}

/// Split a raw line into tokens
pub(crate) fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                flush(&mut tokens, &mut current);
                let mut quoted = String::new();
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                    quoted.push(q);
                }
                tokens.push(quoted);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '(' | ')' => flush(&mut tokens, &mut current),
            c if c.is_whitespace() => flush(&mut tokens, &mut current),
            c => current.push(c),
        }
    }
    flush(&mut tokens, &mut current);
    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}
