//! Line-driven iterator behind [`crate::parse_tl_file`].

use crate::errors::ParseError;
use crate::tl::{Category, Definition};

pub(crate) struct TlIterator<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    category: Category,
    /// Text of a definition spanning several lines, until its `;`.
    pending: String,
}

impl<'a> TlIterator<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            lines: src.lines().enumerate(),
            category: Category::Types,
            pending: String::new(),
        }
    }
}

impl Iterator for TlIterator<'_> {
    /// 1-based line of the terminating `;`, and the parse result.
    type Item = (usize, Result<Definition, ParseError>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (index, line) = self.lines.next()?;
            let line = match line.find("//") {
                Some(pos) => &line[..pos],
                None => line,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match trimmed {
                "---functions---" => { self.category = Category::Functions; continue; }
                "---types---"     => { self.category = Category::Types;     continue; }
                _ => {}
            }

            self.pending.push(' ');
            self.pending.push_str(trimmed);
            if !trimmed.ends_with(';') {
                continue;
            }

            let raw = std::mem::take(&mut self.pending);
            let raw = raw.trim().trim_end_matches(';').trim();
            if raw.is_empty() {
                continue;
            }

            let result = raw.parse::<Definition>().map(|mut d| {
                d.category = self.category;
                d
            });
            return Some((index + 1, result));
        }
    }
}
