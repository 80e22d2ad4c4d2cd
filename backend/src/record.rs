// src/record.rs
use sha1::{Digest, Sha1};
use std::fmt;
use uuid::Uuid;

pub const FIELD_SEPARATOR: char = '|';
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Category(name.into())
    }

    pub fn uncategorized() -> Self {
        Category(UNCATEGORIZED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category(s.to_string())
    }
}

/// Content-derived identifier: a UUIDv5 (URL namespace) over the hex SHA-1 of
/// `question + answer + category`. Identical triples always share an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Rendered in place of an id when nothing matches a query.
    pub const NIL: &'static str = "00000000-0000-0000-0000-000000000000";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub question: String,
    pub answer: String,
    pub category: Category,
}

impl Record {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, category: Category) -> Self {
        Record {
            question: question.into(),
            answer: answer.into(),
            category,
        }
    }

    pub fn id(&self) -> RecordId {
        let mut hasher = Sha1::new();
        hasher.update(self.question.as_bytes());
        hasher.update(self.answer.as_bytes());
        hasher.update(self.category.as_str().as_bytes());
        let digest = hex::encode(hasher.finalize());

        RecordId(Uuid::new_v5(&Uuid::NAMESPACE_URL, digest.as_bytes()).to_string())
    }
}

/// Why a non-empty line was not turned into a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    FieldCount(usize),
}

/// Parses one `question|answer[|category]` line.
///
/// Returns `Ok(None)` for blank lines, which are skipped without comment.
pub fn parse_line(line: &str) -> Result<Option<Record>, Rejection> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

    let category = match fields.as_slice() {
        [_, _] => Category::uncategorized(),
        [_, _, category] if category.trim().is_empty() => Category::uncategorized(),
        [_, _, category] => Category::new(category.trim()),
        _ => return Err(Rejection::FieldCount(fields.len())),
    };

    Ok(Some(Record::new(fields[0].trim(), fields[1].trim(), category)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_fields_default_to_uncategorized() {
        let record = parse_line("2+2=?|4").unwrap().unwrap();
        assert_eq!(record.question, "2+2=?");
        assert_eq!(record.answer, "4");
        assert_eq!(record.category.as_str(), UNCATEGORIZED);
    }

    #[test]
    fn empty_third_field_defaults_to_uncategorized() {
        let record = parse_line("Q|A|   ").unwrap().unwrap();
        assert_eq!(record.category, Category::uncategorized());
        assert_eq!(parse_line("Q|A|").unwrap().unwrap().id(), parse_line("Q|A").unwrap().unwrap().id());
    }

    #[test]
    fn fields_are_trimmed() {
        let record = parse_line("  What color is the sky? | Blue |  Science & Nature ")
            .unwrap()
            .unwrap();
        assert_eq!(record.question, "What color is the sky?");
        assert_eq!(record.answer, "Blue");
        assert_eq!(record.category.as_str(), "Science & Nature");
    }

    #[test]
    fn wrong_field_counts_are_rejected() {
        assert_eq!(parse_line("just a question"), Err(Rejection::FieldCount(1)));
        assert_eq!(parse_line("a|b|c|d"), Err(Rejection::FieldCount(4)));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   \t"), Ok(None));
    }

    #[test]
    fn id_is_stable_and_uuid_shaped() {
        let a = Record::new("Q", "A", Category::from("C"));
        let b = Record::new("Q", "A", Category::from("C"));
        assert_eq!(a.id(), b.id());

        let parsed = Uuid::parse_str(a.id().as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 5);
    }

    #[test]
    fn category_is_part_of_identity() {
        let a = Record::new("Q", "A", Category::from("History"));
        let b = Record::new("Q", "A", Category::from("Geography"));
        assert_ne!(a.id(), b.id());
    }
}
