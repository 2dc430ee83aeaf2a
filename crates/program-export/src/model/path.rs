use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DIVIDER: char = '.';
const ENTITIES: &str = "entities";
const APPLICANT: &str = "applicant";
const APPLICATION: &str = "application";

/// Hierarchical address of one scalar or list answer.
///
/// Segments are kept in their string form, so a repeated entity segment reads
/// `household_members[2]` and an unindexed collection reads `household_members[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Root of every applicant answer.
    pub fn applicant() -> Self {
        Self::parse(APPLICANT)
    }

    /// Parse a dotted path, accepting an optional `$.` JSON path prefix.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let trimmed = trimmed.strip_prefix("$.").unwrap_or(trimmed);
        let segments = trimmed
            .split(DIVIDER)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, or an empty string for the empty path.
    pub fn key_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn parent(&self) -> Path {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    pub fn join(&self, segment: &str) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(
            segment
                .split(DIVIDER)
                .filter(|part| !part.is_empty())
                .map(str::to_string),
        );
        Self { segments }
    }

    /// Reference the repeated entity at `index`, adding the array marker if absent.
    pub fn at_index(&self, index: usize) -> Path {
        let base = split_index(self.key_name()).0;
        self.parent().join_raw(format!("{base}[{index}]"))
    }

    /// Strip a trailing array reference: `applicant.members[2]` becomes `applicant.members`.
    pub fn without_array_reference(&self) -> Path {
        let base = split_index(self.key_name()).0.to_string();
        self.parent().join_raw(base)
    }

    /// Nest repeated entities under an `entities` array for the JSON envelope.
    ///
    /// `applicant.members[3].name` becomes `applicant.members.entities[3].name`.
    pub fn as_nested_entities_path(&self) -> Path {
        let mut segments = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match split_index(segment) {
                (base, Some(index)) if base != ENTITIES => {
                    segments.push(base.to_string());
                    segments.push(format!("{ENTITIES}[{index}]"));
                }
                _ => segments.push(segment.clone()),
            }
        }
        Self { segments }
    }

    /// Swap the leading `applicant` segment for `application`.
    ///
    /// Returns `None` for paths that are not rooted at the applicant.
    pub fn as_application_path(&self) -> Option<Path> {
        match self.segments.split_first() {
            Some((first, rest)) if first == APPLICANT => {
                let mut segments = Vec::with_capacity(self.segments.len());
                segments.push(APPLICATION.to_string());
                segments.extend(rest.iter().cloned());
                Some(Self { segments })
            }
            _ => None,
        }
    }

    fn join_raw(&self, segment: String) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

/// Split `name[3]` into (`name`, Some("3")) and `name[]` into (`name`, Some("")).
pub(crate) fn split_index(segment: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = segment.strip_suffix(']') {
        if let Some(open) = stripped.rfind('[') {
            let index = &stripped[open + 1..];
            if index.chars().all(|c| c.is_ascii_digit()) {
                return (&stripped[..open], Some(index));
            }
        }
    }
    (segment, None)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
