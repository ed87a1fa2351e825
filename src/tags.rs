//! Free-form metadata collected from a picture.

use std::{borrow::Cow, fmt};

/// Names of the tags produced by the built-in decoders.
pub mod names {
    pub const COMMENT: &str = "comment";
    pub const IMAGE_HORIZONTAL_PPI: &str = "image-horizontal-ppi";
    pub const IMAGE_VERTICAL_PPI: &str = "image-vertical-ppi";
    pub const IMAGE_ORIENTATION: &str = "image-orientation";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const ARTIST: &str = "artist";
    pub const COPYRIGHT: &str = "copyright";
    pub const DATE_TIME: &str = "datetime";
    pub const APPLICATION_NAME: &str = "application-name";
    pub const DEVICE_MANUFACTURER: &str = "device-manufacturer";
    pub const DEVICE_MODEL: &str = "device-model";
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Double(f64),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Double(d) => Some(d),
            _ => None,
        }
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => s.fmt(f),
            Self::Double(d) => d.fmt(f),
        }
    }
}

/// An ordered multimap from tag name to values.
///
/// Tags keep the order in which they were first inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagList {
    entries: Vec<(Cow<'static, str>, Vec<TagValue>)>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of distinct tag names.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Sets `name` to `value`, replacing any values it had before.
    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<TagValue>) {
        self.replace_all(name.into(), vec![value.into()]);
    }

    /// Adds `value` to the values of `name`.
    pub fn append(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<TagValue>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    fn replace_all(&mut self, name: Cow<'static, str>, values: Vec<TagValue>) {
        match self.position(&name) {
            Some(i) => self.entries[i].1 = values,
            None => self.entries.push((name, values)),
        }
    }

    /// Merges all tags of `other` into `self`. Tags present in both lists take the values from
    /// `other`.
    pub fn merge_replace(&mut self, other: TagList) {
        for (name, values) in other.entries {
            self.replace_all(name, values);
        }
    }

    /// Returns the values of `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> &[TagValue] {
        self.position(name)
            .map(|i| &self.entries[i].1[..])
            .unwrap_or_default()
    }

    /// Returns the first value of `name`.
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.get_all(name).first()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TagValue::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(TagValue::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TagValue])> {
        self.entries.iter().map(|(n, v)| (&**n, &v[..]))
    }
}

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, values)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}=")?;
            for (j, value) in values.iter().enumerate() {
                if j != 0 {
                    f.write_str("|")?;
                }
                match value {
                    TagValue::String(s) => write!(f, "{s:?}")?,
                    TagValue::Double(d) => write!(f, "{d:?}")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces() {
        let mut tags = TagList::new();
        tags.insert(names::COMMENT, "first");
        tags.append(names::ARTIST, "a");
        tags.append(names::ARTIST, "b");
        tags.insert(names::COMMENT, "second");

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get_str(names::COMMENT), Some("second"));
        assert_eq!(
            tags.get_all(names::ARTIST),
            &[TagValue::from("a"), TagValue::from("b")]
        );
        assert_eq!(tags.get("missing"), None);
    }

    #[test]
    fn merge_replace_keeps_order() {
        let mut tags = TagList::new();
        tags.insert(names::COMMENT, "mine");
        tags.insert(names::IMAGE_HORIZONTAL_PPI, 72.0);

        let mut other = TagList::new();
        other.insert(names::TITLE, "title");
        other.insert(names::COMMENT, "theirs");
        tags.merge_replace(other);

        let order = tags.iter().map(|(n, _)| n).collect::<Vec<_>>();
        assert_eq!(order, [names::COMMENT, names::IMAGE_HORIZONTAL_PPI, names::TITLE]);
        assert_eq!(tags.get_str(names::COMMENT), Some("theirs"));
        assert_eq!(tags.get_f64(names::IMAGE_HORIZONTAL_PPI), Some(72.0));
        assert_eq!(
            tags.to_string(),
            r#"comment="theirs", image-horizontal-ppi=72.0, title="title""#
        );
    }
}
