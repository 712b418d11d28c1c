//! Addressing nodes inside a field list.
//!
//! A path starts at a top-level index and then steps through object
//! properties (by name) or into an array's items descriptor. The text form
//! is dot separated, with `[]` for an items step: `0.address.[].street`.

use crate::field::SchemaField;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ITEMS_TOKEN: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("Field path is empty")]
    Empty,

    #[error("Field path must start with a top-level index, got '{0}'")]
    InvalidIndex(String),

    #[error("Field path '{0}' contains an empty segment")]
    EmptySegment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Property(String),
    Items,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    index: usize,
    steps: Vec<PathStep>,
}

impl FieldPath {
    /// The top-level field at `index`.
    pub fn root(index: usize) -> Self {
        Self {
            index,
            steps: Vec::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.steps.push(PathStep::Property(name.into()));
        self
    }

    pub fn items(mut self) -> Self {
        self.steps.push(PathStep::Items);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Whether a property called `name` can be written as a path step:
    /// no `.` separator and not the items token.
    pub fn is_addressable_name(name: &str) -> bool {
        !name.is_empty() && !name.contains('.') && name != ITEMS_TOKEN
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_step(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    /// The path one step up, or `None` for a top-level path.
    pub fn parent(&self) -> Option<FieldPath> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            index: self.index,
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Same path with the final step replaced.
    pub(crate) fn with_last(&self, step: PathStep) -> FieldPath {
        match self.parent() {
            Some(mut parent) => {
                parent.steps.push(step);
                parent
            }
            None => self.clone(),
        }
    }

    pub fn resolve<'a>(&self, fields: &'a [SchemaField]) -> Option<&'a SchemaField> {
        let mut node = fields.get(self.index)?;
        for step in &self.steps {
            node = match step {
                PathStep::Property(name) => node.properties()?.get(name)?,
                PathStep::Items => node.items()?,
            };
        }
        Some(node)
    }

    pub fn resolve_mut<'a>(&self, fields: &'a mut [SchemaField]) -> Option<&'a mut SchemaField> {
        let mut node = fields.get_mut(self.index)?;
        for step in &self.steps {
            node = match step {
                PathStep::Property(name) => node.properties_mut()?.get_mut(name)?,
                PathStep::Items => node.items_mut()?,
            };
        }
        Some(node)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)?;
        for step in &self.steps {
            match step {
                PathStep::Property(name) => write!(f, ".{}", name)?,
                PathStep::Items => write!(f, ".{}", ITEMS_TOKEN)?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PathParseError::Empty);
        }
        let mut segments = s.split('.');
        let first = segments.next().unwrap_or_default();
        let index = first
            .parse::<usize>()
            .map_err(|_| PathParseError::InvalidIndex(first.to_string()))?;

        let mut path = FieldPath::root(index);
        for segment in segments {
            path = match segment {
                "" => return Err(PathParseError::EmptySegment(s.to_string())),
                ITEMS_TOKEN => path.items(),
                name => path.property(name),
            };
        }
        Ok(path)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SchemaField> {
        vec![
            SchemaField::string("title"),
            SchemaField::object(
                "customer",
                vec![SchemaField::array(
                    "addresses",
                    SchemaField::object("address", vec![SchemaField::string("street")]),
                )],
            ),
        ]
    }

    #[test]
    fn test_parse_and_display() {
        let path: FieldPath = "1.customer.addresses.[].street".parse().unwrap();
        assert_eq!(path.index(), 1);
        assert_eq!(path.steps().len(), 4);
        assert_eq!(path.steps()[2], PathStep::Items);
        assert_eq!(path.to_string(), "1.customer.addresses.[].street");

        assert_eq!("".parse::<FieldPath>(), Err(PathParseError::Empty));
        assert!(matches!("x.y".parse::<FieldPath>(), Err(PathParseError::InvalidIndex(_))));
        assert!(matches!("0..y".parse::<FieldPath>(), Err(PathParseError::EmptySegment(_))));
    }

    #[test]
    fn test_addressable_names() {
        assert!(FieldPath::is_addressable_name("street"));
        assert!(FieldPath::is_addressable_name("[]x"));
        assert!(!FieldPath::is_addressable_name(""));
        assert!(!FieldPath::is_addressable_name("a.b"));
        assert!(!FieldPath::is_addressable_name("[]"));
    }

    #[test]
    fn test_resolve() {
        let fields = sample();
        let path = FieldPath::root(1)
            .property("addresses")
            .items()
            .property("street");
        assert_eq!(path.resolve(&fields).unwrap().name, "street");

        // The index already selects "customer"
        let path = FieldPath::root(1).property("customer");
        assert!(path.resolve(&fields).is_none());

        // Scalars have no items
        assert!(FieldPath::root(0).items().resolve(&fields).is_none());

        let path: FieldPath = "1.addresses".parse().unwrap();
        assert_eq!(path.resolve(&fields).unwrap().name, "addresses");

        let street: FieldPath = "1.addresses.[].street".parse().unwrap();
        assert_eq!(street.resolve(&fields).unwrap().name, "street");

        assert!(FieldPath::root(5).resolve(&fields).is_none());
    }

    #[test]
    fn test_resolve_mut() {
        let mut fields = sample();
        let path: FieldPath = "1.addresses.[]".parse().unwrap();
        path.resolve_mut(&mut fields).unwrap().set_description("One address");
        assert_eq!(path.resolve(&fields).unwrap().description(), Some("One address"));
    }

    #[test]
    fn test_parent() {
        let path: FieldPath = "0.a.[].b".parse().unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "0.a.[]");
        assert!(FieldPath::root(0).parent().is_none());
        assert_eq!(
            path.with_last(PathStep::Property("c".into())).to_string(),
            "0.a.[].c"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let path: FieldPath = "2.order.total".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"2.order.total\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
