//! Target identifiers.

use crate::error::{Error, Result};
use std::fmt;

const ALLOWED_PUNCTUATION: &[char] = &['-', '_', '.', '+', '*', ':', '@'];

fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation("identifier must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(Error::validation(format!("identifier `{}` is reserved", name)));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || ALLOWED_PUNCTUATION.contains(c)))
    {
        return Err(Error::validation(format!(
            "identifier `{}` contains `{}`, which is not URL-safe",
            name, c
        )));
    }
    Ok(())
}

/// A single URL-safe target identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id(String);

impl Id {
    /// Validate and wrap an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate(&id)?;
        Ok(Self(id))
    }

    /// The identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty set of unique URL-safe identifiers.
///
/// Renders as a comma separated path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Names(Vec<String>);

impl Names {
    /// Validate a list of identifiers, keeping their order.
    ///
    /// Fails on an empty list, a duplicate, or an identifier that is not
    /// URL-safe.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validated: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            validate(&name)?;
            if validated.contains(&name) {
                return Err(Error::validation(format!("duplicate identifier `{}`", name)));
            }
            validated.push(name);
        }

        if validated.is_empty() {
            return Err(Error::validation("at least one identifier is required"));
        }

        Ok(Self(validated))
    }

    /// A set with one identifier.
    pub fn single(name: impl Into<String>) -> Result<Self> {
        Self::new([name.into()])
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether `name` is in the set.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }
}

impl From<Id> for Names {
    fn from(id: Id) -> Self {
        Self(vec![id.0])
    }
}

impl fmt::Display for Names {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}
