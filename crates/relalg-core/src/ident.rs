//! Identifier validation shared by domains, attributes, relations and projections

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("identifier pattern is valid"))
}

pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

pub fn validate_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}
