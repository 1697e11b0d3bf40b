//! Locating and decoding the container data embedded in the operator's page.
//!
//! The page carries the data as script assignments of the form
//! `districts = [...]` and `oContainerModel = [...]`. Both the locator and the
//! extractor work on that textual shape only; they do not interpret the rest
//! of the markup.

use std::iter;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::model::{Container, District, Records};
use crate::ports::{ExtractError, PayloadLocator};

/// Script variable names holding the two record collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNames {
    /// Variable assigned the district array.
    pub districts: String,
    /// Variable assigned the container array.
    pub containers: String,
}

impl VariableNames {
    /// Construct the pair of recognised names.
    #[must_use]
    pub fn new<D: Into<String>, C: Into<String>>(districts: D, containers: C) -> Self {
        Self {
            districts: districts.into(),
            containers: containers.into(),
        }
    }

    fn recognizes(&self, name: &str) -> bool {
        name == self.districts || name == self.containers
    }
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("script pattern is valid")
    })
}

// Matches up to and including the opening bracket of an array assignment.
fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*\[").expect("assignment pattern is valid")
    })
}

/// One `name = [...]` occurrence inside a script.
struct Assignment<'a> {
    name: &'a str,
    literal: Result<&'a str, ExtractError>,
}

// Yields only recognised names; other assignments are stepped over unscanned.
fn assignments<'a>(
    text: &'a str,
    variables: &'a VariableNames,
) -> impl Iterator<Item = Assignment<'a>> + 'a {
    let mut position = 0;
    iter::from_fn(move || {
        loop {
            let captures = assignment_pattern().captures_at(text, position)?;
            let matched = captures.get(0)?;
            let name = captures.get(1)?.as_str();
            position = matched.end();
            if !variables.recognizes(name) {
                continue;
            }

            let open = matched.end().saturating_sub(1);
            let rest = text.get(open..)?;
            let literal = match literal_end(rest).and_then(|end| rest.get(..end)) {
                Some(literal) => {
                    position = open + literal.len();
                    Ok(literal)
                }
                None => Err(ExtractError::UnterminatedLiteral {
                    variable: name.to_owned(),
                }),
            };
            return Some(Assignment { name, literal });
        }
    })
}

// Byte length of the bracketed literal at the start of `text`, honouring JSON strings.
fn literal_end(text: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

fn is_empty_literal(literal: &str) -> bool {
    literal
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .is_some_and(|inner| inner.trim().is_empty())
}

/// Finds the first `<script>` element whose text assigns a recognised variable.
#[derive(Debug, Clone)]
pub struct ScriptBlockLocator {
    variables: VariableNames,
}

impl ScriptBlockLocator {
    /// Create a locator looking for the given variables.
    #[must_use]
    pub fn new(variables: VariableNames) -> Self {
        Self { variables }
    }
}

impl PayloadLocator for ScriptBlockLocator {
    fn locate(&self, document: &str) -> Option<String> {
        script_pattern()
            .captures_iter(document)
            .filter_map(|captures| captures.get(1))
            .map(|body| body.as_str())
            .find(|body| assignments(body, &self.variables).next().is_some())
            .map(str::to_owned)
    }
}

/// Decodes the district and container arrays out of a located payload.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    variables: VariableNames,
}

impl RecordExtractor {
    /// Create an extractor for the given variables.
    #[must_use]
    pub fn new(variables: VariableNames) -> Self {
        Self { variables }
    }

    /// Decode every recognised assignment in `payload`.
    ///
    /// An empty array literal counts as "not provided" and leaves the earlier
    /// value, if any, in place. A later non-empty assignment replaces an
    /// earlier one.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] when a recognised literal is cut off or is
    /// not a valid array of records.
    pub fn extract(&self, payload: &str) -> Result<Records, ExtractError> {
        let mut districts: Option<Vec<District>> = None;
        let mut containers: Option<Vec<Container>> = None;

        for assignment in assignments(payload, &self.variables) {
            let literal = assignment.literal?;
            if is_empty_literal(literal) {
                trace!(variable = assignment.name, "skipping empty declaration");
                continue;
            }

            if assignment.name == self.variables.districts {
                districts = Some(decode(literal)?);
            } else {
                containers = Some(decode(literal)?);
            }
        }

        let records = Records {
            districts: districts.unwrap_or_default(),
            containers: containers.unwrap_or_default(),
        };
        debug!(
            districts = records.districts.len(),
            containers = records.containers.len(),
            "extracted records"
        );
        Ok(records)
    }
}

fn decode<T: DeserializeOwned>(literal: &str) -> Result<Vec<T>, ExtractError> {
    serde_json::from_str(literal).map_err(ExtractError::from)
}
