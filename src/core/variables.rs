// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/variables.rs
//!
//! Variable resolution and template expansion
//!
//! Replacement templates may reference variables as `{{name}}`. Variables
//! are resolved in declaration order (globals first, then rule-local), and
//! each one may reference any variable resolved before it. References to
//! unknown or not-yet-resolved names stay in the output verbatim.
//!
//! # Date formats
//! Date tokens are substituted literally (`%Y` → `2025`) rather than by
//! handing the whole string to a strftime implementation, so stray `%`
//! sequences and other characters pass through untouched.
//!
//! | Token | Meaning              | Token | Meaning               |
//! |-------|----------------------|-------|-----------------------|
//! | `%Y`  | year (4 digits)      | `%S`  | second (2 digits)     |
//! | `%m`  | month (2 digits)     | `%p`  | AM / PM               |
//! | `%d`  | day (2 digits)       | `%a`  | weekday, abbreviated  |
//! | `%H`  | hour, 24h            | `%A`  | weekday, full         |
//! | `%I`  | hour, 12h            | `%b`  | month, abbreviated    |
//! | `%M`  | minute               | `%B`  | month, full           |

use chrono::{DateTime, TimeDelta, TimeZone};
use nom::{
    bytes::complete::{tag, take_while1},
    sequence::delimited,
    IResult, Parser,
};
use std::{collections::HashMap, fmt};

use crate::core::types::{Rule, VariableDef, VariableKind};

/// Variable values for one expansion, keyed by name
pub type ResolvedVariables = HashMap<String, String>;

/// Date tokens in substitution order
const DATE_TOKENS: &[&str] = &[
    "%Y", "%m", "%d", "%H", "%I", "%M", "%S", "%p", "%a", "%A", "%b", "%B",
];

/// Resolves global then local variables against `now`.
///
/// Each variable first has `{{name}}` references in its own format
/// expanded against the values resolved so far, then its date tokens
/// replaced. An offset that overflows the calendar resolves to an empty
/// string.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use texpand::core::{variables::resolve_variables, VariableDef};
///
/// let now = Utc.with_ymd_and_hms(2025, 3, 9, 14, 5, 0).unwrap();
/// let globals = vec![VariableDef::date("today", "%Y-%m-%d", 0)];
/// let locals = vec![VariableDef::date("stamp", "{{today}} %H:%M", 0)];
///
/// let vars = resolve_variables(&globals, &locals, &now);
/// assert_eq!(vars["stamp"], "2025-03-09 14:05");
/// ```
pub fn resolve_variables<Tz>(
    globals: &[VariableDef],
    locals: &[VariableDef],
    now: &DateTime<Tz>,
) -> ResolvedVariables
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut resolved = ResolvedVariables::new();

    for variable in globals.iter().chain(locals) {
        let value = match variable.kind {
            VariableKind::Date => {
                let format = expand_references(&variable.format, &resolved);
                match shifted(now, variable.offset_seconds) {
                    Some(moment) => format_date(&format, &moment),
                    None => String::new(),
                }
            }
        };
        resolved.insert(variable.name.clone(), value);
    }

    resolved
}

/// Expands a rule's replacement template at `now`.
pub fn render_replacement<Tz>(rule: &Rule, globals: &[VariableDef], now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let variables = resolve_variables(globals, rule.variables(), now);
    expand_references(rule.replacement(), &variables)
}

fn shifted<Tz: TimeZone>(now: &DateTime<Tz>, offset_seconds: i64) -> Option<DateTime<Tz>> {
    TimeDelta::try_seconds(offset_seconds).and_then(|delta| now.clone().checked_add_signed(delta))
}

/// Replaces each date token in `format` with the matching field of `moment`.
pub fn format_date<Tz>(format: &str, moment: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut result = format.to_string();

    for token in DATE_TOKENS {
        if result.contains(token) {
            let value = moment.format(token).to_string();
            result = result.replace(token, &value);
        }
    }

    result
}

/// Piece of a template
#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Reference(&'a str),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parses `{{name}}` at the start of the input
fn reference(input: &str) -> IResult<&str, &str> {
    delimited(tag("{{"), take_while1(is_name_char), tag("}}")).parse(input)
}

/// Splits a template into literal text and references in one pass
fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut parts = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < template.len() {
        let rest = &template[pos..];

        if let Ok((remaining, name)) = reference(rest) {
            if literal_start < pos {
                parts.push(Segment::Text(&template[literal_start..pos]));
            }
            parts.push(Segment::Reference(name));
            pos = template.len() - remaining.len();
            literal_start = pos;
            continue;
        }

        // Skip ahead to the next possible reference
        let step = rest.chars().next().map_or(1, char::len_utf8);
        pos += rest[step..].find("{{").map_or(rest.len(), |i| i + step);
    }

    if literal_start < template.len() {
        parts.push(Segment::Text(&template[literal_start..]));
    }

    parts
}

/// Substitutes every `{{name}}` that has a resolved value.
///
/// Substituted values are not rescanned, so a value that itself contains
/// `{{...}}` is emitted as-is.
pub fn expand_references(template: &str, variables: &ResolvedVariables) -> String {
    let mut output = String::with_capacity(template.len());

    for segment in segments(template) {
        match segment {
            Segment::Text(text) => output.push_str(text),
            Segment::Reference(name) => match variables.get(name) {
                Some(value) => output.push_str(value),
                None => {
                    output.push_str("{{");
                    output.push_str(name);
                    output.push_str("}}");
                }
            },
        }
    }

    output
}
