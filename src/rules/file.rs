//! Rule file parser
//!
//! A rule file holds one rule per logical line:
//!
//! ```text
//! # comment
//! kitty, moggy = cat
//! cat | dog --> pet
//! kitten -->
//!     baby, [small,
//!     cute]
//! #@include more-rules.txt
//! ```
//!
//! `alias, ... = tag` declares aliases, `query --> tagset` an implication.
//! A left side ending in `,` or `|` and a tag set ending in `,` continue on
//! the next line.

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::RuleRow;
use super::error::RuleFileError;
use crate::tags;

const MAX_INCLUDE_DEPTH: usize = 16;

/// One parsed rule file entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleExpression {
    /// Every name in `aliases` is an alternative spelling of `tag`
    Alias { aliases: Vec<String>, tag: String },
    /// Pictures matching `trigger` also get the tags of `consequence`
    Implication { trigger: String, consequence: String },
}

/// Contents of a rule file, split by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFile {
    /// `(alias, canonical)` pairs
    pub aliases: Vec<(String, String)>,
    /// Implication rules numbered in file order
    pub rules: Vec<RuleRow>,
}

impl RuleFile {
    #[must_use]
    pub fn from_expressions(expressions: Vec<RuleExpression>) -> Self {
        let mut file = Self::default();
        for expression in expressions {
            match expression {
                RuleExpression::Alias { aliases, tag } => {
                    file.aliases
                        .extend(aliases.into_iter().map(|alias| (alias, tag.clone())));
                }
                RuleExpression::Implication {
                    trigger,
                    consequence,
                } => {
                    let order = u32::try_from(file.rules.len()).unwrap_or(u32::MAX);
                    file.rules.push(RuleRow {
                        trigger,
                        consequence,
                        order,
                    });
                }
            }
        }
        file
    }
}

/// Read and parse a rule file; includes resolve relative to its directory
///
/// # Errors
/// Returns `RuleFileError` if the file cannot be read or is malformed
pub fn load_rule_file(path: &Path) -> Result<RuleFile, RuleFileError> {
    let name = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| RuleFileError::new(&name, 0, format!("Cannot open file: {e}")))?;
    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let expressions = parse_rule_file(&name, BufReader::new(file), root)?;
    Ok(RuleFile::from_expressions(expressions))
}

/// Parse rule file text
///
/// `#@include` paths are resolved against `include_root`.
///
/// # Errors
/// Returns `RuleFileError` naming the file and line of the first problem
pub fn parse_rule_file<R: BufRead>(
    file: &str,
    reader: R,
    include_root: &Path,
) -> Result<Vec<RuleExpression>, RuleFileError> {
    RuleFileParser::new(file)?.parse(file, reader, include_root, 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Rule,
    Separator,
    AliasTarget,
    TagSet,
    EndOrTagSet,
    End,
}

#[derive(Debug, Default)]
struct Pending {
    left: String,
    right: String,
    alias: bool,
}

impl Pending {
    fn finish(self) -> RuleExpression {
        if self.alias {
            RuleExpression::Alias {
                aliases: self
                    .left
                    .split(',')
                    .map(|alias| alias.trim().to_string())
                    .collect(),
                tag: self.right,
            }
        } else {
            RuleExpression::Implication {
                trigger: self.left,
                consequence: self.right,
            }
        }
    }
}

struct RuleFileParser {
    separator: Regex,
    alias_syntax: Regex,
}

impl RuleFileParser {
    fn new(file: &str) -> Result<Self, RuleFileError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| RuleFileError::new(file, 0, e.to_string()))
        };
        Ok(Self {
            separator: compile(r"-->|=")?,
            alias_syntax: compile(
                r"^[^\s:!|\[\](),][^!|\[\](),]*(?:,\s*[^\s:!|\[\](),][^!|\[\](),]*)*$",
            )?,
        })
    }

    fn parse<R: BufRead>(
        &self,
        file: &str,
        reader: R,
        include_root: &Path,
        depth: usize,
    ) -> Result<Vec<RuleExpression>, RuleFileError> {
        let mut expressions = Vec::new();
        let mut state = State::Rule;
        let mut pending = Pending::default();
        let mut line_number = 0;

        for line in reader.lines() {
            line_number += 1;
            let line = line.map_err(|e| RuleFileError::new(file, line_number, e.to_string()))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(command) = line.strip_prefix("#@") {
                let Some(target) = command.strip_prefix("include ") else {
                    return Err(RuleFileError::new(
                        file,
                        line_number,
                        format!("Unknown command: {line}"),
                    ));
                };
                if state != State::Rule {
                    return Err(RuleFileError::new(
                        file,
                        line_number,
                        "Include inside an unfinished rule",
                    ));
                }
                let included = self.include(file, line_number, target.trim(), include_root, depth)?;
                expressions.extend(included);
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            for token in self.tokens(line) {
                state = self
                    .step(state, &mut pending, token)
                    .map_err(|message| RuleFileError::new(file, line_number, message))?;
            }

            let complete = match state {
                State::End => true,
                State::EndOrTagSet => !pending.right.ends_with(','),
                _ => false,
            };
            if complete {
                expressions.push(std::mem::take(&mut pending).finish());
                state = State::Rule;
            }
        }

        if state != State::Rule {
            return Err(RuleFileError::new(file, line_number, "Unexpected end of file"));
        }
        Ok(expressions)
    }

    fn include(
        &self,
        file: &str,
        line_number: usize,
        target: &str,
        include_root: &Path,
        depth: usize,
    ) -> Result<Vec<RuleExpression>, RuleFileError> {
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(RuleFileError::new(file, line_number, "Includes nested too deeply"));
        }
        let included = File::open(include_root.join(target)).map_err(|_| {
            RuleFileError::new(file, line_number, format!("Cannot open file {target}"))
        })?;
        self.parse(target, BufReader::new(included), include_root, depth + 1)
    }

    /// Split a line at `=` and `-->`, keeping the separators as tokens
    fn tokens<'a>(&self, line: &'a str) -> Vec<&'a str> {
        let mut tokens = Vec::new();
        let mut start = 0;
        for found in self.separator.find_iter(line) {
            let value = line[start..found.start()].trim();
            if !value.is_empty() {
                tokens.push(value);
            }
            tokens.push(found.as_str());
            start = found.end();
        }
        let value = line[start..].trim();
        if !value.is_empty() {
            tokens.push(value);
        }
        tokens
    }

    fn step(&self, state: State, pending: &mut Pending, token: &str) -> Result<State, String> {
        let is_separator = token == "=" || token == "-->";
        match state {
            State::Rule => {
                if is_separator {
                    return Err(format!("Expected rule, got: {token}"));
                }
                pending.left = token.to_string();
                Ok(State::Separator)
            }
            State::Separator => match token {
                "=" => {
                    if !self.alias_syntax.is_match(&pending.left) {
                        return Err(format!("{} is not a valid tag alias", pending.left));
                    }
                    pending.alias = true;
                    Ok(State::AliasTarget)
                }
                "-->" => Ok(State::TagSet),
                _ if pending.left.ends_with(',') || pending.left.ends_with('|') => {
                    pending.left.push_str(token);
                    Ok(State::Separator)
                }
                _ => Err(format!("Expected = or -->, got: {token}")),
            },
            State::AliasTarget | State::TagSet => {
                if is_separator {
                    return Err(format!("Expected tag list, got: {token}"));
                }
                pending.right = token.to_string();
                if state == State::AliasTarget {
                    if token.contains(',') {
                        return Err(format!("Alias target must be a single tag, got: {token}"));
                    }
                    tags::validate_tag_name(token).map_err(|e| e.to_string())?;
                    Ok(State::End)
                } else {
                    Ok(State::EndOrTagSet)
                }
            }
            State::EndOrTagSet => {
                if is_separator || !pending.right.ends_with(',') {
                    return Err(format!("Expected tag set, got: {token}"));
                }
                pending.right.push_str(token);
                Ok(State::EndOrTagSet)
            }
            State::End => Err(format!("Expected end of line after tag name, got: {token}")),
        }
    }
}
