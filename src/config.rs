//! Configuration file loading for the command-line tool.
//!
//! Settings can be kept in a TOML file passed with `--config`. Every section
//! is optional; command-line flags override the file.
//!
//! # Example Configuration
//!
//! ```toml
//! [compare]
//! check = "similar"
//! selector = "name-and-attributes"
//! match_attributes = ["id"]
//! compare_xml_declaration = false
//! fail_fast = false
//! ignore = ["**/timestamp", "/order/@generated"]
//!
//! [input]
//! ignore_whitespace = true
//! normalize_whitespace = false
//! ignore_comments = true
//!
//! [namespaces]
//! soap = "http://schemas.xmlsoap.org/soap/envelope/"
//! ```

use crate::comparison::CheckFor;
use crate::diff::DiffConfig;
use crate::error::ConfigError;
use crate::evaluator::{self, StopWhenDifferent, StopWhenSimilar};
use crate::filter::PathPattern;
use crate::parser::ParseOptions;
use crate::selector::{self, SharedSelector};
use crate::xpath::NamespaceContext;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Root of the configuration file.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct XmlDiffConfig {
    #[serde(default)]
    pub compare: CompareSection,

    #[serde(default)]
    pub input: InputSection,

    /// Prefix to namespace URI bindings used when rendering locations.
    #[serde(default)]
    pub namespaces: NamespaceContext,
}

/// How documents are compared.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct CompareSection {
    /// `similar` or `identical`
    #[serde(default)]
    pub check: Option<String>,

    /// Element selector name, see [`SelectorKind`].
    #[serde(default)]
    pub selector: Option<String>,

    /// Attribute local names used by the `name-and-attributes` selector.
    #[serde(default)]
    pub match_attributes: Vec<String>,

    #[serde(default)]
    pub compare_xml_declaration: Option<bool>,

    /// Stop at the first real difference.
    #[serde(default)]
    pub fail_fast: Option<bool>,

    /// Location patterns whose differences are ignored.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// Normalisation of parsed input.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct InputSection {
    #[serde(default)]
    pub ignore_whitespace: Option<bool>,

    #[serde(default)]
    pub normalize_whitespace: Option<bool>,

    #[serde(default)]
    pub ignore_comments: Option<bool>,
}

impl XmlDiffConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let name = path.to_string_lossy().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: name.clone(),
            source,
        })?;
        Self::parse(&content, &name)
    }

    pub fn parse(content: &str, name: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlError {
            path: name.to_string(),
            source,
        })
    }

    /// Resolves the file into effective settings.
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();
        Ok(Settings {
            check: match self.compare.check {
                Some(check) => parse_check(&check)?,
                None => defaults.check,
            },
            selector: match self.compare.selector {
                Some(name) => name.parse()?,
                None => defaults.selector,
            },
            match_attributes: self.compare.match_attributes,
            compare_xml_declaration: self
                .compare
                .compare_xml_declaration
                .unwrap_or(defaults.compare_xml_declaration),
            fail_fast: self.compare.fail_fast.unwrap_or(defaults.fail_fast),
            ignore: self.compare.ignore,
            parse: ParseOptions {
                ignore_whitespace: self.input.ignore_whitespace.unwrap_or(false),
                normalize_whitespace: self.input.normalize_whitespace.unwrap_or(false),
                ignore_comments: self.input.ignore_comments.unwrap_or(false),
            },
            namespaces: self.namespaces,
        })
    }
}

/// Element selectors available by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorKind {
    #[default]
    Name,
    NameAndText,
    NameAndTextRec,
    NameAndAttributes,
    NameAndAllAttributes,
}

impl SelectorKind {
    /// Builds the selector; `match_attributes` feeds `NameAndAttributes`.
    pub fn build(&self, match_attributes: &[String]) -> SharedSelector {
        match self {
            SelectorKind::Name => selector::by_name(),
            SelectorKind::NameAndText => selector::by_name_and_text(),
            SelectorKind::NameAndTextRec => selector::by_name_and_text_rec(),
            SelectorKind::NameAndAttributes => {
                selector::by_name_and_attributes(match_attributes.iter().cloned())
            }
            SelectorKind::NameAndAllAttributes => selector::by_name_and_all_attributes(),
        }
    }
}

impl FromStr for SelectorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SelectorKind::Name),
            "name-and-text" => Ok(SelectorKind::NameAndText),
            "name-and-text-rec" => Ok(SelectorKind::NameAndTextRec),
            "name-and-attributes" => Ok(SelectorKind::NameAndAttributes),
            "name-and-all-attributes" => Ok(SelectorKind::NameAndAllAttributes),
            _ => Err(ConfigError::unknown_selector(s)),
        }
    }
}

pub fn parse_check(s: &str) -> Result<CheckFor, ConfigError> {
    match s {
        "similar" => Ok(CheckFor::Similar),
        "identical" => Ok(CheckFor::Identical),
        _ => Err(ConfigError::UnknownCheck {
            mode: s.to_string(),
        }),
    }
}

/// Parses a `PREFIX=URI` namespace binding.
pub fn parse_namespace_binding(binding: &str) -> Result<(String, String), ConfigError> {
    match binding.split_once('=') {
        Some((prefix, uri)) if !prefix.is_empty() && !uri.is_empty() => {
            Ok((prefix.to_string(), uri.to_string()))
        }
        _ => Err(ConfigError::invalid_namespace(binding)),
    }
}

/// Effective settings of a command-line run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub check: CheckFor,
    pub selector: SelectorKind,
    pub match_attributes: Vec<String>,
    pub compare_xml_declaration: bool,
    pub fail_fast: bool,
    pub ignore: Vec<String>,
    pub parse: ParseOptions,
    pub namespaces: NamespaceContext,
}

impl Settings {
    pub fn diff_config(&self) -> DiffConfig {
        let mut config = DiffConfig::default()
            .with_selectors([self.selector.build(&self.match_attributes)])
            .with_xml_declaration(self.compare_xml_declaration)
            .check_for(self.check);
        config.namespace_context = self.namespaces.clone();

        if !self.ignore.is_empty() {
            let patterns = self.ignore.iter().map(|p| PathPattern::parse(p)).collect();
            config.difference_evaluator = evaluator::ignore_paths(patterns);
        }
        // halt on the first outcome the severity filter keeps
        if self.fail_fast {
            config = match self.check {
                CheckFor::Similar => config.with_controller(StopWhenDifferent),
                CheckFor::Identical => config.with_controller(StopWhenSimilar),
            };
        }
        config
    }
}
