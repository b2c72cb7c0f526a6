//! Command line option parsing.
//!
//! Arguments are split into records using three shapes:
//!
//! - `--name value`: a named option, when `value` does not start with `--`
//! - `--name`: a flag, when followed by another `--` token or nothing
//! - `value`: a positional value
//!
//! The output file is the last positional value.

use crate::error::{ProgenError, Result};
use std::path::PathBuf;

const OPTION_PREFIX: &str = "--";

/// Which occurrence of a repeated option to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence {
    /// Zero-based index into the matching records.
    Nth(usize),
    Last,
}

/// One parsed command line record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOption {
    name: Option<String>,
    value: Option<String>,
}

impl CliOption {
    fn flag(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            value: None,
        }
    }

    fn named(name: &str, value: String) -> Self {
        Self {
            name: Some(name.to_string()),
            value: Some(value),
        }
    }

    fn positional(value: String) -> Self {
        Self {
            name: None,
            value: Some(value),
        }
    }

    /// Option name without the leading `--`; `None` for positional values.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Option value; `None` for flags.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_flag(&self) -> bool {
        self.name.is_some() && self.value.is_none()
    }
}

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    options: Vec<CliOption>,
}

impl Options {
    /// Parse an argument vector. The program name must already be removed.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut options = Vec::with_capacity(args.len());

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            match arg.strip_prefix(OPTION_PREFIX) {
                Some(name) => match args.get(i + 1) {
                    Some(next) if !next.starts_with(OPTION_PREFIX) => {
                        options.push(CliOption::named(name, next.clone()));
                        i += 2;
                    }
                    _ => {
                        options.push(CliOption::flag(name));
                        i += 1;
                    }
                },
                None => {
                    options.push(CliOption::positional(arg.clone()));
                    i += 1;
                }
            }
        }

        Self { options }
    }

    /// Parse the current process arguments.
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Every record, in command line order.
    pub fn options(&self) -> &[CliOption] {
        &self.options
    }

    /// Records carrying `name`.
    pub fn named<'a, 'n: 'a>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a CliOption> + 'a {
        self.options.iter().filter(move |o| o.name() == Some(name))
    }

    /// Whether any record carries `name`.
    pub fn present(&self, name: &str) -> bool {
        self.named(name).next().is_some()
    }

    /// Value of the selected occurrence of `name`. `None` when there is no
    /// such occurrence or it is a flag.
    pub fn value(&self, name: &str, occurrence: Occurrence) -> Option<&str> {
        let matches: Vec<&CliOption> = self
            .options
            .iter()
            .filter(|o| o.name() == Some(name))
            .collect();
        select(&matches, occurrence).and_then(CliOption::value)
    }

    /// Selected positional value.
    pub fn positional(&self, occurrence: Occurrence) -> Option<&str> {
        let matches: Vec<&CliOption> = self.options.iter().filter(|o| o.name().is_none()).collect();
        select(&matches, occurrence).and_then(CliOption::value)
    }

    /// Names of options outside `known`, in order of first appearance.
    pub fn unknown_names<'a>(&'a self, known: &[&str]) -> Vec<&'a str> {
        let mut unknown: Vec<&str> = Vec::new();
        for name in self.options.iter().filter_map(CliOption::name) {
            if !known.contains(&name) && !unknown.contains(&name) {
                unknown.push(name);
            }
        }
        unknown
    }

    /// The output file: the last positional value.
    pub fn output_path(&self) -> Result<PathBuf> {
        self.positional(Occurrence::Last)
            .map(PathBuf::from)
            .ok_or(ProgenError::MissingOutputArgument)
    }
}

fn select<'a>(matches: &[&'a CliOption], occurrence: Occurrence) -> Option<&'a CliOption> {
    match occurrence {
        Occurrence::Nth(index) => matches.get(index).copied(),
        Occurrence::Last => matches.last().copied(),
    }
}
