//! Immutable fact records produced by a single parse of one file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Everything the metric passes need to know about one source file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FileFact {
    /// Repository-relative path
    pub path: PathBuf,
    /// Free functions, including functions nested in other functions
    pub functions: Vec<FunctionFact>,
    /// Classes at any nesting depth, each with its own methods
    pub classes: Vec<ClassFact>,
    pub imports: BTreeSet<ImportFact>,
    pub lines: LineCounts,
    pub module_docstring: Option<String>,
    /// Call targets and identifier loads seen anywhere in the file
    pub usage: UsageCounts,
    /// Assignments whose value is a direct call of a bare name
    pub assigned_calls: Vec<AssignedCall>,
}

impl FileFact {
    /// Free functions followed by every class method.
    pub fn all_functions(&self) -> impl Iterator<Item = &FunctionFact> {
        self.functions
            .iter()
            .chain(self.classes.iter().flat_map(|c| c.methods.iter()))
    }

    pub fn function_count(&self) -> usize {
        self.all_functions().count()
    }

    pub fn has_module_docstring(&self) -> bool {
        self.module_docstring.is_some()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionFact {
    pub name: String,
    pub line: usize,
    /// Decision points plus one
    pub complexity: u32,
    pub docstring: Option<String>,
    /// Statements directly in the body, docstring included
    pub statement_count: usize,
    pub decorators: Vec<String>,
    pub is_async: bool,
    pub is_method: bool,
    /// Body is exactly `return <obj>.<attr>(...)`
    pub is_delegator: bool,
}

impl FunctionFact {
    pub fn is_dunder(&self) -> bool {
        self.name.starts_with("__")
    }

    pub fn has_docstring(&self) -> bool {
        self.docstring.is_some()
    }

    /// True when any decorator's final segment contains one of `markers`.
    /// Name matching only; no attempt is made to resolve what the decorator is.
    pub fn has_decorator_matching(&self, markers: &[String], case_insensitive: bool) -> bool {
        self.decorators.iter().any(|decorator| {
            let last = decorator.rsplit('.').next().unwrap_or(decorator);
            markers.iter().any(|marker| {
                if case_insensitive {
                    last.to_lowercase().contains(&marker.to_lowercase())
                } else {
                    last.contains(marker.as_str())
                }
            })
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassFact {
    pub name: String,
    pub line: usize,
    /// Base expressions rendered as dotted names
    pub bases: Vec<String>,
    pub methods: Vec<FunctionFact>,
    pub docstring: Option<String>,
    pub decorators: Vec<String>,
}

impl ClassFact {
    pub fn has_docstring(&self) -> bool {
        self.docstring.is_some()
    }

    pub fn public_methods(&self) -> impl Iterator<Item = &FunctionFact> {
        self.methods.iter().filter(|m| !m.is_dunder())
    }

    /// Share of non-dunder methods that only forward a call; 0 without any.
    pub fn delegation_ratio(&self) -> f64 {
        let (delegating, total) = self
            .public_methods()
            .fold((0usize, 0usize), |(d, t), m| {
                (d + usize::from(m.is_delegator), t + 1)
            });
        if total == 0 {
            return 0.0;
        }
        delegating as f64 / total as f64
    }

    pub fn has_base_matching(&self, markers: &[String]) -> bool {
        self.bases.iter().any(|base| {
            let last = base.rsplit('.').next().unwrap_or(base);
            markers.iter().any(|marker| last.contains(marker.as_str()))
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    StandardLibrary,
    External,
    Internal,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ImportFact {
    /// Module reference as written, leading dots included
    pub module: String,
    pub kind: ImportKind,
    pub line: usize,
    /// Names pulled in by a `from` import
    pub names: Vec<String>,
}

impl ImportFact {
    /// Number of leading dots in a relative reference.
    pub fn level(&self) -> usize {
        self.module.chars().take_while(|c| *c == '.').count()
    }

    /// Module path after the leading dots.
    pub fn relative_module(&self) -> &str {
        self.module.trim_start_matches('.')
    }

    pub fn top_level(&self) -> &str {
        self.relative_module().split('.').next().unwrap_or_default()
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ImportKind::Internal
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default, Copy)]
pub struct LineCounts {
    pub total: usize,
    pub blank: usize,
    pub comments: usize,
    pub source: usize,
}

impl LineCounts {
    /// Comment lines are lines whose first non-blank character is `#`.
    pub fn from_source(content: &str) -> Self {
        let (total, blank, comments) =
            content
                .lines()
                .fold((0, 0, 0), |(total, blank, comments), line| {
                    let trimmed = line.trim_start();
                    (
                        total + 1,
                        blank + usize::from(trimmed.is_empty()),
                        comments + usize::from(trimmed.starts_with('#')),
                    )
                });

        Self {
            total,
            blank,
            comments,
            source: total - blank - comments,
        }
    }
}

/// Per-file reference tables, folded into a per-run index by the
/// redundancy pass.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UsageCounts {
    /// Callee names: bare names and attribute names of call targets
    pub calls: BTreeMap<String, usize>,
    /// Identifiers read anywhere
    pub names: BTreeMap<String, usize>,
}

impl UsageCounts {
    pub fn record_call(&mut self, name: &str) {
        *self.calls.entry(name.to_string()).or_default() += 1;
    }

    pub fn record_name(&mut self, name: &str) {
        *self.names.entry(name.to_string()).or_default() += 1;
    }

    pub fn merge(mut self, other: UsageCounts) -> UsageCounts {
        for (name, count) in other.calls {
            *self.calls.entry(name).or_default() += count;
        }
        for (name, count) in other.names {
            *self.names.entry(name).or_default() += count;
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignedCall {
    pub callee: String,
    pub line: usize,
}
