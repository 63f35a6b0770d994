//! Single-parse fact extraction for Python sources.
//!
//! Each file is parsed exactly once. The syntax tree is reduced to a
//! [`FileFact`] by a pure fold: every statement and expression produces a
//! [`Scan`] value and sibling scans are combined with [`Scan::merge`]. No
//! counter is shared between nodes, so the same tree always yields the same
//! facts.
//!
//! ```rust,ignore
//! use repo_vitals::extraction::SyntaxExtractor;
//! use std::path::Path;
//!
//! let extractor = SyntaxExtractor::default();
//! let fact = extractor.extract(Path::new("pkg/app.py"), "def main():\n    pass\n")?;
//! assert_eq!(fact.functions[0].complexity, 1);
//! ```

use crate::config::ImportsConfig;
use crate::core::{FailureKind, FileFailure};
use crate::extraction::types::{
    AssignedCall, ClassFact, FileFact, FunctionFact, ImportFact, ImportKind, LineCounts,
    UsageCounts,
};
use crossbeam::channel::{self, RecvTimeoutError};
use rustpython_parser::ast;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Stack for the per-file worker thread. Deeply nested expressions recurse.
const WORKER_STACK_BYTES: usize = 16 * 1024 * 1024;

/// Parses one file and reduces it to facts.
#[derive(Clone)]
pub struct SyntaxExtractor {
    stdlib: Arc<HashSet<String>>,
}

impl Default for SyntaxExtractor {
    fn default() -> Self {
        Self::new(&ImportsConfig::default())
    }
}

impl SyntaxExtractor {
    pub fn new(imports: &ImportsConfig) -> Self {
        Self {
            stdlib: Arc::new(imports.stdlib_modules.iter().cloned().collect()),
        }
    }

    /// Extract facts from already-loaded source text.
    ///
    /// # Errors
    ///
    /// Returns a [`FailureKind::Parse`] failure when the text is not valid
    /// Python.
    pub fn extract(&self, path: &Path, content: &str) -> Result<FileFact, FileFailure> {
        let source_path = path.to_string_lossy();
        let parsed = rustpython_parser::parse(content, rustpython_parser::Mode::Module, &source_path)
            .map_err(|e| FileFailure::parse(path, e.to_string()))?;

        let body = match parsed {
            ast::Mod::Module(module) => module.body,
            _ => Vec::new(),
        };

        let lines = LineIndex::new(content);
        let ctx = ScanContext {
            lines: &lines,
            stdlib: &self.stdlib,
        };
        let scan = scan_body(&ctx, &body);

        Ok(FileFact {
            path: path.to_path_buf(),
            functions: scan.functions,
            classes: scan.classes,
            imports: scan.imports,
            lines: LineCounts::from_source(content),
            module_docstring: docstring(&body),
            usage: scan.usage,
            assigned_calls: scan.assigned_calls,
        })
    }

    /// Read and extract one file on a worker thread, giving up after `timeout`.
    ///
    /// `relative` is the path recorded in the facts; `absolute` is the path read
    /// from disk. Files larger than `max_bytes` are refused without reading.
    ///
    /// A timeout abandons the worker thread rather than stopping it: the parse
    /// runs to completion in the background and its result is dropped.
    /// Cancelling the run does not reach a worker that is already parsing.
    pub fn extract_file(
        &self,
        absolute: &Path,
        relative: &Path,
        max_bytes: u64,
        timeout: Duration,
    ) -> Result<FileFact, FileFailure> {
        let size = crate::io::file_size(absolute)
            .map_err(|e| FileFailure::new(relative, FailureKind::Unreadable, e.to_string()))?;
        if size > max_bytes {
            return Err(FileFailure::new(
                relative,
                FailureKind::TooLarge,
                format!("{size} bytes exceeds the {max_bytes} byte limit"),
            ));
        }

        let (tx, rx) = channel::bounded(1);
        let extractor = self.clone();
        let source = absolute.to_path_buf();
        let recorded: PathBuf = relative.to_path_buf();
        std::thread::Builder::new()
            .name("repo-vitals-extract".to_string())
            .stack_size(WORKER_STACK_BYTES)
            .spawn(move || {
                let outcome = match crate::io::read_source(&source) {
                    Ok(content) => extractor.extract(&recorded, &content),
                    Err(e) => Err(FileFailure::new(
                        &recorded,
                        FailureKind::Unreadable,
                        e.to_string(),
                    )),
                };
                // The receiver is gone once the deadline has passed.
                let _ = tx.send(outcome);
            })
            .map_err(|e| {
                FileFailure::new(
                    relative,
                    FailureKind::Unreadable,
                    format!("could not start extraction worker: {e}"),
                )
            })?;

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(FileFailure::timeout(
                relative,
                format!("no result after {} ms", timeout.as_millis()),
            )),
            Err(RecvTimeoutError::Disconnected) => {
                Err(FileFailure::parse(relative, "extraction worker panicked"))
            }
        }
    }
}

/// Maps byte offsets to 1-based line numbers.
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset).max(1)
    }
}

struct ScanContext<'a> {
    lines: &'a LineIndex,
    stdlib: &'a HashSet<String>,
}

impl ScanContext<'_> {
    fn line_at(&self, offset: usize) -> usize {
        self.lines.line_of(offset)
    }

    fn classify(&self, module: &str) -> ImportKind {
        if module.starts_with('.') {
            return ImportKind::Internal;
        }
        let top = module.split('.').next().unwrap_or_default();
        if self.stdlib.contains(top) {
            ImportKind::StandardLibrary
        } else {
            ImportKind::External
        }
    }
}

/// Partial facts for a subtree.
///
/// `decisions` counts branch points that belong to the innermost enclosing
/// function. Function and class boundaries reset it to zero.
#[derive(Default)]
struct Scan {
    decisions: u32,
    functions: Vec<FunctionFact>,
    classes: Vec<ClassFact>,
    imports: BTreeSet<ImportFact>,
    usage: UsageCounts,
    assigned_calls: Vec<AssignedCall>,
}

impl Scan {
    fn decisions(count: usize) -> Self {
        Self {
            decisions: u32::try_from(count).unwrap_or(u32::MAX),
            ..Self::default()
        }
    }

    fn merge(mut self, other: Scan) -> Scan {
        self.decisions = self.decisions.saturating_add(other.decisions);
        self.functions.extend(other.functions);
        self.classes.extend(other.classes);
        self.imports.extend(other.imports);
        self.usage = self.usage.merge(other.usage);
        self.assigned_calls.extend(other.assigned_calls);
        self
    }

    /// Drop branch points that are not inside any function.
    fn detached(self) -> Scan {
        Scan {
            decisions: 0,
            ..self
        }
    }
}

fn scan_body(ctx: &ScanContext, body: &[ast::Stmt]) -> Scan {
    body.iter()
        .map(|stmt| scan_stmt(ctx, stmt))
        .fold(Scan::default(), Scan::merge)
}

fn scan_exprs<'e>(ctx: &ScanContext, exprs: impl IntoIterator<Item = &'e ast::Expr>) -> Scan {
    exprs
        .into_iter()
        .map(|expr| scan_expr(ctx, expr))
        .fold(Scan::default(), Scan::merge)
}

fn scan_opt(ctx: &ScanContext, expr: &Option<Box<ast::Expr>>) -> Scan {
    scan_exprs(ctx, expr.as_deref())
}

fn scan_stmt(ctx: &ScanContext, stmt: &ast::Stmt) -> Scan {
    use ast::Stmt::*;
    match stmt {
        FunctionDef(def) => {
            let parts = FunctionParts {
                name: def.name.as_str(),
                body: &def.body,
                decorators: &def.decorator_list,
                args: &def.args,
                returns: def.returns.as_deref(),
                line: ctx.line_at(def.range.start().to_usize()),
                is_async: false,
            };
            function_scan(ctx, parts, false)
        }
        AsyncFunctionDef(def) => {
            let parts = FunctionParts {
                name: def.name.as_str(),
                body: &def.body,
                decorators: &def.decorator_list,
                args: &def.args,
                returns: def.returns.as_deref(),
                line: ctx.line_at(def.range.start().to_usize()),
                is_async: true,
            };
            function_scan(ctx, parts, false)
        }
        ClassDef(def) => class_scan(ctx, def),
        If(s) => Scan::decisions(1)
            .merge(scan_expr(ctx, &s.test))
            .merge(scan_body(ctx, &s.body))
            .merge(scan_body(ctx, &s.orelse)),
        For(s) => Scan::decisions(1)
            .merge(scan_exprs(ctx, [&*s.target, &*s.iter]))
            .merge(scan_body(ctx, &s.body))
            .merge(scan_body(ctx, &s.orelse)),
        AsyncFor(s) => Scan::decisions(1)
            .merge(scan_exprs(ctx, [&*s.target, &*s.iter]))
            .merge(scan_body(ctx, &s.body))
            .merge(scan_body(ctx, &s.orelse)),
        While(s) => Scan::decisions(1)
            .merge(scan_expr(ctx, &s.test))
            .merge(scan_body(ctx, &s.body))
            .merge(scan_body(ctx, &s.orelse)),
        Try(s) => try_scan(ctx, &s.body, &s.handlers, &s.orelse, &s.finalbody),
        TryStar(s) => try_scan(ctx, &s.body, &s.handlers, &s.orelse, &s.finalbody),
        With(s) => with_scan(ctx, &s.items, &s.body),
        AsyncWith(s) => with_scan(ctx, &s.items, &s.body),
        Match(s) => s.cases.iter().fold(scan_expr(ctx, &s.subject), |acc, case| {
            acc.merge(Scan::decisions(1))
                .merge(scan_opt(ctx, &case.guard))
                .merge(scan_body(ctx, &case.body))
        }),
        Return(s) => scan_opt(ctx, &s.value),
        Assign(s) => assigned_call(ctx, &s.value)
            .merge(scan_exprs(ctx, &s.targets))
            .merge(scan_expr(ctx, &s.value)),
        AnnAssign(s) => {
            let value = match s.value.as_deref() {
                Some(value) => assigned_call(ctx, value).merge(scan_expr(ctx, value)),
                None => Scan::default(),
            };
            value.merge(scan_expr(ctx, &s.target))
        }
        AugAssign(s) => scan_exprs(ctx, [&*s.target, &*s.value]),
        Expr(s) => scan_expr(ctx, &s.value),
        Raise(s) => scan_opt(ctx, &s.exc).merge(scan_opt(ctx, &s.cause)),
        Assert(s) => scan_expr(ctx, &s.test).merge(scan_opt(ctx, &s.msg)),
        Delete(s) => scan_exprs(ctx, &s.targets),
        Import(s) => {
            let line = ctx.line_at(s.range.start().to_usize());
            let imports = s
                .names
                .iter()
                .map(|alias| {
                    let module = alias.name.to_string();
                    ImportFact {
                        kind: ctx.classify(&module),
                        module,
                        line,
                        names: Vec::new(),
                    }
                })
                .collect();
            Scan {
                imports,
                ..Scan::default()
            }
        }
        ImportFrom(s) => {
            let level = s.level.as_ref().map(|l| l.to_usize()).unwrap_or(0);
            let module = format!(
                "{}{}",
                ".".repeat(level),
                s.module.as_ref().map(|m| m.as_str()).unwrap_or_default()
            );
            let fact = ImportFact {
                kind: ctx.classify(&module),
                module,
                line: ctx.line_at(s.range.start().to_usize()),
                names: s.names.iter().map(|alias| alias.name.to_string()).collect(),
            };
            Scan {
                imports: BTreeSet::from([fact]),
                ..Scan::default()
            }
        }
        _ => Scan::default(),
    }
}

fn try_scan(
    ctx: &ScanContext,
    body: &[ast::Stmt],
    handlers: &[ast::ExceptHandler],
    orelse: &[ast::Stmt],
    finalbody: &[ast::Stmt],
) -> Scan {
    let handled = handlers.iter().fold(Scan::default(), |acc, handler| {
        let ast::ExceptHandler::ExceptHandler(h) = handler;
        acc.merge(Scan::decisions(1))
            .merge(scan_opt(ctx, &h.type_))
            .merge(scan_body(ctx, &h.body))
    });
    scan_body(ctx, body)
        .merge(handled)
        .merge(scan_body(ctx, orelse))
        .merge(scan_body(ctx, finalbody))
}

fn with_scan(ctx: &ScanContext, items: &[ast::WithItem], body: &[ast::Stmt]) -> Scan {
    items
        .iter()
        .fold(Scan::default(), |acc, item| {
            acc.merge(scan_expr(ctx, &item.context_expr))
                .merge(scan_opt(ctx, &item.optional_vars))
        })
        .merge(scan_body(ctx, body))
}

fn assigned_call(ctx: &ScanContext, value: &ast::Expr) -> Scan {
    match value {
        ast::Expr::Call(call) => match call.func.as_ref() {
            ast::Expr::Name(name) => Scan {
                assigned_calls: vec![AssignedCall {
                    callee: name.id.to_string(),
                    line: ctx.line_at(call.range.start().to_usize()),
                }],
                ..Scan::default()
            },
            _ => Scan::default(),
        },
        _ => Scan::default(),
    }
}

fn scan_expr(ctx: &ScanContext, expr: &ast::Expr) -> Scan {
    use ast::Expr::*;
    match expr {
        BoolOp(e) => Scan::decisions(e.values.len().saturating_sub(1)).merge(scan_exprs(ctx, &e.values)),
        NamedExpr(e) => scan_exprs(ctx, [&*e.target, &*e.value]),
        BinOp(e) => scan_exprs(ctx, [&*e.left, &*e.right]),
        UnaryOp(e) => scan_expr(ctx, &e.operand),
        // Lambda branches count toward the enclosing function.
        Lambda(e) => scan_expr(ctx, &e.body).merge(scan_arguments(ctx, &e.args)),
        IfExp(e) => Scan::decisions(1).merge(scan_exprs(ctx, [&*e.test, &*e.body, &*e.orelse])),
        Dict(e) => scan_exprs(ctx, e.keys.iter().flatten()).merge(scan_exprs(ctx, &e.values)),
        Set(e) => scan_exprs(ctx, &e.elts),
        ListComp(e) => scan_expr(ctx, &e.elt).merge(scan_generators(ctx, &e.generators)),
        SetComp(e) => scan_expr(ctx, &e.elt).merge(scan_generators(ctx, &e.generators)),
        GeneratorExp(e) => scan_expr(ctx, &e.elt).merge(scan_generators(ctx, &e.generators)),
        DictComp(e) => scan_exprs(ctx, [&*e.key, &*e.value]).merge(scan_generators(ctx, &e.generators)),
        Await(e) => scan_expr(ctx, &e.value),
        Yield(e) => scan_opt(ctx, &e.value),
        YieldFrom(e) => scan_expr(ctx, &e.value),
        Compare(e) => scan_expr(ctx, &e.left).merge(scan_exprs(ctx, &e.comparators)),
        Call(e) => {
            let mut scan = scan_expr(ctx, &e.func)
                .merge(scan_exprs(ctx, &e.args))
                .merge(scan_exprs(ctx, e.keywords.iter().map(|k| &k.value)));
            if let Some(callee) = callee_name(&e.func) {
                scan.usage.record_call(callee);
            }
            scan
        }
        FormattedValue(e) => scan_expr(ctx, &e.value).merge(scan_opt(ctx, &e.format_spec)),
        JoinedStr(e) => scan_exprs(ctx, &e.values),
        Attribute(e) => scan_expr(ctx, &e.value),
        Subscript(e) => scan_exprs(ctx, [&*e.value, &*e.slice]),
        Starred(e) => scan_expr(ctx, &e.value),
        Name(e) => {
            let mut scan = Scan::default();
            if matches!(e.ctx, ast::ExprContext::Load) {
                scan.usage.record_name(e.id.as_str());
            }
            scan
        }
        List(e) => scan_exprs(ctx, &e.elts),
        Tuple(e) => scan_exprs(ctx, &e.elts),
        Slice(e) => scan_opt(ctx, &e.lower)
            .merge(scan_opt(ctx, &e.upper))
            .merge(scan_opt(ctx, &e.step)),
        _ => Scan::default(),
    }
}

/// Each generator is a loop; each `if` clause is a branch.
fn scan_generators(ctx: &ScanContext, generators: &[ast::Comprehension]) -> Scan {
    generators.iter().fold(Scan::default(), |acc, generator| {
        acc.merge(Scan::decisions(1 + generator.ifs.len()))
            .merge(scan_exprs(ctx, [&generator.target, &generator.iter]))
            .merge(scan_exprs(ctx, &generator.ifs))
    })
}

fn callee_name(func: &ast::Expr) -> Option<&str> {
    match func {
        ast::Expr::Name(name) => Some(name.id.as_str()),
        ast::Expr::Attribute(attr) => Some(attr.attr.as_str()),
        _ => None,
    }
}

struct FunctionParts<'a> {
    name: &'a str,
    body: &'a [ast::Stmt],
    decorators: &'a [ast::Expr],
    args: &'a ast::Arguments,
    returns: Option<&'a ast::Expr>,
    line: usize,
    is_async: bool,
}

/// Build the fact for one function. The returned scan carries whatever was
/// nested inside it; its own branch points are folded into the fact.
fn function_fact(ctx: &ScanContext, parts: FunctionParts, is_method: bool) -> (FunctionFact, Scan) {
    let inner = scan_body(ctx, parts.body);
    let fact = FunctionFact {
        name: parts.name.to_string(),
        line: parts.line,
        complexity: inner.decisions.saturating_add(1),
        docstring: docstring(parts.body),
        statement_count: parts.body.len(),
        decorators: parts.decorators.iter().filter_map(dotted_name).collect(),
        is_async: parts.is_async,
        is_method,
        is_delegator: is_delegating_body(parts.body),
    };
    let rest = inner
        .detached()
        .merge(scan_exprs(ctx, parts.decorators).detached())
        .merge(scan_arguments(ctx, parts.args).detached())
        .merge(scan_exprs(ctx, parts.returns).detached());
    (fact, rest)
}

/// Annotations and default values of a parameter list.
fn scan_arguments(ctx: &ScanContext, args: &ast::Arguments) -> Scan {
    let with_defaults = args
        .posonlyargs
        .iter()
        .chain(&args.args)
        .chain(&args.kwonlyargs);
    let annotations = with_defaults
        .clone()
        .map(|a| &a.def)
        .chain(args.vararg.as_deref())
        .chain(args.kwarg.as_deref())
        .filter_map(|a| a.annotation.as_deref());
    let defaults = with_defaults.filter_map(|a| a.default.as_deref());
    scan_exprs(ctx, annotations).merge(scan_exprs(ctx, defaults))
}

fn function_scan(ctx: &ScanContext, parts: FunctionParts, is_method: bool) -> Scan {
    let (fact, rest) = function_fact(ctx, parts, is_method);
    Scan {
        functions: vec![fact],
        ..Scan::default()
    }
    .merge(rest)
}

fn class_scan(ctx: &ScanContext, def: &ast::StmtClassDef) -> Scan {
    let (methods, rest) = def.body.iter().fold(
        (Vec::new(), Scan::default()),
        |(mut methods, rest), stmt| {
            let nested = match stmt {
                ast::Stmt::FunctionDef(f) => Some(FunctionParts {
                    name: f.name.as_str(),
                    body: &f.body,
                    decorators: &f.decorator_list,
                    args: &f.args,
                    returns: f.returns.as_deref(),
                    line: ctx.line_at(f.range.start().to_usize()),
                    is_async: false,
                }),
                ast::Stmt::AsyncFunctionDef(f) => Some(FunctionParts {
                    name: f.name.as_str(),
                    body: &f.body,
                    decorators: &f.decorator_list,
                    args: &f.args,
                    returns: f.returns.as_deref(),
                    line: ctx.line_at(f.range.start().to_usize()),
                    is_async: true,
                }),
                _ => None,
            };
            match nested {
                Some(parts) => {
                    let (fact, inner) = function_fact(ctx, parts, true);
                    methods.push(fact);
                    (methods, rest.merge(inner))
                }
                None => (methods, rest.merge(scan_stmt(ctx, stmt))),
            }
        },
    );

    let fact = ClassFact {
        name: def.name.to_string(),
        line: ctx.line_at(def.range.start().to_usize()),
        bases: def.bases.iter().filter_map(dotted_name).collect(),
        methods,
        docstring: docstring(&def.body),
        decorators: def.decorator_list.iter().filter_map(dotted_name).collect(),
    };

    Scan {
        classes: vec![fact],
        ..Scan::default()
    }
    .merge(rest)
    .merge(scan_exprs(ctx, &def.bases))
    .merge(scan_exprs(ctx, def.keywords.iter().map(|k| &k.value)))
    .merge(scan_exprs(ctx, &def.decorator_list))
    .detached()
}

/// Render `a.b.c`, `name(...)` and `Base[T]` as a dotted name.
fn dotted_name(expr: &ast::Expr) -> Option<String> {
    match expr {
        ast::Expr::Name(name) => Some(name.id.to_string()),
        ast::Expr::Attribute(attr) => Some(match dotted_name(&attr.value) {
            Some(prefix) => format!("{}.{}", prefix, attr.attr.as_str()),
            None => attr.attr.to_string(),
        }),
        ast::Expr::Call(call) => dotted_name(&call.func),
        ast::Expr::Subscript(sub) => dotted_name(&sub.value),
        _ => None,
    }
}

/// Leading string literal of a body, trimmed; empty strings do not count.
fn docstring(body: &[ast::Stmt]) -> Option<String> {
    let ast::Stmt::Expr(stmt) = body.first()? else {
        return None;
    };
    let ast::Expr::Constant(constant) = stmt.value.as_ref() else {
        return None;
    };
    match &constant.value {
        ast::Constant::Str(text) => {
            let cleaned = text
                .lines()
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string();
            (!cleaned.is_empty()).then_some(cleaned)
        }
        _ => None,
    }
}

/// `return <expr>.<attr>(...)` and nothing else.
fn is_delegating_body(body: &[ast::Stmt]) -> bool {
    let [ast::Stmt::Return(ret)] = body else {
        return false;
    };
    match ret.value.as_deref() {
        Some(ast::Expr::Call(call)) => matches!(call.func.as_ref(), ast::Expr::Attribute(_)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn extract(code: &str) -> FileFact {
        SyntaxExtractor::default()
            .extract(Path::new("pkg/module.py"), code)
            .expect("Failed to extract")
    }

    #[test]
    fn test_simple_function() {
        let fact = extract(indoc! {r#"
            def add(a, b):
                return a + b
        "#});
        assert_eq!(fact.functions.len(), 1);
        let func = &fact.functions[0];
        assert_eq!(func.name, "add");
        assert_eq!(func.line, 1);
        assert_eq!(func.complexity, 1);
        assert!(!func.is_async);
        assert!(!func.is_method);
    }

    #[test]
    fn test_branches_and_boolean_operators() {
        let fact = extract(indoc! {r#"
            def check(x, y):
                if x and y or x:
                    return 1
                elif y:
                    return 2
                for i in range(3):
                    while i:
                        i -= 1
                try:
                    pass
                except ValueError:
                    pass
                except KeyError:
                    pass
                return [v for v in y if v] if x else None
        "#});
        // if, elif, `and`/`or` (2), for, while, two handlers, comprehension
        // loop and its `if`, conditional expression
        assert_eq!(fact.functions[0].complexity, 12);
    }

    #[test]
    fn test_lambda_counts_toward_enclosing_function() {
        let fact = extract(indoc! {r#"
            def outer(items):
                key = lambda v: v if v else 0
                return sorted(items, key=key)
        "#});
        assert_eq!(fact.functions.len(), 1);
        assert_eq!(fact.functions[0].complexity, 2);
    }

    #[test]
    fn test_nested_function_is_separate() {
        let fact = extract(indoc! {r#"
            def outer(x):
                def inner(y):
                    if y:
                        return 1
                    return 0
                return inner(x)
        "#});
        let names: Vec<_> = fact.functions.iter().map(|f| (f.name.as_str(), f.complexity)).collect();
        assert_eq!(names, vec![("outer", 1), ("inner", 2)]);
    }

    #[test]
    fn test_async_function_and_line_numbers() {
        let fact = extract(indoc! {r#"
            import os


            async def fetch():
                return await os.getcwd()
        "#});
        assert_eq!(fact.functions[0].line, 4);
        assert!(fact.functions[0].is_async);
    }

    #[test]
    fn test_class_methods_and_docstrings() {
        let fact = extract(indoc! {r#"
            """Module docs."""

            class Service(base.Handler):
                """Handles things."""

                def __init__(self, client):
                    self.client = client

                def get(self, key):
                    return self.client.get(key)

                def put(self, key, value):
                    """Store a value."""
                    self.client.put(key, value)
                    return True
        "#});
        assert_eq!(fact.module_docstring.as_deref(), Some("Module docs."));
        assert!(fact.functions.is_empty());
        let class = &fact.classes[0];
        assert_eq!(class.name, "Service");
        assert_eq!(class.bases, vec!["base.Handler".to_string()]);
        assert_eq!(class.docstring.as_deref(), Some("Handles things."));
        assert_eq!(class.methods.len(), 3);
        assert!(class.methods.iter().all(|m| m.is_method));
        assert!(class.methods[1].is_delegator);
        assert!(!class.methods[2].is_delegator);
        assert_eq!(class.methods[2].docstring.as_deref(), Some("Store a value."));
        assert_eq!(class.delegation_ratio(), 0.5);
        assert_eq!(fact.function_count(), 3);
    }

    #[test]
    fn test_import_classification() {
        let fact = extract(indoc! {r#"
            import os.path
            import requests
            from . import sibling
            from ..core.models import User, Group
            from typing import List
        "#});
        let imports: Vec<_> = fact
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.kind))
            .collect();
        assert_eq!(
            imports,
            vec![
                (".", ImportKind::Internal),
                ("..core.models", ImportKind::Internal),
                ("os.path", ImportKind::StandardLibrary),
                ("requests", ImportKind::External),
                ("typing", ImportKind::StandardLibrary),
            ]
        );
        let models = fact
            .imports
            .iter()
            .find(|i| i.module == "..core.models")
            .unwrap();
        assert_eq!(models.names, vec!["User".to_string(), "Group".to_string()]);
        assert_eq!(models.line, 4);
    }

    #[test]
    fn test_usage_and_assigned_calls() {
        let fact = extract(indoc! {r#"
            from collections import OrderedDict

            registry = OrderedDict()

            def build():
                return helper() + obj.method()
        "#});
        assert_eq!(fact.usage.calls.get("OrderedDict"), Some(&1));
        assert_eq!(fact.usage.calls.get("helper"), Some(&1));
        assert_eq!(fact.usage.calls.get("method"), Some(&1));
        assert_eq!(fact.usage.names.get("obj"), Some(&1));
        assert!(!fact.usage.names.contains_key("registry"));
        assert_eq!(
            fact.assigned_calls,
            vec![AssignedCall {
                callee: "OrderedDict".to_string(),
                line: 3
            }]
        );
    }

    #[test]
    fn test_signature_names_are_usage() {
        let fact = extract(indoc! {r#"
            def convert(m: Model, *rest: Extra, limit=DEFAULT, **kw: Options) -> Result:
                return m

            key = lambda item=FALLBACK: item
        "#});
        for name in ["Model", "Extra", "DEFAULT", "Options", "Result", "FALLBACK"] {
            assert_eq!(fact.usage.names.get(name), Some(&1), "{name}");
        }
        assert_eq!(fact.functions[0].complexity, 1);
    }

    #[test]
    fn test_decorators_are_recorded() {
        let fact = extract(indoc! {r#"
            import functools

            @functools.lru_cache(maxsize=None)
            def cached(x):
                return x
        "#});
        assert_eq!(fact.functions[0].decorators, vec!["functools.lru_cache".to_string()]);
        assert_eq!(fact.functions[0].statement_count, 1);
    }

    #[test]
    fn test_syntax_error_is_parse_failure() {
        let result = SyntaxExtractor::default().extract(Path::new("bad.py"), "def broken(:\n");
        let failure = result.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Parse);
        assert_eq!(failure.path, PathBuf::from("bad.py"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let code = indoc! {r#"
            class A:
                def run(self):
                    return [x for x in self.items if x]
        "#};
        assert_eq!(extract(code), extract(code));
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nbc\n\nd");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(5), 3);
        assert_eq!(index.line_of(6), 4);
    }

    #[test]
    fn test_extract_file_enforces_size_ceiling() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("big.py");
        std::fs::write(&path, "x = 1\n".repeat(100)).unwrap();

        let extractor = SyntaxExtractor::default();
        let failure = extractor
            .extract_file(&path, Path::new("big.py"), 10, Duration::from_secs(5))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::TooLarge);

        let fact = extractor
            .extract_file(&path, Path::new("big.py"), 1 << 20, Duration::from_secs(5))
            .unwrap();
        assert_eq!(fact.lines.total, 100);
    }
}
