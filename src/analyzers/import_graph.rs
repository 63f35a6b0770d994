//! File-level import graph and circular import detection.

use crate::extraction::{FileFact, ImportFact};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CircularDependency {
    /// Files in import order; the last imports the first. No node repeats.
    pub cycle: Vec<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleCoupling {
    pub module: PathBuf,
    pub dependencies: Vec<PathBuf>,
    pub dependents: Vec<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycles: Vec<CircularDependency>,
    /// Set when enumeration stopped at the reporting limit
    pub truncated: bool,
}

/// Directed graph of files, edge `a -> b` when `a` imports `b`.
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    /// Target file to the line of the first import creating the edge
    adjacency: BTreeMap<PathBuf, BTreeMap<PathBuf, usize>>,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph over `facts`, resolving relative imports to files
    /// that are part of the same run.
    pub fn from_facts(facts: &[FileFact]) -> Self {
        let known: BTreeSet<&Path> = facts.iter().map(|f| f.path.as_path()).collect();
        facts.iter().fold(Self::new(), |mut graph, fact| {
            graph.add_module(fact.path.clone());
            fact.imports
                .iter()
                .filter(|import| import.is_internal())
                .flat_map(|import| {
                    resolve_import(&fact.path, import, &known)
                        .into_iter()
                        .map(move |target| (target, import.line))
                })
                .filter(|(target, _)| *target != fact.path)
                .for_each(|(target, line)| {
                    graph.add_dependency(fact.path.clone(), target, line);
                });
            graph
        })
    }

    pub fn add_module(&mut self, module: PathBuf) {
        self.adjacency.entry(module).or_default();
    }

    /// Add an edge; the first line recorded for a pair is kept.
    pub fn add_dependency(&mut self, from: PathBuf, to: PathBuf, line: usize) {
        self.add_module(to.clone());
        self.adjacency.entry(from).or_default().entry(to).or_insert(line);
    }

    pub fn dependency_count(&self) -> usize {
        self.adjacency.values().map(|deps| deps.len()).sum()
    }

    /// Line of the import in `from` that creates the edge to `to`.
    pub fn edge_line(&self, from: &Path, to: &Path) -> Option<usize> {
        self.adjacency.get(from)?.get(to).copied()
    }

    pub fn get_dependencies(&self, module: &Path) -> Vec<PathBuf> {
        self.adjacency
            .get(module)
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_dependents(&self, module: &Path) -> Vec<PathBuf> {
        self.adjacency
            .iter()
            .filter_map(|(other, deps)| {
                (deps.contains_key(module) && other != module).then(|| other.clone())
            })
            .collect()
    }

    pub fn calculate_coupling_metrics(&self) -> Vec<ModuleCoupling> {
        self.adjacency
            .keys()
            .map(|module| ModuleCoupling {
                module: module.clone(),
                dependencies: self.get_dependencies(module),
                dependents: self.get_dependents(module),
            })
            .collect()
    }

    /// Enumerate every elementary cycle.
    ///
    /// Each cycle is searched for from its smallest node only, so it is
    /// reported once and already starts at its smallest path. Enumeration
    /// stops after `limit` cycles.
    pub fn detect_circular_dependencies(&self, limit: usize) -> CycleReport {
        let nodes: Vec<&PathBuf> = self.adjacency.keys().collect();
        let index: BTreeMap<&PathBuf, usize> =
            nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let edges: Vec<Vec<usize>> = self
            .adjacency
            .values()
            .map(|deps| deps.keys().filter_map(|to| index.get(to).copied()).collect())
            .collect();

        let mut search = CycleSearch {
            edges: &edges,
            limit,
            found: Vec::new(),
            truncated: false,
        };
        for root in 0..nodes.len() {
            if search.truncated {
                break;
            }
            search.cycles_rooted_at(root);
        }

        CycleReport {
            cycles: search
                .found
                .into_iter()
                .map(|cycle| CircularDependency {
                    cycle: cycle.into_iter().map(|i| nodes[i].clone()).collect(),
                })
                .collect(),
            truncated: search.truncated,
        }
    }
}

struct CycleSearch<'a> {
    edges: &'a [Vec<usize>],
    limit: usize,
    found: Vec<Vec<usize>>,
    truncated: bool,
}

impl CycleSearch<'_> {
    /// Backtracking search over nodes not smaller than `root`. A path is
    /// recorded whenever an edge leads back to `root`; `on_path` is cleared
    /// on unwind so later paths may revisit a node.
    fn cycles_rooted_at(&mut self, root: usize) {
        let mut on_path = vec![false; self.edges.len()];
        let mut path: Vec<usize> = vec![root];
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        on_path[root] = true;

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            match self.edges[node].get(*next).copied() {
                Some(target) => {
                    *next += 1;
                    if target == root {
                        if self.found.len() >= self.limit {
                            self.truncated = true;
                            return;
                        }
                        self.found.push(path.clone());
                    } else if target > root && !on_path[target] {
                        on_path[target] = true;
                        path.push(target);
                        stack.push((target, 0));
                    }
                }
                None => {
                    on_path[node] = false;
                    path.pop();
                    stack.pop();
                }
            }
        }
    }
}

/// Files a relative import may refer to, limited to `known`.
///
/// `from .pkg.mod import name` from `a/b/c.py` tries `a/b/pkg/mod.py`,
/// `a/b/pkg/mod/__init__.py`, then `name` as a submodule of either.
/// `from . import name` tries `name` as a sibling module and falls back to
/// the package `__init__.py`.
pub fn resolve_import(importer: &Path, import: &ImportFact, known: &BTreeSet<&Path>) -> Vec<PathBuf> {
    let Some(mut base) = importer.parent().map(Path::to_path_buf) else {
        return Vec::new();
    };
    for _ in 1..import.level() {
        match base.parent() {
            Some(parent) => base = parent.to_path_buf(),
            None => return Vec::new(),
        }
    }
    let exists = |candidate: &PathBuf| known.contains(candidate.as_path());
    let module = import.relative_module();
    let package = module
        .split('.')
        .filter(|part| !part.is_empty())
        .fold(base.clone(), |dir, part| dir.join(part));

    let mut targets: Vec<PathBuf> = Vec::new();
    if !module.is_empty() {
        targets.extend(module_candidates(&package).into_iter().find(exists));
    }
    for name in &import.names {
        if let Some(found) = module_candidates(&package.join(name)).into_iter().find(exists) {
            targets.push(found);
        }
    }
    if module.is_empty() && targets.is_empty() {
        let init = base.join("__init__.py");
        if exists(&init) {
            targets.push(init);
        }
    }

    targets.sort();
    targets.dedup();
    targets
}

fn module_candidates(module_path: &Path) -> [PathBuf; 2] {
    [
        module_path.with_extension("py"),
        module_path.join("__init__.py"),
    ]
}
