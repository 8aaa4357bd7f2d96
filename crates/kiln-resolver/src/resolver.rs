//! Fixpoint resolution: a worklist of projects whose chosen revision may
//! need (re)computing, driven until every reachable project is stable.
//!
//! Each dependent's predicates on a child are recorded separately, so when a
//! dependent changes revision (or drops out of the graph) exactly its
//! contributions are retracted and the affected children are revisited.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use kiln_core::config::DEFAULT_MAX_EXPANSIONS;
use kiln_core::identifier::{ProjectIdentifier, SourceKind};
use kiln_core::lockfile::Lockfile;
use kiln_core::predicate::VersionPredicate;
use kiln_core::revision::{sort_by_precedence_desc, Revision};
use kiln_util::errors::KilnError;
use petgraph::graph::NodeIndex;
use tracing::{debug, info, warn};

use crate::cache::SourceCache;
use crate::conflict::{ConflictReport, PinConflict};
use crate::diagnostics::{DiagnosticEvent, DiagnosticsLog};
use crate::graph::{DependencyGraph, Node};
use crate::matcher;
use crate::source::DependencySource;

/// Knobs for a single resolution.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// How often one project may be (re)expanded before giving up.
    pub max_expansions: usize,
    /// Keep a [`DiagnosticsLog`] of every decision.
    pub record_diagnostics: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            record_diagnostics: false,
        }
    }
}

/// The output of a successful resolution.
#[derive(Debug)]
pub struct Resolution {
    /// Acyclic graph of every project reachable from the root.
    pub graph: DependencyGraph,
    /// Dependencies before dependents; the root is last.
    pub build_order: Vec<Node>,
    /// Predicates that pinned revisions had to override.
    pub conflicts: ConflictReport,
    pub diagnostics: Option<DiagnosticsLog>,
}

impl Resolution {
    /// Build order without the root.
    pub fn dependencies(&self) -> impl Iterator<Item = &Node> {
        self.build_order
            .iter()
            .filter(|node| !node.identifier.is_root())
    }

    pub fn revision_of(&self, identifier: &ProjectIdentifier) -> Option<&Revision> {
        self.dependencies()
            .find(|node| &node.identifier == identifier)
            .and_then(|node| node.version.as_ref())
    }

    /// Lock artifact contents: one precise revision per project, in build order.
    pub fn to_lockfile(&self) -> Lockfile {
        Lockfile::from_resolved(
            self.dependencies()
                .filter_map(|node| node.version.as_ref().map(|rev| (&node.identifier, rev))),
        )
    }
}

/// Resolves the dependency graph of `root` against a [`DependencySource`].
pub struct Resolver<'a, S: DependencySource + ?Sized> {
    source: &'a S,
    root: ProjectIdentifier,
    options: ResolveOptions,
}

impl<'a, S: DependencySource + ?Sized> Resolver<'a, S> {
    pub fn new(source: &'a S, root: ProjectIdentifier) -> Self {
        Self {
            source,
            root,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Choose the newest revision satisfying every constraint for each
    /// reachable project and order them for building.
    pub fn resolve_build_order(&self) -> Result<Resolution, KilnError> {
        Session::new(self.source, &self.root, &self.options, HashMap::new()).run()
    }

    /// Like [`resolve_build_order`](Self::resolve_build_order), but pinned
    /// projects always get their pinned revision. Pins that violate a
    /// discovered predicate are reported in [`Resolution::conflicts`].
    pub fn resolve_versions(
        &self,
        pins: impl IntoIterator<Item = (ProjectIdentifier, Revision)>,
    ) -> Result<Resolution, KilnError> {
        let pins = pins.into_iter().collect();
        Session::new(self.source, &self.root, &self.options, pins).run()
    }
}

#[derive(Debug, Default)]
struct Expansion {
    chosen: Option<Revision>,
    expanded: bool,
    count: usize,
}

struct Selection {
    winner: Revision,
    /// Every revision considered, before filtering.
    candidates: Vec<Revision>,
    satisfying: Vec<Revision>,
    violations: Vec<(ProjectIdentifier, VersionPredicate)>,
}

/// A worklist entry: the project and the chain of dependents that queued it,
/// root first.
struct Queued {
    identifier: ProjectIdentifier,
    ancestors: Vec<ProjectIdentifier>,
}

/// State owned by one resolution call.
struct Session<'a, S: DependencySource + ?Sized> {
    source: &'a S,
    root: &'a ProjectIdentifier,
    options: &'a ResolveOptions,
    pins: HashMap<ProjectIdentifier, Revision>,
    cache: SourceCache,
    graph: DependencyGraph,
    /// child -> declaring parent -> predicates that parent contributed.
    requirements: HashMap<ProjectIdentifier, BTreeMap<ProjectIdentifier, Vec<VersionPredicate>>>,
    expansions: HashMap<ProjectIdentifier, Expansion>,
    worklist: VecDeque<Queued>,
    conflicts: ConflictReport,
    diagnostics: Option<DiagnosticsLog>,
    iteration: usize,
}

impl<'a, S: DependencySource + ?Sized> Session<'a, S> {
    fn new(
        source: &'a S,
        root: &'a ProjectIdentifier,
        options: &'a ResolveOptions,
        pins: HashMap<ProjectIdentifier, Revision>,
    ) -> Self {
        Self {
            source,
            root,
            options,
            pins,
            cache: SourceCache::new(),
            graph: DependencyGraph::new(),
            requirements: HashMap::new(),
            expansions: HashMap::new(),
            worklist: VecDeque::new(),
            conflicts: ConflictReport::new(),
            diagnostics: options.record_diagnostics.then(DiagnosticsLog::new),
            iteration: 0,
        }
    }

    fn run(mut self) -> Result<Resolution, KilnError> {
        let root_idx = self.graph.add_node(Node::new(self.root.clone()));
        self.graph.set_root(root_idx);
        self.worklist.push_back(Queued {
            identifier: self.root.clone(),
            ancestors: Vec::new(),
        });

        loop {
            while let Some(entry) = self.worklist.pop_front() {
                self.iteration += 1;
                self.process(&entry.identifier, &entry.ancestors)?;
            }
            // A project can become reachable again through an ancestor that
            // kept its revision; sweep for anything left unsettled.
            let stale = self.unsettled()?;
            if stale.is_empty() {
                break;
            }
            debug!("Revisiting {} unsettled project(s)", stale.len());
            for identifier in stale {
                self.requeue(identifier);
            }
        }

        self.finish()
    }

    fn process(
        &mut self,
        identifier: &ProjectIdentifier,
        ancestors: &[ProjectIdentifier],
    ) -> Result<(), KilnError> {
        let Some(idx) = self.graph.find(identifier) else {
            return Ok(());
        };

        if identifier.is_root() {
            if !self.is_expanded(identifier) {
                self.record(DiagnosticEvent::RootExpanded {
                    iteration: self.iteration,
                    project: identifier.project_name().to_string(),
                });
                self.expand(identifier, idx, None, ancestors)?;
            }
            return Ok(());
        }

        let live = self.graph.reachable_from_root();
        if !live.contains(&idx) {
            self.orphan(identifier, idx);
            return Ok(());
        }

        let active = self.active_requirements(identifier, &live);
        let selection = self.select(identifier, &active)?;
        self.report_violations(identifier, &selection);

        let previous = self
            .expansions
            .get(identifier)
            .filter(|state| state.expanded)
            .and_then(|state| state.chosen.clone());
        let was_expanded = self.is_expanded(identifier);
        let changed = !was_expanded || previous.as_ref() != Some(&selection.winner);

        self.record(DiagnosticEvent::Resolved {
            iteration: self.iteration,
            project: identifier.project_name().to_string(),
            predicates: describe(&active),
            candidates: revision_names(&selection.candidates),
            satisfying: revision_names(&selection.satisfying),
            winner: selection.winner.name().to_string(),
            changed,
        });

        if !changed {
            return Ok(());
        }

        if was_expanded {
            let previous = previous.map(|rev| rev.name().to_string()).unwrap_or_default();
            debug!(
                "{identifier} moved from {previous} to {}; re-expanding",
                selection.winner
            );
            self.record(DiagnosticEvent::Invalidated {
                iteration: self.iteration,
                project: identifier.project_name().to_string(),
                previous,
                winner: selection.winner.name().to_string(),
            });
            self.retract(identifier, idx);
        }

        self.expand(identifier, idx, Some(selection.winner), ancestors)
    }

    fn is_expanded(&self, identifier: &ProjectIdentifier) -> bool {
        self.expansions
            .get(identifier)
            .is_some_and(|state| state.expanded)
    }

    /// Predicates on `identifier` declared by dependents that are still live.
    fn active_requirements(
        &self,
        identifier: &ProjectIdentifier,
        live: &HashSet<NodeIndex>,
    ) -> Vec<(ProjectIdentifier, VersionPredicate)> {
        let Some(parents) = self.requirements.get(identifier) else {
            return Vec::new();
        };
        parents
            .iter()
            .filter(|(parent, _)| {
                self.graph
                    .find(parent)
                    .is_some_and(|idx| live.contains(&idx))
            })
            .flat_map(|(parent, predicates)| {
                predicates
                    .iter()
                    .map(move |predicate| (parent.clone(), predicate.clone()))
            })
            .collect()
    }

    fn select(
        &mut self,
        identifier: &ProjectIdentifier,
        active: &[(ProjectIdentifier, VersionPredicate)],
    ) -> Result<Selection, KilnError> {
        if identifier.kind() == SourceKind::Local {
            return Ok(Selection {
                winner: Revision::Local,
                candidates: vec![Revision::Local],
                satisfying: vec![Revision::Local],
                violations: Vec::new(),
            });
        }

        let source = self.source;
        let cache = &mut self.cache;

        if let Some(pin) = self.pins.get(identifier) {
            let mut violations = Vec::new();
            for (parent, predicate) in active {
                let satisfied = matcher::intersect(
                    &[predicate],
                    std::slice::from_ref(pin),
                    |name| cache.revision_for_name(source, identifier, name),
                );
                match satisfied {
                    Ok(revisions) if !revisions.is_empty() => {}
                    Ok(_) => violations.push((parent.clone(), predicate.clone())),
                    Err(e) => {
                        debug!("Could not check {predicate} against pinned {identifier}: {e}");
                        violations.push((parent.clone(), predicate.clone()));
                    }
                }
            }
            let satisfying = if violations.is_empty() {
                vec![pin.clone()]
            } else {
                Vec::new()
            };
            return Ok(Selection {
                winner: pin.clone(),
                candidates: vec![pin.clone()],
                satisfying,
                violations,
            });
        }

        let mut candidates = cache.candidates(source, identifier)?;
        sort_by_precedence_desc(&mut candidates);
        let predicates: Vec<&VersionPredicate> = active.iter().map(|(_, p)| p).collect();
        let satisfying = matcher::intersect(&predicates, &candidates, |name| {
            cache.revision_for_name(source, identifier, name)
        })?;

        match satisfying.first() {
            Some(winner) => Ok(Selection {
                winner: winner.clone(),
                candidates,
                satisfying: satisfying.clone(),
                violations: Vec::new(),
            }),
            None => Err(KilnError::UnsatisfiableConstraint {
                project: identifier.project_name().to_string(),
                predicates: describe(active).join(", "),
            }),
        }
    }

    fn report_violations(&mut self, identifier: &ProjectIdentifier, selection: &Selection) {
        for (parent, predicate) in &selection.violations {
            let conflict = PinConflict {
                project: identifier.project_name().to_string(),
                pinned: selection.winner.name().to_string(),
                predicate: predicate.to_string(),
                required_by: parent.project_name().to_string(),
            };
            if !self.conflicts.add(conflict.clone()) {
                continue;
            }
            warn!("{conflict}; keeping the pinned revision");
            self.record(DiagnosticEvent::PinConflict {
                iteration: self.iteration,
                project: conflict.project,
                pinned: conflict.pinned,
                predicate: conflict.predicate,
                required_by: conflict.required_by,
            });
        }
    }

    /// Fetch the declarations of `identifier` at `revision` and queue its children.
    ///
    /// A child already on the chain that led here closes a cycle. Cycles
    /// formed only through edges awaiting retraction are left to the final
    /// topological sort.
    fn expand(
        &mut self,
        identifier: &ProjectIdentifier,
        idx: NodeIndex,
        revision: Option<Revision>,
        ancestors: &[ProjectIdentifier],
    ) -> Result<(), KilnError> {
        let state = self.expansions.entry(identifier.clone()).or_default();
        if state.count >= self.options.max_expansions {
            return Err(KilnError::ResolutionDidNotConverge {
                project: identifier.project_name().to_string(),
                attempts: state.count,
            });
        }
        state.count += 1;
        state.expanded = true;
        state.chosen = revision.clone();
        self.graph.node_mut(idx).version = revision.clone();

        let specifications = self
            .cache
            .specifications(self.source, identifier, revision.as_ref())?;
        debug!(
            "Expanding {identifier}{}: {} dependencies",
            revision.as_ref().map(|r| format!(" {r}")).unwrap_or_default(),
            specifications.len()
        );

        let mut lineage = ancestors.to_vec();
        lineage.push(identifier.clone());

        for spec in specifications {
            let child = spec.identifier;
            if let Some(pos) = lineage.iter().position(|ancestor| ancestor == &child) {
                let names: Vec<&str> = std::iter::once(identifier)
                    .chain(&lineage[pos..])
                    .map(|id| id.project_name())
                    .collect();
                return Err(KilnError::CycleDetected {
                    path: names.join(" -> "),
                });
            }
            let child_idx = self.graph.add_node(Node::new(child.clone()));
            self.graph.add_edge(idx, child_idx);
            self.requirements
                .entry(child.clone())
                .or_default()
                .entry(identifier.clone())
                .or_default()
                .push(spec.predicate);
            self.worklist.push_back(Queued {
                identifier: child,
                ancestors: lineage.clone(),
            });
        }
        Ok(())
    }

    /// Queue `identifier` again, reached through whichever current path
    /// leads to it from the root.
    fn requeue(&mut self, identifier: ProjectIdentifier) {
        let ancestors = match (self.graph.root, self.graph.find(&identifier)) {
            (Some(root), Some(idx)) => self
                .graph
                .path_between(root, idx)
                .and_then(|path| {
                    path.split_last().map(|(_, rest)| {
                        rest.iter()
                            .map(|&i| self.graph.node(i).identifier.clone())
                            .collect()
                    })
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        self.worklist.push_back(Queued {
            identifier,
            ancestors,
        });
    }

    /// Undo an expansion: drop outgoing edges and contributed predicates,
    /// then revisit the former children.
    fn retract(&mut self, identifier: &ProjectIdentifier, idx: NodeIndex) {
        let former = self.graph.remove_outgoing(idx);
        for parents in self.requirements.values_mut() {
            parents.remove(identifier);
        }
        let mut children: Vec<ProjectIdentifier> = former
            .into_iter()
            .map(|child| self.graph.node(child).identifier.clone())
            .collect();
        children.sort_by(|a, b| {
            (a.project_name(), a).cmp(&(b.project_name(), b))
        });
        children.dedup();
        for child in children {
            self.requeue(child);
        }
        if let Some(state) = self.expansions.get_mut(identifier) {
            state.expanded = false;
        }
    }

    fn orphan(&mut self, identifier: &ProjectIdentifier, idx: NodeIndex) {
        if !self.is_expanded(identifier) {
            self.record(DiagnosticEvent::Skipped {
                iteration: self.iteration,
                project: identifier.project_name().to_string(),
            });
            return;
        }
        debug!("{identifier} is no longer reachable; retracting its dependencies");
        self.record(DiagnosticEvent::Orphaned {
            iteration: self.iteration,
            project: identifier.project_name().to_string(),
        });
        self.retract(identifier, idx);
        if let Some(state) = self.expansions.get_mut(identifier) {
            state.chosen = None;
        }
        self.graph.node_mut(idx).version = None;
    }

    /// Live projects that are unexpanded or whose winner no longer matches
    /// their active predicates.
    fn unsettled(&mut self) -> Result<Vec<ProjectIdentifier>, KilnError> {
        let live = self.graph.reachable_from_root();
        let mut candidates: Vec<ProjectIdentifier> = live
            .iter()
            .map(|&idx| self.graph.node(idx).identifier.clone())
            .filter(|id| !id.is_root())
            .collect();
        candidates.sort_by(|a, b| (a.project_name(), a).cmp(&(b.project_name(), b)));

        let mut stale = Vec::new();
        for identifier in candidates {
            let chosen = self
                .expansions
                .get(&identifier)
                .filter(|state| state.expanded)
                .and_then(|state| state.chosen.clone());
            let Some(chosen) = chosen else {
                stale.push(identifier);
                continue;
            };
            let active = self.active_requirements(&identifier, &live);
            if self.select(&identifier, &active)?.winner != chosen {
                stale.push(identifier);
            }
        }
        Ok(stale)
    }

    fn finish(self) -> Result<Resolution, KilnError> {
        let live = self.graph.reachable_from_root();
        let graph = self.graph.retain(&live);
        let build_order = graph.build_order()?;
        info!(
            "Resolved {} dependencies in {} iterations",
            graph.len(),
            self.iteration
        );
        Ok(Resolution {
            graph,
            build_order,
            conflicts: self.conflicts,
            diagnostics: self.diagnostics,
        })
    }

    fn record(&mut self, event: DiagnosticEvent) {
        if let Some(log) = self.diagnostics.as_mut() {
            log.record(event);
        }
    }
}

fn revision_names(revisions: &[Revision]) -> Vec<String> {
    revisions.iter().map(|rev| rev.name().to_string()).collect()
}

/// `"<predicate> (from <dependent>)"` for each active requirement.
fn describe(active: &[(ProjectIdentifier, VersionPredicate)]) -> Vec<String> {
    active
        .iter()
        .map(|(parent, predicate)| format!("{predicate} (from {})", parent.project_name()))
        .collect()
}
