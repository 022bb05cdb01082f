//! Dependency graph for step execution ordering.
//!
//! Edges come from the step ids a step's inputs reference. Every ordering
//! this graph produces is deterministic: ties are broken by declaration
//! order, so a workflow with no references runs top to bottom.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{PipewrightError, Result};

/// Represents the dependency relationships between steps.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Step ids in declaration order.
    order: Vec<String>,
    /// Map of step id to its direct dependencies.
    dependencies: HashMap<String, HashSet<String>>,
    /// Map of step id to steps that depend on it.
    dependents: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    /// Create a new dependency graph builder.
    pub fn builder() -> DependencyGraphBuilder {
        DependencyGraphBuilder::new()
    }

    /// Get the direct dependencies of a step.
    pub fn dependencies_of(&self, step: &str) -> Option<&HashSet<String>> {
        self.dependencies.get(step)
    }

    /// Get steps that depend on the given step.
    pub fn dependents_of(&self, step: &str) -> Option<&HashSet<String>> {
        self.dependents.get(step)
    }

    /// Every step that depends on `step`, directly or through other steps.
    pub fn transitive_dependents(&self, step: &str) -> HashSet<String> {
        let mut found = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([step]);

        while let Some(current) = queue.pop_front() {
            if let Some(dependents) = self.dependents.get(current) {
                for dependent in dependents {
                    if found.insert(dependent.clone()) {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        found
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns steps in topological order (dependencies before dependents).
    ///
    /// Among steps that are ready at the same time, the one declared first
    /// comes first. Returns an error if a cycle is detected.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(PipewrightError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut in_degree: HashMap<&str, usize> = self
            .order
            .iter()
            .map(|step| (step.as_str(), self.dependencies.get(step).map_or(0, HashSet::len)))
            .collect();

        let mut result = Vec::with_capacity(self.order.len());
        while result.len() < self.order.len() {
            let Some(next) = self
                .order
                .iter()
                .find(|step| in_degree.get(step.as_str()) == Some(&0))
            else {
                break;
            };

            in_degree.remove(next.as_str());
            if let Some(dependents) = self.dependents.get(next) {
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                    }
                }
            }
            result.push(next.clone());
        }

        Ok(result)
    }

    /// Find a cycle in the graph, returning the path if one exists.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            Visiting,
            Visited,
        }

        let mut state: HashMap<&str, State> = self
            .order
            .iter()
            .map(|s| (s.as_str(), State::Unvisited))
            .collect();

        let mut path: Vec<String> = Vec::new();

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            state: &mut HashMap<&'a str, State>,
            path: &mut Vec<String>,
        ) -> Option<Vec<String>> {
            state.insert(node, State::Visiting);
            path.push(node.to_string());

            if let Some(deps) = graph.dependencies.get(node) {
                let mut deps: Vec<&String> = deps.iter().collect();
                deps.sort();
                for dep in deps {
                    match state.get(dep.as_str()) {
                        Some(State::Visiting) => {
                            let start = path.iter().position(|s| s == dep).unwrap_or(0);
                            let mut cycle: Vec<String> = path[start..].to_vec();
                            cycle.push(dep.clone());
                            return Some(cycle);
                        }
                        Some(State::Unvisited) | None => {
                            if let Some(cycle) = dfs(dep, graph, state, path) {
                                return Some(cycle);
                            }
                        }
                        Some(State::Visited) => {}
                    }
                }
            }

            path.pop();
            state.insert(node, State::Visited);
            None
        }

        for step in &self.order {
            if state.get(step.as_str()) == Some(&State::Unvisited) {
                if let Some(cycle) = dfs(step, self, &mut state, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    /// Groups of steps whose dependencies are satisfied by earlier groups.
    ///
    /// Steps inside a group keep declaration order.
    pub fn stages(&self) -> Result<Vec<Vec<String>>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(PipewrightError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut completed: HashSet<String> = HashSet::new();

        while completed.len() < self.order.len() {
            let ready: Vec<String> = self
                .order
                .iter()
                .filter(|s| !completed.contains(*s))
                .filter(|s| self.is_ready(s, &completed))
                .cloned()
                .collect();

            if ready.is_empty() {
                break;
            }

            completed.extend(ready.iter().cloned());
            groups.push(ready);
        }

        Ok(groups)
    }

    /// Check if a step is ready to run given completed steps.
    pub fn is_ready(&self, step: &str, completed: &HashSet<String>) -> bool {
        match self.dependencies.get(step) {
            None => true,
            Some(deps) => deps.iter().all(|d| completed.contains(d)),
        }
    }
}

/// Builder for constructing a DependencyGraph.
#[derive(Debug, Default)]
pub struct DependencyGraphBuilder {
    order: Vec<String>,
    dependencies: HashMap<String, HashSet<String>>,
}

impl DependencyGraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step with its dependencies.
    pub fn add_step(mut self, id: impl Into<String>, depends_on: Vec<String>) -> Self {
        let id = id.into();
        if !self.dependencies.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.dependencies.entry(id).or_default().extend(depends_on);
        self
    }

    /// Build the dependency graph.
    ///
    /// Returns an error if any dependency references a non-existent step.
    pub fn build(self) -> Result<DependencyGraph> {
        for id in &self.order {
            let mut deps: Vec<&String> = self.dependencies.get(id).into_iter().flatten().collect();
            deps.sort();
            if let Some(dep) = deps.into_iter().find(|dep| !self.dependencies.contains_key(*dep)) {
                return Err(PipewrightError::DependencyError {
                    step: id.clone(),
                    reference: dep.clone(),
                    reason: format!("no step with id '{}'", dep),
                });
            }
        }

        let mut dependents: HashMap<String, HashSet<String>> = self
            .order
            .iter()
            .map(|id| (id.clone(), HashSet::new()))
            .collect();

        for (id, deps) in &self.dependencies {
            for dep in deps {
                dependents.entry(dep.clone()).or_default().insert(id.clone());
            }
        }

        Ok(DependencyGraph {
            order: self.order,
            dependencies: self.dependencies,
            dependents,
        })
    }
}
