//! The task DAG (§4.2): declared as nodes with named dependencies, resolved
//! into run order with a hand-rolled Kahn's-algorithm topological sort —
//! the teacher never pulls in a graph crate for its own workflow definitions
//! (`ob-workflow::definition` walks `transitions_from`/`is_valid_transition`
//! over a plain `Vec` by hand), so neither do we.

use std::collections::{HashMap, HashSet, VecDeque};

use schema_core::error::SchemaIntelError;

/// One task in the DAG. `is_llm_task` routes it through the LLM semaphore
/// (bounded to 1 concurrent call by default) rather than the deterministic
/// one (§5).
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub name: String,
    pub depends_on: Vec<String>,
    pub is_llm_task: bool,
    pub retryable: bool,
}

impl TaskNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            is_llm_task: false,
            retryable: false,
        }
    }

    pub fn depends_on(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.depends_on = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn llm(mut self) -> Self {
        self.is_llm_task = true;
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

/// A DAG resolved into one or more run levels: tasks in the same level have
/// no dependency relationship to one another and may run concurrently
/// (subject to the semaphore for their kind).
#[derive(Debug)]
pub struct TaskGraph {
    levels: Vec<Vec<TaskNode>>,
}

impl TaskGraph {
    /// Performs Kahn's algorithm over `nodes`. Rejects an unknown dependency
    /// name or a cycle with `SchemaIntelError::Internal` — a malformed DAG
    /// is a programming error in the task definitions, not a runtime
    /// condition callers should need to branch on.
    pub fn build(nodes: Vec<TaskNode>) -> Result<Self, SchemaIntelError> {
        let names: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        for node in &nodes {
            for dep in &node.depends_on {
                if !names.contains(dep.as_str()) {
                    return Err(SchemaIntelError::Internal(anyhow::anyhow!(
                        "task '{}' depends on unknown task '{}'",
                        node.name,
                        dep
                    )));
                }
            }
        }

        let mut indegree: HashMap<String, usize> = HashMap::new();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut by_name: HashMap<String, TaskNode> = HashMap::new();

        for node in nodes {
            indegree.entry(node.name.clone()).or_insert(0);
            for dep in &node.depends_on {
                *indegree.entry(node.name.clone()).or_insert(0) += 1;
                dependents.entry(dep.clone()).or_default().push(node.name.clone());
            }
            by_name.insert(node.name.clone(), node);
        }

        let mut ready: VecDeque<String> = indegree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(name, _)| name.clone())
            .collect();

        let mut levels = Vec::new();
        let mut visited = 0;
        let total = by_name.len();

        while !ready.is_empty() {
            let mut level = Vec::new();
            let this_round: Vec<String> = ready.drain(..).collect();
            for name in this_round {
                visited += 1;
                if let Some(deps) = dependents.get(&name) {
                    for dep_name in deps {
                        let entry = indegree.get_mut(dep_name).unwrap();
                        *entry -= 1;
                        if *entry == 0 {
                            ready.push_back(dep_name.clone());
                        }
                    }
                }
                level.push(by_name.remove(&name).unwrap());
            }
            levels.push(level);
        }

        if visited != total {
            return Err(SchemaIntelError::Internal(anyhow::anyhow!(
                "task DAG contains a cycle"
            )));
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Vec<TaskNode>] {
        &self.levels
    }
}
