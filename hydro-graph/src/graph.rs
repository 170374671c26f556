use crate::error::{GraphError, Result};
use crate::node::{same_identity, same_value, Cached, Dependency, Inputs, Node, Source, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::Rc;

/// Typed handle to a node whose output is a `T`.
pub struct NodeKey<T> {
    id: usize,
    _output: PhantomData<fn() -> T>,
}

impl<T> NodeKey<T> {
    fn new(id: usize) -> Self {
        NodeKey {
            id,
            _output: PhantomData,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

impl<T> Clone for NodeKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeKey<T> {}

impl<T> Debug for NodeKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeKey({})", self.id)
    }
}

/// Arena of nodes evaluated against snapshots of `S`.
pub struct Graph<S> {
    nodes: Vec<Node<S>>,
}

impl<S: 'static> Default for Graph<S> {
    fn default() -> Self {
        Graph::new()
    }
}

impl<S: 'static> Graph<S> {
    pub fn new() -> Self {
        Graph { nodes: Vec::new() }
    }

    /// Start declaring a node. It is added when the builder's `compute` is called.
    pub fn node(&mut self, name: impl Into<String>) -> NodeBuilder<'_, S> {
        NodeBuilder {
            graph: self,
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    /// Declare one independently cached node per parameter.
    ///
    /// `build` may look up other families' members, so it can fail.
    pub fn family<P, T, F>(&mut self, name: &str, parameters: impl IntoIterator<Item = P>, mut build: F) -> Result<Family<P, T>>
    where
        P: Eq + Hash + Clone + Debug,
        F: FnMut(NodeBuilder<'_, S>, &P) -> Result<NodeKey<T>>,
    {
        let mut keys = HashMap::new();
        let mut order = Vec::new();
        for parameter in parameters {
            let builder = self.node(format!("{}[{:?}]", name, parameter));
            let key = build(builder, &parameter)?;
            if keys.insert(parameter.clone(), key).is_none() {
                order.push(parameter);
            }
        }
        Ok(Family {
            name: name.to_string(),
            keys,
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name<T>(&self, key: NodeKey<T>) -> Option<&str> {
        self.nodes.get(key.id).map(|node| node.name.as_str())
    }

    /// Begin an evaluation pass over one consistent snapshot.
    pub fn pass<'g, 's>(&'g self, state: &'s S) -> Pass<'g, 's, S> {
        Pass {
            graph: self,
            state,
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Evaluate a single node against `state`.
    pub fn evaluate<T: 'static>(&self, key: NodeKey<T>, state: &S) -> Result<Rc<T>> {
        self.pass(state).get(key)
    }
}

/// Collects a node's dependencies before it is added to the graph.
pub struct NodeBuilder<'g, S> {
    graph: &'g mut Graph<S>,
    name: String,
    dependencies: Vec<Dependency<S>>,
}

impl<'g, S: 'static> NodeBuilder<'g, S> {
    /// Depend on a shared state field, compared by pointer identity.
    pub fn state<T: 'static>(mut self, select: impl Fn(&S) -> Rc<T> + 'static) -> Self {
        self.dependencies.push(Dependency {
            source: Source::State(Box::new(move |state: &S| select(state) as Value)),
            same: same_identity,
        });
        self
    }

    /// Depend on a plain state field, compared by equality.
    pub fn value<T: PartialEq + 'static>(mut self, select: impl Fn(&S) -> T + 'static) -> Self {
        self.dependencies.push(Dependency {
            source: Source::State(Box::new(move |state: &S| Rc::new(select(state)) as Value)),
            same: same_value::<T>,
        });
        self
    }

    /// Depend on another node's output, compared by pointer identity.
    pub fn input<T: 'static>(mut self, key: NodeKey<T>) -> Self {
        self.dependencies.push(Dependency {
            source: Source::Node(key.id),
            same: same_identity,
        });
        self
    }

    /// Finish the node with a compute function producing a fresh value.
    pub fn compute<T: 'static>(self, compute: impl Fn(&Inputs) -> anyhow::Result<T> + 'static) -> NodeKey<T> {
        self.finish(Box::new(move |inputs: &Inputs| compute(inputs).map(|output| Rc::new(output) as Value)))
    }

    /// Finish the node with a compute function that may hand back an existing `Rc`,
    /// keeping its identity for downstream nodes.
    pub fn compute_shared<T: 'static>(
        self,
        compute: impl Fn(&Inputs) -> anyhow::Result<Rc<T>> + 'static,
    ) -> NodeKey<T> {
        self.finish(Box::new(move |inputs: &Inputs| compute(inputs).map(|output| output as Value)))
    }

    fn finish<T>(self, compute: crate::node::Compute) -> NodeKey<T> {
        let id = self.graph.nodes.len();
        log::debug!("adding node {} `{}`", id, self.name);
        self.graph.nodes.push(Node {
            name: self.name,
            dependencies: self.dependencies,
            compute,
            cache: RefCell::new(None),
        });
        NodeKey::new(id)
    }
}

/// One evaluation pass: every node is evaluated at most once against the same snapshot.
pub struct Pass<'g, 's, S> {
    graph: &'g Graph<S>,
    state: &'s S,
    memo: RefCell<HashMap<usize, Result<Value>>>,
}

impl<'g, 's, S: 'static> Pass<'g, 's, S> {
    pub fn get<T: 'static>(&self, key: NodeKey<T>) -> Result<Rc<T>> {
        let value = self.evaluate_id(key.id)?;
        value.downcast::<T>().map_err(|_| GraphError::TypeMismatch {
            node: self.node_name(key.id),
        })
    }

    pub fn state(&self) -> &'s S {
        self.state
    }

    fn node_name(&self, id: usize) -> String {
        self.graph
            .nodes
            .get(id)
            .map(|node| node.name.clone())
            .unwrap_or_default()
    }

    fn evaluate_id(&self, id: usize) -> Result<Value> {
        if let Some(result) = self.memo.borrow().get(&id) {
            return result.clone();
        }
        let node = self.graph.nodes.get(id).ok_or(GraphError::UnknownNode(id))?;
        let result = self.evaluate_node(id, node);
        self.memo.borrow_mut().insert(id, result.clone());
        result
    }

    fn evaluate_node(&self, id: usize, node: &Node<S>) -> Result<Value> {
        let mut inputs = Vec::with_capacity(node.dependencies.len());
        for dependency in &node.dependencies {
            let value = match &dependency.source {
                Source::State(select) => select(self.state),
                Source::Node(upstream) => {
                    // only earlier nodes, which keeps evaluation acyclic
                    if *upstream >= id {
                        return Err(GraphError::UnknownNode(*upstream));
                    }
                    match self.evaluate_id(*upstream) {
                        Ok(value) => value,
                        Err(err) => {
                            let failed = err
                                .origin()
                                .map(str::to_string)
                                .unwrap_or_else(|| self.node_name(*upstream));
                            log::debug!("node `{}` blocked by failed `{}`", node.name, failed);
                            return Err(GraphError::Upstream {
                                node: node.name.clone(),
                                failed,
                            });
                        }
                    }
                }
            };
            inputs.push(value);
        }

        if let Some(output) = node.cached_for(&inputs) {
            log::debug!("node `{}` unchanged", node.name);
            return Ok(output);
        }

        log::debug!("recomputing node `{}`", node.name);
        match (node.compute)(&Inputs::new(&node.name, &inputs)) {
            Ok(output) => {
                *node.cache.borrow_mut() = Some(Cached {
                    inputs,
                    output: Rc::clone(&output),
                });
                Ok(output)
            }
            Err(err) => {
                *node.cache.borrow_mut() = None;
                log::warn!("node `{}` failed: {:#}", node.name, err);
                Err(GraphError::ComputeFailure {
                    node: node.name.clone(),
                    message: format!("{:#}", err),
                })
            }
        }
    }
}

/// Nodes of one kind, keyed by the parameter they were built for.
pub struct Family<P, T> {
    name: String,
    keys: HashMap<P, NodeKey<T>>,
    order: Vec<P>,
}

impl<P: Eq + Hash + Debug, T> Family<P, T> {
    pub fn get(&self, parameter: &P) -> Result<NodeKey<T>> {
        self.keys
            .get(parameter)
            .copied()
            .ok_or_else(|| GraphError::UnknownParameter {
                family: self.name.clone(),
                parameter: format!("{:?}", parameter),
            })
    }

    /// Parameters in the order the nodes were declared.
    pub fn parameters(&self) -> &[P] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&P, NodeKey<T>)> + '_ {
        self.order
            .iter()
            .filter_map(move |parameter| self.keys.get(parameter).map(|key| (parameter, *key)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
