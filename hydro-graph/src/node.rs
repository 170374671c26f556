use crate::error::{GraphError, Result};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Type-erased node output or dependency value.
pub(crate) type Value = Rc<dyn Any>;

pub(crate) type Selector<S> = Box<dyn Fn(&S) -> Value>;

pub(crate) type Compute = Box<dyn Fn(&Inputs) -> anyhow::Result<Value>>;

/// How two observations of a dependency are compared.
pub(crate) type SameFn = fn(&Value, &Value) -> bool;

/// Same allocation. Metadata is ignored, only the data pointer matters.
pub(crate) fn same_identity(a: &Value, b: &Value) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

pub(crate) fn same_value<T: PartialEq + 'static>(a: &Value, b: &Value) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub(crate) enum Source<S> {
    State(Selector<S>),
    Node(usize),
}

pub(crate) struct Dependency<S> {
    pub(crate) source: Source<S>,
    pub(crate) same: SameFn,
}

pub(crate) struct Cached {
    pub(crate) inputs: Vec<Value>,
    pub(crate) output: Value,
}

pub(crate) struct Node<S> {
    pub(crate) name: String,
    pub(crate) dependencies: Vec<Dependency<S>>,
    pub(crate) compute: Compute,
    pub(crate) cache: RefCell<Option<Cached>>,
}

impl<S> Node<S> {
    /// The cached output if every input matches the ones it was computed from.
    pub(crate) fn cached_for(&self, inputs: &[Value]) -> Option<Value> {
        let cache = self.cache.borrow();
        let cached = cache.as_ref()?;
        let unchanged = cached.inputs.len() == inputs.len()
            && self
                .dependencies
                .iter()
                .zip(cached.inputs.iter().zip(inputs))
                .all(|(dependency, (old, new))| (dependency.same)(old, new));
        unchanged.then(|| Rc::clone(&cached.output))
    }
}

/// Dependency values handed to a compute function, in declaration order.
pub struct Inputs<'a> {
    node: &'a str,
    values: &'a [Value],
}

impl<'a> Inputs<'a> {
    pub(crate) fn new(node: &'a str, values: &'a [Value]) -> Self {
        Inputs { node, values }
    }

    fn value(&self, index: usize) -> Result<&Value> {
        self.values.get(index).ok_or_else(|| GraphError::TypeMismatch {
            node: self.node.to_string(),
        })
    }

    /// Borrow dependency `index` as a `T`.
    pub fn get<T: 'static>(&self, index: usize) -> Result<&T> {
        self.value(index)?
            .downcast_ref::<T>()
            .ok_or_else(|| GraphError::TypeMismatch {
                node: self.node.to_string(),
            })
    }

    /// Shared handle to dependency `index`, for passing it through unchanged.
    pub fn shared<T: 'static>(&self, index: usize) -> Result<Rc<T>> {
        Rc::clone(self.value(index)?)
            .downcast::<T>()
            .map_err(|_| GraphError::TypeMismatch {
                node: self.node.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn node(&self) -> &str {
        self.node
    }
}
