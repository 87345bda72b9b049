//! Attribute paths from a query root to a (possibly nested) attribute.

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::ast::AttributeDescriptor;

/// One hop of an attribute path: an attribute and the type that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Type declaring the attribute.
    pub owner: SmolStr,
    /// The attribute itself.
    pub attribute: AttributeDescriptor,
}

impl PathStep {
    /// Create a new path step.
    pub fn new(owner: impl Into<SmolStr>, attribute: AttributeDescriptor) -> Self {
        Self {
            owner: owner.into(),
            attribute,
        }
    }

    /// Get the attribute name.
    pub fn name(&self) -> &str {
        self.attribute.name()
    }
}

/// A non-empty chain of attributes starting at a query root.
///
/// Every step except the last crosses a relationship or an embedded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    steps: SmallVec<[PathStep; 4]>,
}

impl AttributePath {
    /// Create a path of length one.
    pub fn new(first: PathStep) -> Self {
        let mut steps = SmallVec::new();
        steps.push(first);
        Self { steps }
    }

    /// Extend a path-so-far with one more step.
    pub fn extended(parent: Option<&AttributePath>, step: PathStep) -> Self {
        match parent {
            Some(parent) => {
                let mut path = parent.clone();
                path.steps.push(step);
                path
            }
            None => Self::new(step),
        }
    }

    /// Append a step in place.
    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    /// Number of attributes in the path.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; paths have at least one step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All steps in order.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// The final attribute.
    pub fn leaf(&self) -> &PathStep {
        // Non-empty by construction.
        &self.steps[self.steps.len() - 1]
    }

    /// The steps that must be traversed to reach the leaf.
    pub fn joins(&self) -> &[PathStep] {
        &self.steps[..self.steps.len() - 1]
    }

    /// The query root type.
    pub fn root_type(&self) -> &str {
        self.steps[0].owner.as_str()
    }

    /// Attribute names joined with dots.
    pub fn dotted(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(step.name());
        }
        out
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.root_type(), self.dotted())
    }
}
