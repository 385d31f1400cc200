//! Static operation registry
//!
//! Built once at startup through [`RegistryBuilder`] and shared read-only
//! afterwards (`Arc<OperationRegistry>`). Registration order is preserved so
//! a control surface can list operations the way they were declared.

use crate::naming::{is_private_ident, title_case};
use crate::operation::Operation;
use std::collections::HashMap;
use std::sync::Arc;
use vision_frame::Frame;

/// Name of the pass-through operation used for pausing
pub const IDENTITY_OPERATION: &str = "No Detection";

/// Immutable name -> operation table
#[derive(Debug)]
pub struct OperationRegistry {
    /// Registration order; index 0 is always the identity
    operations: Vec<Arc<Operation>>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Registry holding only the identity operation
    pub fn identity_only() -> Self {
        RegistryBuilder::new().build()
    }

    /// Resolve a display name
    pub fn lookup(&self, name: &str) -> Result<Arc<Operation>, RegistryError> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.operations[i]))
            .ok_or_else(|| RegistryError::UnknownOperation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The designated pass-through operation
    pub fn identity(&self) -> Arc<Operation> {
        Arc::clone(&self.operations[0])
    }

    /// Display names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.operations.iter().map(|op| op.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Operation>> + '_ {
        self.operations.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Operation>> {
        self.operations.get(index)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Always false: the identity is present in every registry
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Collects operations before the registry is frozen
pub struct RegistryBuilder {
    operations: Vec<Arc<Operation>>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    fn new() -> Self {
        let mut index = HashMap::new();
        index.insert(IDENTITY_OPERATION.to_string(), 0);
        Self {
            operations: vec![Arc::new(Operation::identity(IDENTITY_OPERATION))],
            index,
        }
    }

    /// Register a transform under a display name
    pub fn register<F>(mut self, name: &str, transform: F) -> Result<Self, RegistryError>
    where
        F: Fn(Frame) -> Frame + Send + Sync + 'static,
    {
        self.add(name, transform)?;
        Ok(self)
    }

    /// In-place form of [`register`](Self::register); a rejected name leaves
    /// the builder unchanged
    pub fn add<F>(&mut self, name: &str, transform: F) -> Result<(), RegistryError>
    where
        F: Fn(Frame) -> Frame + Send + Sync + 'static,
    {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if name == IDENTITY_OPERATION {
            return Err(RegistryError::ReservedName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateOperation(name.to_string()));
        }

        log::debug!("Registered operation '{}'", name);
        self.index.insert(name.to_string(), self.operations.len());
        self.operations
            .push(Arc::new(Operation::transform(name.to_string(), transform)));
        Ok(())
    }

    /// Number of operations registered so far, identity included
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Register a transform exposed under a `snake_case` identifier
    ///
    /// The display name is derived with [`title_case`]; identifiers with a
    /// leading `__` are rejected.
    pub fn register_snake_case<F>(self, ident: &str, transform: F) -> Result<Self, RegistryError>
    where
        F: Fn(Frame) -> Frame + Send + Sync + 'static,
    {
        if is_private_ident(ident) {
            return Err(RegistryError::PrivateIdentifier(ident.to_string()));
        }
        let name = title_case(ident);
        self.register(&name, transform)
    }

    /// Freeze the table
    pub fn build(self) -> OperationRegistry {
        log::info!(
            "Operation registry built with {} operations",
            self.operations.len()
        );
        OperationRegistry {
            operations: self.operations,
            index: self.index,
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("operation '{0}' is already registered")]
    DuplicateOperation(String),
    #[error("operation name '{0}' is reserved")]
    ReservedName(String),
    #[error("operation name must not be empty")]
    EmptyName,
    #[error("identifier '{0}' is private")]
    PrivateIdentifier(String),
}
