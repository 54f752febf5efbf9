use thiserror::Error;

/// A record tree that cannot form valid MERGE patterns.
///
/// `path` locates the offending record from the root, e.g.
/// `Project/CONTAINS[0]/BUILT_FROM[1]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("Record at {path} has an empty label")]
    EmptyLabel { path: String },

    #[error("Record at {path} has no properties to merge on")]
    EmptyProperties { path: String },

    #[error("Record at {path} has a property with an empty key")]
    EmptyPropertyKey { path: String },

    #[error("Record at {path} has a child list with an empty relationship type")]
    EmptyRelationType { path: String },

    #[error("Property {key} of record at {path} is not a finite number")]
    NonFiniteFloat { path: String, key: String },
}

impl ConstraintError {
    /// Location of the offending record within the tree.
    pub fn path(&self) -> &str {
        match self {
            Self::EmptyLabel { path }
            | Self::EmptyProperties { path }
            | Self::EmptyPropertyKey { path }
            | Self::EmptyRelationType { path }
            | Self::NonFiniteFloat { path, .. } => path,
        }
    }
}
