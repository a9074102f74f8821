use thiserror::Error;

use crate::capability::ConstructError;

/// Errors surfaced by [`SingletonRegistry::instance`](crate::SingletonRegistry::instance).
///
/// Every failure leaves the slot unconstructed, so a later call runs the
/// construction sequence again.
#[derive(Debug, Error)]
pub enum SingletonError {
    /// The configured allocator could not provide storage for the instance.
    #[error("failed to allocate {size} bytes (alignment {align}) for singleton {type_name}")]
    AllocationFailed {
        type_name: &'static str,
        size: usize,
        align: usize,
    },

    /// The held type's constructor reported an error. The storage obtained for
    /// this attempt has already been returned to the allocator.
    #[error("construction of singleton {type_name} failed: {source}")]
    ConstructionFailed {
        type_name: &'static str,
        #[source]
        source: ConstructError,
    },

    /// The type is already held with a different configuration.
    #[error("singleton {type_name} is already held with a different configuration")]
    ConfigurationMismatch { type_name: &'static str },

    /// The constructor of the type requested its own singleton.
    #[error("singleton {type_name} was requested while it is being constructed on this thread")]
    Reentrant { type_name: &'static str },
}

impl SingletonError {
    /// Name of the held type the error refers to.
    pub fn type_name(&self) -> &'static str {
        match self {
            SingletonError::AllocationFailed { type_name, .. }
            | SingletonError::ConstructionFailed { type_name, .. }
            | SingletonError::ConfigurationMismatch { type_name }
            | SingletonError::Reentrant { type_name } => type_name,
        }
    }
}
