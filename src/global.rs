//! The process-wide registry and its typed access point.
//!
//! Rust never drops statics, so instances held here live until
//! [`shutdown`] is called or the process exits.

use std::{marker::PhantomData, sync::LazyLock};

use allocator_api2::alloc::Global;

use crate::{
    config::{Configure, DefaultConfig},
    shape::{Assemble, DeclaredShape},
    SingletonError, SingletonEvent, SingletonRegistry,
};

static GLOBAL: LazyLock<SingletonRegistry> = LazyLock::new(SingletonRegistry::new);

/// Typed access to the process-wide instance of `T` under configuration `C`.
///
/// # Examples
///
/// ```rust
/// use reside_singleton::Singleton;
///
/// let a: &'static String = Singleton::<String>::instance().unwrap();
/// let b: &'static String = Singleton::<String>::instance().unwrap();
/// assert!(std::ptr::eq(a, b));
/// ```
pub struct Singleton<T, C = DefaultConfig>(PhantomData<fn() -> (T, C)>);

impl<T, C> Singleton<T, C>
where
    C: Configure<T> + 'static,
    T: Assemble<C::Alloc, C::Args, C::Shape> + Send + Sync + 'static,
{
    /// The process-wide instance, constructed on first use.
    ///
    /// See [`SingletonRegistry::instance`] for the error cases.
    pub fn instance() -> Result<&'static T, SingletonError> {
        GLOBAL.instance::<T, C>()
    }

    pub fn is_constructed() -> bool {
        GLOBAL.is_constructed::<T>()
    }
}

/// The process-wide instance of `T` with the default configuration.
pub fn instance<T>() -> Result<&'static T, SingletonError>
where
    T: Assemble<Global, (), DeclaredShape> + Send + Sync + 'static,
{
    GLOBAL.instance::<T, DefaultConfig>()
}

/// The process-wide instance of `T` with configuration `C`.
pub fn instance_with<T, C>() -> Result<&'static T, SingletonError>
where
    C: Configure<T> + 'static,
    T: Assemble<C::Alloc, C::Args, C::Shape> + Send + Sync + 'static,
{
    GLOBAL.instance::<T, C>()
}

/// Whether the process-wide instance of `T` is live.
pub fn is_constructed<T: 'static>() -> bool {
    GLOBAL.is_constructed::<T>()
}

/// Set a tracing callback for the process-wide registry.
pub fn set_trace_callback(callback: impl Fn(&SingletonEvent) + Send + Sync + 'static) {
    GLOBAL.set_trace_callback(callback);
}

/// Clear the tracing callback of the process-wide registry.
pub fn clear_trace_callback() {
    GLOBAL.clear_trace_callback();
}

/// Destroys every process-wide instance and returns the number released.
///
/// # Safety
///
/// Every `&'static` reference obtained from this module dangles afterwards:
/// none may be used again, and no other thread may access the process-wide
/// registry while this runs.
pub unsafe fn shutdown() -> usize {
    // SAFETY: forwarded from the caller's contract.
    unsafe { GLOBAL.release_all() }
}
