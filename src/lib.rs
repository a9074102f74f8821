//! # Reside Singleton
//!
//! Lazily constructed, thread-safe singletons whose storage comes from an
//! allocator chosen per type.
//!
//! Each held type gets exactly one instance, built on first access. The
//! type's configuration picks the allocator and the base constructor
//! arguments. The type's declared [`Capabilities`] pick how the allocator is
//! passed to its constructor: not at all, as a trailing argument, or after a
//! leading [`AllocatorArg`] tag.
//!
//! ## Quick Start
//!
//! ```rust
//! use reside_singleton::Singleton;
//!
//! // Constructed on first use, then shared.
//! let name: &'static String = Singleton::<String>::instance().unwrap();
//! assert!(name.is_empty());
//! assert!(Singleton::<String>::is_constructed());
//! ```
//!
//! ## Features
//!
//! - **Construct once**: concurrent first calls build the instance exactly once
//! - **Allocator-aware**: the [`Configure`] type supplies the storage and the allocator the
//!   instance keeps
//! - **Memory resources**: heap, monotonic arena and logging resources in [`resource`]
//! - **Tracing support**: optional callback on construction and teardown
//!
//! ## Main Entry Points
//!
//! - [`Singleton`] - typed access to the process-wide instance of a type
//! - [`SingletonRegistry`] - an owned registry, released when dropped
//! - [`define_singletons!`] - a named, isolated static registry
//! - [`set_trace_callback`] - tracing for the process-wide registry

mod capability;
mod config;
mod global;
mod handle;
mod macros;
mod registry;
mod shape;
mod singleton_error;
mod singleton_event;

pub mod resource;

pub use allocator_api2;

pub use capability::{
    AllocatorArg, AllocatorAware, Capabilities, CompatibleAllocator, Construct, ConstructError,
    HasTaggedAllocatorConstructor, HasTrailingAllocatorConstructor,
};
pub use config::{ConfigAlloc, ConfigArgs, ConfigShape, Configure, DefaultConfig};
pub use global::{
    clear_trace_callback, instance, instance_with, is_constructed, set_trace_callback, shutdown,
    Singleton,
};
pub use registry::{SingletonRegistry, TraceCallback};
pub use shape::{
    shape_of, Append, Assemble, ConstructionShape, DeclaredShape, LeadingTaggedAllocator, Plain,
    Prepend, ShapeArguments, ShapeKind, TrailingAllocator,
};
pub use singleton_error::SingletonError;
pub use singleton_event::SingletonEvent;
