//! Per-type configuration of allocator and constructor arguments.
//!
//! A configuration is a marker type implementing [`Configure<T>`] for the held
//! type `T`. Both functions are called lazily, inside the construction sequence
//! of `T`, and only once per successful construction.
//!
//! The configuration also selects how the allocator reaches the constructor.
//! [`DeclaredShape`] follows the type's [`Capabilities`](crate::Capabilities).
//! [`Plain`](crate::Plain) leaves the allocator out; use it when the type keeps
//! an allocator of its own that cannot be built from the configured one.
//!
//! # Examples
//!
//! ```rust
//! use reside_singleton::{
//!     Capabilities, Configure, Construct, ConstructError, DeclaredShape, Plain,
//!     SingletonRegistry,
//! };
//! use allocator_api2::alloc::Global;
//!
//! struct Pair {
//!     i: i32,
//!     d: f64,
//! }
//!
//! impl Capabilities for Pair {
//!     type Shape = Plain;
//! }
//!
//! impl Construct<(i32, f64)> for Pair {
//!     fn construct((i, d): (i32, f64)) -> Result<Self, ConstructError> {
//!         Ok(Pair { i, d })
//!     }
//! }
//!
//! struct PairConfig;
//!
//! impl Configure<Pair> for PairConfig {
//!     type Alloc = Global;
//!     type Args = (i32, f64);
//!     type Shape = DeclaredShape;
//!
//!     fn allocator() -> Global {
//!         Global
//!     }
//!
//!     fn base_arguments(_: &Global) -> (i32, f64) {
//!         (3, 4.2)
//!     }
//! }
//!
//! let registry = SingletonRegistry::new();
//! let pair = registry.instance::<Pair, PairConfig>().unwrap();
//! assert_eq!((pair.i, pair.d), (3, 4.2));
//! ```

use allocator_api2::alloc::{Allocator, Global};

use crate::shape::DeclaredShape;

/// Supplies the allocator and the base constructor arguments for `T`.
pub trait Configure<T: ?Sized> {
    /// Allocator providing the storage of the instance. The same value frees it.
    type Alloc: Allocator + Send + Sync + 'static;

    /// Base constructor arguments, before argument shaping.
    type Args;

    /// Argument shaping: [`DeclaredShape`] or one of the strategy markers.
    type Shape;

    fn allocator() -> Self::Alloc;

    /// The resolved allocator is passed in case building the arguments allocates.
    fn base_arguments(alloc: &Self::Alloc) -> Self::Args;
}

/// Heap storage and no constructor arguments; shaping follows the type's declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfig;

impl<T: ?Sized> Configure<T> for DefaultConfig {
    type Alloc = Global;
    type Args = ();
    type Shape = DeclaredShape;

    fn allocator() -> Global {
        Global
    }

    fn base_arguments(_alloc: &Global) {}
}

/// The allocator configuration `C` resolves for `T`.
pub type ConfigAlloc<T, C> = <C as Configure<T>>::Alloc;

/// The base arguments configuration `C` resolves for `T`.
pub type ConfigArgs<T, C> = <C as Configure<T>>::Args;

/// The shaping strategy configuration `C` selects for `T`.
pub type ConfigShape<T, C> = <C as Configure<T>>::Shape;
