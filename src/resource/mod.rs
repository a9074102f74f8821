//! Memory resources: providers of raw bytes that allocators are built on.
//!
//! - [`NewDeleteResource`]: the global heap.
//! - [`MonotonicBufferResource`]: a fixed buffer that only grows, with upstream fallback.
//! - [`LoggingResource`]: traces traffic and a running byte total of a wrapped resource.
//! - [`PolymorphicAllocator`]: an [`Allocator`](allocator_api2::alloc::Allocator) over any of them.

use std::ptr::{self, NonNull};
use std::sync::{PoisonError, RwLock};

use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};

mod logging;
mod monotonic;
mod polymorphic;

pub use logging::{LoggingResource, ResourceEvent, ResourceTraceCallback};
pub use monotonic::MonotonicBufferResource;
pub use polymorphic::PolymorphicAllocator;

/// A source of raw storage.
pub trait MemoryResource: Send + Sync {
    /// Returns storage for `layout`, at least `layout.size()` bytes long.
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError>;

    /// Returns storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on a resource equal to this one,
    /// with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Whether storage from `other` can be returned to `self`.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool;
}

/// Whether two resource references name the same object.
pub fn same_resource(a: &dyn MemoryResource, b: &dyn MemoryResource) -> bool {
    ptr::addr_eq(a as *const dyn MemoryResource, b as *const dyn MemoryResource)
}

/// The global heap as a memory resource.
#[derive(Debug, Default)]
pub struct NewDeleteResource;

impl MemoryResource for NewDeleteResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller's contract.
        unsafe { Global.deallocate(ptr, layout) }
    }

    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        same_resource(self, other)
    }
}

static NEW_DELETE: NewDeleteResource = NewDeleteResource;

static DEFAULT_RESOURCE: RwLock<&'static dyn MemoryResource> = RwLock::new(&NEW_DELETE);

/// The process-wide heap resource.
pub fn new_delete_resource() -> &'static dyn MemoryResource {
    &NEW_DELETE
}

/// The resource used by [`PolymorphicAllocator::default`]. Initially [`new_delete_resource`].
pub fn default_resource() -> &'static dyn MemoryResource {
    *DEFAULT_RESOURCE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Replaces the default resource and returns the previous one.
///
/// Allocators already built from the old default keep using it.
pub fn set_default_resource(resource: &'static dyn MemoryResource) -> &'static dyn MemoryResource {
    let mut guard = DEFAULT_RESOURCE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, resource)
}
