use std::fmt;
use std::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator, Layout};

use super::{default_resource, same_resource, MemoryResource};

/// An [`Allocator`] that forwards to a [`MemoryResource`].
///
/// Copies share the resource, so any copy can free what another allocated.
/// Two allocators compare equal when their resources do.
///
/// # Examples
///
/// ```rust
/// use reside_singleton::resource::{LoggingResource, PolymorphicAllocator, new_delete_resource};
/// use allocator_api2::vec::Vec;
///
/// let logging = LoggingResource::new(new_delete_resource());
/// let mut v: Vec<u32, _> = Vec::new_in(PolymorphicAllocator::new(&logging));
/// v.push(7);
/// assert!(logging.bytes_allocated() >= 4);
/// drop(v);
/// assert_eq!(logging.bytes_allocated(), 0);
/// ```
#[derive(Clone, Copy)]
pub struct PolymorphicAllocator<'r> {
    resource: &'r dyn MemoryResource,
}

impl<'r> PolymorphicAllocator<'r> {
    pub fn new(resource: &'r dyn MemoryResource) -> Self {
        PolymorphicAllocator { resource }
    }

    pub fn resource(&self) -> &'r dyn MemoryResource {
        self.resource
    }
}

impl Default for PolymorphicAllocator<'static> {
    fn default() -> Self {
        PolymorphicAllocator::new(default_resource())
    }
}

impl<'r> From<&'r dyn MemoryResource> for PolymorphicAllocator<'r> {
    fn from(resource: &'r dyn MemoryResource) -> Self {
        PolymorphicAllocator::new(resource)
    }
}

unsafe impl Allocator for PolymorphicAllocator<'_> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.resource.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded from the caller's contract; copies share the resource.
        unsafe { self.resource.deallocate(ptr, layout) }
    }
}

impl PartialEq for PolymorphicAllocator<'_> {
    fn eq(&self, other: &Self) -> bool {
        same_resource(self.resource, other.resource) || self.resource.is_equal(other.resource)
    }
}

impl fmt::Debug for PolymorphicAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicAllocator")
            .field(
                "resource",
                &(self.resource as *const dyn MemoryResource as *const ()),
            )
            .finish()
    }
}
