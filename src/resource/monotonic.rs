use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};

use super::{new_delete_resource, same_resource, MemoryResource};

const BUFFER_ALIGN: usize = 16;

/// A fixed buffer handed out front to back, falling back to an upstream
/// resource once it is exhausted.
///
/// Storage carved from the buffer is never reused: deallocating it is a no-op
/// and the whole buffer is released when the resource is dropped. Storage
/// obtained from upstream is returned to upstream.
///
/// # Examples
///
/// ```rust
/// use reside_singleton::resource::{MemoryResource, MonotonicBufferResource};
/// use allocator_api2::alloc::Layout;
///
/// let arena = MonotonicBufferResource::new(1024);
/// let block = arena.allocate(Layout::new::<u64>()).unwrap();
/// assert!(arena.owns(block.cast()));
/// assert_eq!(arena.remaining(), 1016);
/// ```
pub struct MonotonicBufferResource<'r> {
    base: NonNull<u8>,
    capacity: usize,
    offset: AtomicUsize,
    upstream: &'r dyn MemoryResource,
}

// SAFETY: `base` is only written through disjoint ranges handed out by the
// atomic bump in `allocate`; the buffer itself is owned by the resource.
unsafe impl Send for MonotonicBufferResource<'_> {}
unsafe impl Sync for MonotonicBufferResource<'_> {}

impl MonotonicBufferResource<'static> {
    /// A buffer of `capacity` bytes falling back to the heap.
    pub fn new(capacity: usize) -> Self {
        MonotonicBufferResource::with_upstream(capacity, new_delete_resource())
    }
}

impl<'r> MonotonicBufferResource<'r> {
    /// A buffer of `capacity` bytes falling back to `upstream`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer itself cannot be allocated.
    pub fn with_upstream(capacity: usize, upstream: &'r dyn MemoryResource) -> Self {
        let layout = Self::buffer_layout(capacity);
        let base = match Global.allocate(layout) {
            Ok(block) => block.cast::<u8>(),
            Err(_) => std::alloc::handle_alloc_error(layout),
        };
        MonotonicBufferResource {
            base,
            capacity,
            offset: AtomicUsize::new(0),
            upstream,
        }
    }

    fn buffer_layout(capacity: usize) -> Layout {
        match Layout::from_size_align(capacity, BUFFER_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("buffer capacity {capacity} overflows a layout"),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes of the buffer not yet handed out.
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.load(Ordering::Acquire)
    }

    pub fn upstream(&self) -> &'r dyn MemoryResource {
        self.upstream
    }

    /// Whether `ptr` points into the buffer.
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let start = self.base.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr < start + self.capacity
    }

    fn bump(&self, layout: Layout) -> Option<NonNull<[u8]>> {
        let start = self.base.as_ptr() as usize;
        let mut current = self.offset.load(Ordering::Relaxed);
        loop {
            let aligned = (start + current).checked_next_multiple_of(layout.align())? - start;
            let end = aligned.checked_add(layout.size())?;
            if end > self.capacity {
                return None;
            }
            match self.offset.compare_exchange_weak(
                current,
                end,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    // SAFETY: `aligned + size <= capacity`, so the range lies within the buffer.
                    let ptr = unsafe { self.base.as_ptr().add(aligned) };
                    let block = std::ptr::slice_from_raw_parts_mut(ptr, layout.size());
                    return NonNull::new(block);
                }
                Err(observed) => current = observed,
            }
        }
    }
}

impl MemoryResource for MonotonicBufferResource<'_> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        match self.bump(layout) {
            Some(block) => Ok(block),
            None => self.upstream.allocate(layout),
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 || self.owns(ptr) {
            return;
        }
        // SAFETY: storage not carved from the buffer came from upstream.
        unsafe { self.upstream.deallocate(ptr, layout) }
    }

    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        same_resource(self, other)
    }
}

impl Drop for MonotonicBufferResource<'_> {
    fn drop(&mut self) {
        // SAFETY: the buffer was allocated from `Global` with this layout.
        unsafe { Global.deallocate(self.base, Self::buffer_layout(self.capacity)) };
    }
}

impl fmt::Debug for MonotonicBufferResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonotonicBufferResource")
            .field("capacity", &self.capacity)
            .field("remaining", &self.remaining())
            .finish()
    }
}
