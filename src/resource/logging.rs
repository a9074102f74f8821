use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use allocator_api2::alloc::{AllocError, Layout};

use super::MemoryResource;

/// Events emitted by a [`LoggingResource`], one per allocate/deallocate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvent {
    Allocate {
        bytes: usize,
        alignment: usize,
        /// Running total after this allocation
        total: usize,
    },
    Deallocate {
        bytes: usize,
        alignment: usize,
        /// Running total after this deallocation
        total: usize,
    },
}

impl fmt::Display for ResourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceEvent::Allocate {
                bytes,
                alignment,
                total,
            } => write!(
                f,
                "Allocating...   Number of bytes: {bytes}, Alignment size: {alignment}, Bytes allocated: {total}"
            ),
            ResourceEvent::Deallocate {
                bytes,
                alignment,
                total,
            } => write!(
                f,
                "Deallocating... Number of bytes: {bytes}, Alignment size: {alignment}, Bytes allocated: {total}"
            ),
        }
    }
}

/// Type alias for the tracing callback of a [`LoggingResource`].
pub type ResourceTraceCallback = dyn Fn(&ResourceEvent) + Send + Sync + 'static;

/// Wraps a memory resource and keeps a running total of the bytes it hands out.
///
/// Every call is reported to the trace callback (if any) and then delegated to
/// the wrapped resource unchanged.
///
/// # Examples
///
/// ```rust
/// use reside_singleton::resource::{LoggingResource, MemoryResource, new_delete_resource};
/// use allocator_api2::alloc::Layout;
///
/// let logging = LoggingResource::new(new_delete_resource());
/// logging.set_trace_callback(|event| println!("{event}"));
///
/// let layout = Layout::new::<[u64; 4]>();
/// let block = logging.allocate(layout).unwrap();
/// assert_eq!(logging.bytes_allocated(), 32);
/// unsafe { logging.deallocate(block.cast(), layout) };
/// assert_eq!(logging.bytes_allocated(), 0);
/// ```
pub struct LoggingResource<'r> {
    inner: &'r dyn MemoryResource,
    bytes_allocated: AtomicUsize,
    trace: Mutex<Option<Arc<ResourceTraceCallback>>>,
}

impl<'r> LoggingResource<'r> {
    pub fn new(inner: &'r dyn MemoryResource) -> Self {
        LoggingResource {
            inner,
            bytes_allocated: AtomicUsize::new(0),
            trace: Mutex::new(None),
        }
    }

    /// The wrapped resource.
    pub fn inner(&self) -> &'r dyn MemoryResource {
        self.inner
    }

    /// Bytes allocated through this resource and not yet deallocated.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated.load(Ordering::Acquire)
    }

    /// Sets a callback invoked with every allocate/deallocate event.
    ///
    /// The callback runs while the trace lock is held and must not allocate
    /// through this same resource.
    pub fn set_trace_callback(&self, callback: impl Fn(&ResourceEvent) + Send + Sync + 'static) {
        let mut guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::new(callback));
    }

    /// Clears the tracing callback.
    pub fn clear_trace_callback(&self) {
        let mut guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    fn emit_event(&self, event: &ResourceEvent) {
        let guard = self.trace.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = guard.as_ref() {
            callback(event);
        }
    }
}

impl MemoryResource for LoggingResource<'_> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let bytes = layout.size();
        let total = self.bytes_allocated.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.emit_event(&ResourceEvent::Allocate {
            bytes,
            alignment: layout.align(),
            total,
        });

        let result = self.inner.allocate(layout);
        if result.is_err() {
            self.bytes_allocated.fetch_sub(bytes, Ordering::AcqRel);
        }
        result
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let bytes = layout.size();
        let total = self
            .bytes_allocated
            .fetch_sub(bytes, Ordering::AcqRel)
            .wrapping_sub(bytes);
        self.emit_event(&ResourceEvent::Deallocate {
            bytes,
            alignment: layout.align(),
            total,
        });

        // SAFETY: forwarded from the caller's contract.
        unsafe { self.inner.deallocate(ptr, layout) }
    }

    /// Equal only to the wrapped resource itself.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        ptr::addr_eq(
            other as *const dyn MemoryResource,
            self.inner as *const dyn MemoryResource,
        )
    }
}

impl fmt::Debug for LoggingResource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingResource")
            .field("bytes_allocated", &self.bytes_allocated())
            .finish()
    }
}
