//! Per-compile arena.

use bumpalo::Bump;

/// Owns the memory of one compile call.
///
/// The AST borrows from the allocator, so nothing parsed outlives it.
#[derive(Default)]
pub struct Allocator {
    bump: Bump,
}

impl Allocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the arena, typically from the template length.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn as_bump(&self) -> &Bump {
        &self.bump
    }

    /// Bytes handed out so far.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Allocate a value in the arena.
    #[inline]
    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }
}

impl std::ops::Deref for Allocator {
    type Target = Bump;

    fn deref(&self) -> &Self::Target {
        &self.bump
    }
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("allocated_bytes", &self.bump.allocated_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_str() {
        let allocator = Allocator::new();
        let s = allocator.alloc_str("template");
        assert_eq!(s, "template");
        assert!(allocator.allocated_bytes() > 0);
    }
}
