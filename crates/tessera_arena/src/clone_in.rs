//! Deep cloning into an arena.

use bumpalo::Bump;

/// Clone a value whose storage lives in an arena into `allocator`.
///
/// Arena collections cannot implement [`Clone`] because the clone needs to
/// know which arena to allocate from.
pub trait CloneIn<'new> {
    type Cloned;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned;
}

impl<'old, 'new, T> CloneIn<'new> for bumpalo::boxed::Box<'old, T>
where
    T: CloneIn<'new>,
    T::Cloned: 'new,
{
    type Cloned = bumpalo::boxed::Box<'new, T::Cloned>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        bumpalo::boxed::Box::new_in(self.as_ref().clone_in(allocator), allocator)
    }
}

impl<'old, 'new, T> CloneIn<'new> for bumpalo::collections::Vec<'old, T>
where
    T: CloneIn<'new>,
    T::Cloned: 'new,
{
    type Cloned = bumpalo::collections::Vec<'new, T::Cloned>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        let mut out = bumpalo::collections::Vec::with_capacity_in(self.len(), allocator);
        for item in self.iter() {
            out.push(item.clone_in(allocator));
        }
        out
    }
}

impl<'new, T> CloneIn<'new> for Option<T>
where
    T: CloneIn<'new>,
{
    type Cloned = Option<T::Cloned>;

    fn clone_in(&self, allocator: &'new Bump) -> Self::Cloned {
        self.as_ref().map(|value| value.clone_in(allocator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Leaf(u32);

    impl<'new> CloneIn<'new> for Leaf {
        type Cloned = Leaf;

        fn clone_in(&self, _: &'new Bump) -> Self::Cloned {
            Leaf(self.0)
        }
    }

    #[test]
    fn test_clone_vec_into_other_arena() {
        let a = Bump::new();
        let b = Bump::new();
        let mut v = bumpalo::collections::Vec::new_in(&a);
        v.push(Leaf(1));
        v.push(Leaf(2));
        let cloned = v.clone_in(&b);
        assert_eq!(cloned.len(), 2);
        assert_eq!(cloned[1], Leaf(2));
    }
}
