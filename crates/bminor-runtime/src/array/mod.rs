//! Reference-counted fixed-length arrays
//!
//! [`Array<T>`] is a shared handle: cloning it adds an owner and dropping it
//! removes one, and the storage goes away with the last owner. Elements are
//! either plain scalars copied by value or owned strings copied deeply, so an
//! element read out of an array never aliases the array's own copy.
//!
//! The count is not atomic, so `Array<T>` is neither `Send` nor `Sync`.

mod slots;

use std::fmt;
use std::rc::Rc;

use crate::error::{RuntimeError, RuntimeResult};
use crate::string::BmString;

pub(crate) use slots::{ByteSlots, Slots};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Scalar,
    String,
}

/// A type that can live in an array slot.
pub trait Element: Clone + 'static {
    const KIND: ElementKind;

    /// Value of a freshly created slot.
    fn zeroed() -> Self;

    /// Copy handed out by [`Array::get`]. Fails only when a string copy
    /// cannot be allocated.
    fn try_copy(&self) -> RuntimeResult<Self>;
}

macro_rules! scalar_elements {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::Scalar;

                fn zeroed() -> Self {
                    <$ty>::default()
                }

                fn try_copy(&self) -> RuntimeResult<Self> {
                    Ok(*self)
                }
            }
        )*
    };
}

scalar_elements!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, char);

impl Element for BmString {
    const KIND: ElementKind = ElementKind::String;

    fn zeroed() -> Self {
        BmString::empty()
    }

    fn try_copy(&self) -> RuntimeResult<Self> {
        self.try_clone()
    }
}

/// String slot that may be unset.
impl Element for Option<BmString> {
    const KIND: ElementKind = ElementKind::String;

    fn zeroed() -> Self {
        None
    }

    fn try_copy(&self) -> RuntimeResult<Self> {
        self.as_ref().map(BmString::try_clone).transpose()
    }
}

/// Check a requested length against an optional declared size.
///
/// A `declared_length` of 0 means the array has no static size; otherwise the
/// runtime length must match it exactly.
pub fn validate_length(length: i32, declared_length: i32) -> RuntimeResult<usize> {
    if length <= 0 {
        return Err(RuntimeError::non_positive_size(length));
    }
    if declared_length != 0 {
        if declared_length < 0 {
            return Err(RuntimeError::negative_declared_size(declared_length));
        }
        if length > declared_length {
            return Err(RuntimeError::exceeds_declared_size(length, declared_length));
        }
        if length != declared_length {
            return Err(RuntimeError::size_mismatch(declared_length, length));
        }
    }
    usize::try_from(length).map_err(|_| RuntimeError::non_positive_size(length))
}

/// Map a language-level index onto a slot position.
pub(crate) fn check_index(index: i32, length: usize) -> RuntimeResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&slot| slot < length)
        .ok_or_else(|| RuntimeError::index_out_of_bounds(index, length))
}

pub struct Array<T: Element> {
    slots: Rc<Slots<T>>,
}

impl<T: Element> Array<T> {
    /// Allocate a zeroed array with a single owner.
    pub fn create(length: i32, declared_length: i32) -> RuntimeResult<Self> {
        let length = validate_length(length, declared_length)?;
        let slots = Slots::zeroed(length)?;
        tracing::debug!(length, kind = ?T::KIND, "array created");
        Ok(Self {
            slots: Rc::new(slots),
        })
    }

    /// Element count of a possibly absent array.
    pub fn size(array: Option<&Self>) -> usize {
        array.map_or(0, Self::len)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false for a created array; arrays have at least one slot.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the element at `index`. String elements are deep copies owned
    /// by the caller.
    pub fn get(&self, index: i32) -> RuntimeResult<T> {
        self.slots.get(index)
    }

    /// Store `value` at `index`, dropping the previous occupant.
    pub fn set(&self, index: i32, value: T) -> RuntimeResult<()> {
        self.slots.replace(index, value).map(drop)
    }

    /// Number of live owners.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.slots)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slots, &other.slots)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.slots.to_vec()
    }
}

impl<T: Element> Clone for Array<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Rc::clone(&self.slots),
        }
    }
}

impl<T: Element> Drop for Array<T> {
    fn drop(&mut self) {
        if Rc::strong_count(&self.slots) == 1 {
            tracing::debug!(length = self.len(), kind = ?T::KIND, "array destroyed");
        }
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("ref_count", &self.ref_count())
            .field("elements", &self.to_vec())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultKind;

    fn s(text: &str) -> BmString {
        BmString::from_literal(text.as_bytes()).unwrap()
    }

    fn fault<T: Element>(result: RuntimeResult<Array<T>>) -> FaultKind {
        match result {
            Ok(_) => panic!("expected a fault"),
            Err(err) => err.kind(),
        }
    }

    #[test]
    fn test_create_validation() {
        assert_eq!(fault(Array::<i32>::create(0, 0)), FaultKind::InvalidArraySize);
        assert_eq!(fault(Array::<i32>::create(-1, 0)), FaultKind::InvalidArraySize);
        assert_eq!(fault(Array::<i32>::create(3, 5)), FaultKind::ArraySizeMismatch);
        assert_eq!(fault(Array::<i32>::create(5, 3)), FaultKind::InvalidArraySize);
        assert_eq!(fault(Array::<i32>::create(3, -2)), FaultKind::InvalidArraySize);

        assert_eq!(Array::<i32>::create(3, 0).unwrap().len(), 3);
        assert_eq!(Array::<i32>::create(3, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_size_tolerates_absent() {
        assert_eq!(Array::<f64>::size(None), 0);
        let array = Array::<f64>::create(7, 0).unwrap();
        assert_eq!(Array::size(Some(&array)), 7);
        assert!(!array.is_empty());
    }

    #[test]
    fn test_scalar_round_trip() {
        let ints = Array::<i32>::create(4, 4).unwrap();
        for i in 0..4 {
            ints.set(i, i * 10 - 5).unwrap();
        }
        assert_eq!(ints.to_vec(), vec![-5, 5, 15, 25]);

        let floats = Array::<f32>::create(2, 0).unwrap();
        floats.set(1, 2.5).unwrap();
        assert_eq!(floats.get(1).unwrap(), 2.5);
        assert_eq!(floats.get(0).unwrap(), 0.0);

        let flags = Array::<bool>::create(1, 0).unwrap();
        flags.set(0, true).unwrap();
        assert!(flags.get(0).unwrap());

        let chars = Array::<char>::create(2, 0).unwrap();
        chars.set(0, 'x').unwrap();
        assert_eq!(chars.to_vec(), vec!['x', '\0']);
    }

    #[test]
    fn test_bounds() {
        let array = Array::<i64>::create(3, 0).unwrap();
        assert!(array.get(0).is_ok());
        assert!(array.get(2).is_ok());
        assert!(array.set(0, 1).is_ok());
        assert!(array.set(2, 1).is_ok());

        for index in [-1, 3, i32::MIN, i32::MAX] {
            assert_eq!(array.get(index).unwrap_err().kind(), FaultKind::IndexOutOfBounds);
            assert_eq!(
                array.set(index, 0).unwrap_err().kind(),
                FaultKind::IndexOutOfBounds
            );
        }
    }

    #[test]
    fn test_string_elements_are_independent() {
        let array = Array::<Option<BmString>>::create(4, 4).unwrap();
        let original = s("hello");
        array.set(2, Some(original.clone())).unwrap();
        drop(original);

        let first = array.get(2).unwrap().unwrap();
        let second = array.get(2).unwrap().unwrap();
        assert_eq!(first.as_bytes(), b"hello");
        assert_ne!(first.as_ptr(), second.as_ptr());

        drop(first);
        assert_eq!(array.get(2).unwrap(), Some(s("hello")));
        assert_eq!(array.get(0).unwrap(), None);
    }

    #[test]
    fn test_string_set_replaces_occupant() {
        let array = Array::<BmString>::create(1, 0).unwrap();
        assert_eq!(array.get(0).unwrap(), BmString::empty());
        array.set(0, s("first")).unwrap();
        array.set(0, s("second")).unwrap();
        assert_eq!(array.get(0).unwrap().as_bytes(), b"second");
    }

    #[test]
    fn test_shared_ownership() {
        let array = Array::<i32>::create(2, 0).unwrap();
        assert_eq!(array.ref_count(), 1);

        let shared = array.clone();
        assert_eq!(array.ref_count(), 2);
        assert!(array.ptr_eq(&shared));

        shared.set(1, 42).unwrap();
        assert_eq!(array.get(1).unwrap(), 42);

        drop(shared);
        assert_eq!(array.ref_count(), 1);
    }

    #[test]
    fn test_debug_format() {
        let array = Array::<u8>::create(2, 0).unwrap();
        array.set(0, 3).unwrap();
        assert_eq!(
            format!("{array:?}"),
            "Array { ref_count: 1, elements: [3, 0] }"
        );
    }
}
