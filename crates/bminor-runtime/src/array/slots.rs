//! Fixed-length element storage shared by typed and C-facing arrays

use std::cell::RefCell;
use std::mem;

use super::{Element, check_index};
use crate::error::{RuntimeError, RuntimeResult};

/// Zero-initialized slots of a single element type.
///
/// Interior mutability lets every owner of a shared array write through a
/// shared reference. Borrows never outlive a single call.
pub(crate) struct Slots<T> {
    cells: RefCell<Box<[T]>>,
}

impl<T: Element> Slots<T> {
    pub(crate) fn zeroed(length: usize) -> RuntimeResult<Self> {
        let mut cells = Vec::new();
        cells.try_reserve_exact(length).map_err(|_| {
            RuntimeError::allocation_failure(length.saturating_mul(mem::size_of::<T>()))
        })?;
        cells.resize_with(length, T::zeroed);
        Ok(Self {
            cells: RefCell::new(cells.into_boxed_slice()),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.borrow().len()
    }

    /// Copy of the element at `index`.
    pub(crate) fn get(&self, index: i32) -> RuntimeResult<T> {
        let cells = self.cells.borrow();
        let slot = check_index(index, cells.len())?;
        cells[slot].try_copy()
    }

    /// Store `value` at `index`, returning the previous occupant.
    pub(crate) fn replace(&self, index: i32, value: T) -> RuntimeResult<T> {
        let mut cells = self.cells.borrow_mut();
        let slot = check_index(index, cells.len())?;
        Ok(mem::replace(&mut cells[slot], value))
    }

    pub(crate) fn to_vec(&self) -> Vec<T> {
        self.cells.borrow().to_vec()
    }
}

/// Raw element storage: `length * element_size` zeroed bytes.
pub(crate) struct ByteSlots {
    element_size: usize,
    length: usize,
    bytes: RefCell<Box<[u8]>>,
}

impl ByteSlots {
    pub(crate) fn zeroed(length: usize, element_size: usize) -> RuntimeResult<Self> {
        let total = length
            .checked_mul(element_size)
            .ok_or_else(|| RuntimeError::size_overflow(length, element_size))?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(total)
            .map_err(|_| RuntimeError::allocation_failure(total))?;
        bytes.resize(total, 0);
        Ok(Self {
            element_size,
            length,
            bytes: RefCell::new(bytes.into_boxed_slice()),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.length
    }

    pub(crate) fn element_size(&self) -> usize {
        self.element_size
    }

    /// Copy the element at `index` into `out`, which holds one element.
    pub(crate) fn read(&self, index: i32, out: &mut [u8]) -> RuntimeResult<()> {
        let start = check_index(index, self.length)? * self.element_size;
        out.copy_from_slice(&self.bytes.borrow()[start..start + self.element_size]);
        Ok(())
    }

    /// Overwrite the element at `index` with `value`, which holds one element.
    pub(crate) fn write(&self, index: i32, value: &[u8]) -> RuntimeResult<()> {
        let start = check_index(index, self.length)? * self.element_size;
        self.bytes.borrow_mut()[start..start + self.element_size].copy_from_slice(value);
        Ok(())
    }
}
