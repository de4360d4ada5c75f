//! Array entry points
//!
//! Generated code sees an array as an opaque `*const BmArray` plus an element
//! size. Elements cross the boundary as raw bytes: scalars are copied
//! verbatim, and string elements travel as string handles. The handle is the
//! pointer of an `Rc<BmArray>`, so `incref`/`decref` adjust the `Rc` count
//! directly.

use core::mem::{self, ManuallyDrop};
use core::{ptr, slice};
use std::rc::Rc;

use crate::array::{ByteSlots, Slots, validate_length};
use crate::error::{RuntimeError, RuntimeResult};
use crate::registry::{HandleKind, registry};
use crate::report::{ResultExt, fatal};
use crate::string::BmString;

use super::string::{into_handle, live_string};

/// Size of a string element slot as seen by generated code.
const STRING_ELEMENT_SIZE: usize = mem::size_of::<*mut BmString>();

/// Type-erased array behind a C handle.
pub struct BmArray {
    storage: Storage,
}

enum Storage {
    Scalars(ByteSlots),
    Strings(Slots<Option<BmString>>),
}

impl BmArray {
    fn create(
        length: i32,
        declared_length: i32,
        element_size: i32,
        is_string_element: bool,
    ) -> RuntimeResult<Self> {
        let length = validate_length(length, declared_length)?;
        let element_size = usize::try_from(element_size)
            .ok()
            .filter(|&size| size > 0)
            .ok_or_else(|| RuntimeError::non_positive_element_size(element_size))?;

        let storage = if is_string_element {
            if element_size != STRING_ELEMENT_SIZE {
                return Err(RuntimeError::string_element_size(
                    element_size,
                    STRING_ELEMENT_SIZE,
                ));
            }
            Storage::Strings(Slots::zeroed(length)?)
        } else {
            Storage::Scalars(ByteSlots::zeroed(length, element_size)?)
        };
        Ok(Self { storage })
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Scalars(bytes) => bytes.len(),
            Storage::Strings(slots) => slots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_size(&self) -> usize {
        match &self.storage {
            Storage::Scalars(bytes) => bytes.element_size(),
            Storage::Strings(_) => STRING_ELEMENT_SIZE,
        }
    }

    pub fn is_string_element(&self) -> bool {
        matches!(self.storage, Storage::Strings(_))
    }
}

/// Resolve a handle that must be live.
///
/// # Safety
///
/// A live `array` must point to a `BmArray` created by `_bminor_array_new`.
unsafe fn live_array<'a>(array: *const BmArray) -> RuntimeResult<&'a BmArray> {
    if array.is_null() {
        return Err(RuntimeError::null_array());
    }
    if !registry().admits(array, HandleKind::Array) {
        return Err(RuntimeError::released_array());
    }
    Ok(unsafe { &*array })
}

/// Whether `array` may be counted, warning about released handles.
fn countable(array: *const BmArray, operation: &str) -> bool {
    if array.is_null() {
        return false;
    }
    if !registry().admits(array, HandleKind::Array) {
        tracing::warn!(handle = ?array, "{operation} of released array ignored");
        return false;
    }
    true
}

/// Allocate a zeroed array with a reference count of 1.
///
/// `declared_length` is the static size from the array's declaration, or 0
/// when there is none. String arrays store one string handle per element.
#[unsafe(no_mangle)]
pub extern "C" fn _bminor_array_new(
    length: i32,
    declared_length: i32,
    element_size: i32,
    is_string_element: bool,
) -> *const BmArray {
    let array = BmArray::create(length, declared_length, element_size, is_string_element)
        .or_fatal();
    tracing::debug!(
        length = array.len(),
        element_size = array.element_size(),
        is_string_element,
        "array created"
    );
    let handle = Rc::into_raw(Rc::new(array));
    registry().register(handle, HandleKind::Array);
    handle
}

/// Element count, or 0 for a null or released array.
///
/// # Safety
///
/// `array` must be null or a handle returned by `_bminor_array_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_array_size(array: *const BmArray) -> i32 {
    if array.is_null() {
        return 0;
    }
    if !registry().admits(array, HandleKind::Array) {
        tracing::warn!(handle = ?array, "size of released array is 0");
        return 0;
    }
    let length = unsafe { &*array }.len();
    i32::try_from(length).unwrap_or(i32::MAX)
}

/// Copy the element at `index` into `dest`.
///
/// For string arrays `dest` receives a new string handle owned by the caller,
/// or null for an unset element.
///
/// # Safety
///
/// `array` must be null or a handle returned by `_bminor_array_new`. `dest`
/// must be null or valid for writes of the array's element size.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_array_get(array: *const BmArray, index: i32, dest: *mut u8) {
    let array = unsafe { live_array(array) }.or_fatal();
    if dest.is_null() {
        fatal(&RuntimeError::null_element_buffer());
    }
    tracing::trace!(index, "array get");

    match &array.storage {
        Storage::Scalars(bytes) => {
            let out = unsafe { slice::from_raw_parts_mut(dest, bytes.element_size()) };
            bytes.read(index, out).or_fatal();
        }
        Storage::Strings(slots) => {
            let element = slots.get(index).or_fatal();
            let handle = element.map_or(ptr::null_mut(), into_handle);
            unsafe { dest.cast::<*mut BmString>().write_unaligned(handle) };
        }
    }
}

/// Overwrite the element at `index` from `src`.
///
/// For string arrays `src` holds a string handle. The array stores its own
/// copy of that string and releases whatever the element held before; the
/// caller keeps ownership of its handle.
///
/// # Safety
///
/// `array` must be null or a handle returned by `_bminor_array_new`. `src`
/// must be null or valid for reads of the array's element size.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_array_set(array: *const BmArray, index: i32, src: *const u8) {
    let array = unsafe { live_array(array) }.or_fatal();
    if src.is_null() {
        fatal(&RuntimeError::null_element_buffer());
    }
    tracing::trace!(index, "array set");

    match &array.storage {
        Storage::Scalars(bytes) => {
            let value = unsafe { slice::from_raw_parts(src, bytes.element_size()) };
            bytes.write(index, value).or_fatal();
        }
        Storage::Strings(slots) => {
            let handle = unsafe { src.cast::<*const BmString>().read_unaligned() };
            unsafe { store_string(slots, index, handle) };
        }
    }
}

/// Store a copy of the string behind `handle` at `index`, releasing the
/// previous occupant. A null or released handle leaves the slot unset.
///
/// # Safety
///
/// `handle` must be null or a handle returned by the string entry points.
unsafe fn store_string(slots: &Slots<Option<BmString>>, index: i32, handle: *const BmString) {
    let copy = unsafe { live_string(handle) }
        .map(BmString::try_clone)
        .transpose()
        .or_fatal();
    drop(slots.replace(index, copy).or_fatal());
}

/// Overwrite the string element at `index` with a copy of `value`.
///
/// Unlike [`_bminor_array_set`], `value` is the string handle itself rather
/// than a pointer to one; null stores an unset element. The caller keeps
/// ownership of `value`. Storing into a scalar array is fatal.
///
/// # Safety
///
/// `array` must be null or a handle returned by `_bminor_array_new`. `value`
/// must be null or a handle returned by this runtime.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_array_set_string(
    array: *const BmArray,
    index: i32,
    value: *const BmString,
) {
    let array = unsafe { live_array(array) }.or_fatal();
    tracing::trace!(index, "array set string");

    match &array.storage {
        Storage::Strings(slots) => unsafe { store_string(slots, index, value) },
        Storage::Scalars(_) => fatal(&RuntimeError::not_string_array()),
    }
}

/// Add an owner. Null is ignored.
///
/// # Safety
///
/// `array` must be null or a handle returned by `_bminor_array_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_array_incref(array: *const BmArray) {
    if countable(array, "incref") {
        unsafe { Rc::increment_strong_count(array) };
    }
}

/// Remove an owner, destroying the array and its string elements when it
/// was the last one. Null is ignored.
///
/// # Safety
///
/// `array` must be null or a handle returned by `_bminor_array_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_array_decref(array: *const BmArray) {
    if !countable(array, "decref") {
        return;
    }
    let shared = ManuallyDrop::new(unsafe { Rc::from_raw(array) });
    if Rc::strong_count(&*shared) == 1 {
        registry().unregister(array, HandleKind::Array);
        tracing::debug!(handle = ?array, "array destroyed");
    }
    unsafe { Rc::decrement_strong_count(array) };
}

/// Release an array handle; same as [`_bminor_array_decref`].
///
/// # Safety
///
/// `array` must be null or a handle returned by `_bminor_array_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _bminor_array_free(array: *const BmArray) {
    unsafe { _bminor_array_decref(array) }
}
