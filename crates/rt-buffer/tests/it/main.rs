//! Unit tests for [`memprobe_rt_buffer`].

use memprobe_rt_buffer::{ArrayBuffer, BufferError, DetachKey, ErrorClass, Tag};
use memprobe_rt_core::{Classify, Generation, SourceId};
use memprobe_rt_memory::{HeapMemory, Memory, PAGE_SIZE};
use std::rc::Rc;

fn counting(len: u8) -> ArrayBuffer {
    ArrayBuffer::from_vec((0..len).collect()).unwrap()
}

#[test]
fn new_buffers_are_zeroed() {
    let buffer = ArrayBuffer::new(8).unwrap();
    assert_eq!(buffer.byte_length(), 8);
    assert!(!buffer.is_detached());
    assert_eq!(buffer.to_vec(), Ok(vec![0; 8]));
}

#[test]
fn identity() {
    let a = ArrayBuffer::new(4).unwrap();
    let b = ArrayBuffer::new(4).unwrap();
    let a_again = a.clone();

    assert!(a.same(&a_again));
    assert_eq!(a, a_again);
    assert!(!a.same(&b));
}

#[test]
fn slice_with_explicit_bounds() {
    let buffer = counting(8);
    let slice = buffer.slice(Some(2), Some(6)).unwrap();
    assert_eq!(slice.to_vec(), Ok(vec![2, 3, 4, 5]));
    assert!(!slice.same(&buffer));
}

#[test]
fn slice_with_default_bounds_copies() {
    let buffer = counting(8);
    let copy = buffer.slice(None, None).unwrap();
    assert_eq!(copy.to_vec(), buffer.to_vec());

    buffer.write(0, &[0xFF]).unwrap();
    assert_eq!(copy.to_vec().unwrap()[0], 0);
}

#[test]
fn slice_relative_indices() {
    let buffer = counting(8);

    fn expect(bytes: &[u8]) -> Vec<u8> {
        bytes.to_vec()
    }

    macro_rules! slices {
        ($(($start:expr, $end:expr) => $expected:expr,)*) => {$(
            let (start, end): (Option<i64>, Option<i64>) = ($start, $end);
            assert_eq!(
                buffer.slice(start, end).unwrap().to_vec(),
                Ok(expect(&$expected)),
                "slice({start:?}, {end:?})"
            );
        )*};
    }

    slices! {
        (Some(-2), None) => [6, 7],
        (Some(-100), Some(2)) => [0, 1],
        (Some(6), Some(100)) => [6, 7],
        (Some(5), Some(3)) => [],
        (Some(1), Some(-1)) => [1, 2, 3, 4, 5, 6],
        (Some(i64::MAX), None) => [],
        (Some(i64::MIN), Some(1)) => [0],
    }
}

#[test]
fn detached_buffers_reject_access() {
    let buffer = counting(8);
    buffer.detach(None).unwrap();

    assert!(buffer.is_detached());
    assert_eq!(buffer.byte_length(), 0);

    for result in [buffer.slice(Some(2), Some(6)), buffer.slice(None, None)] {
        let error = result.unwrap_err();
        assert_eq!(error, BufferError::Detached);
        assert_eq!(error.class(), ErrorClass::TypeError);
    }

    assert_eq!(buffer.read(0, &mut [0; 1]), Err(BufferError::Detached));
    assert_eq!(buffer.write(0, &[1]), Err(BufferError::Detached));
    assert_eq!(buffer.to_vec(), Err(BufferError::Detached));

    // Detaching twice is allowed.
    assert_eq!(buffer.detach(None), Ok(()));
}

#[test]
fn out_of_bounds_access_is_a_range_error() {
    let buffer = counting(4);
    let error = buffer.read(2, &mut [0; 4]).unwrap_err();
    assert_eq!(error.class(), ErrorClass::RangeError);
    assert_eq!(
        error.to_string(),
        "range of 4 bytes at offset 2 is outside of a buffer of 4 bytes"
    );
    assert!(buffer.write(usize::MAX, &[1, 2]).is_err());
}

#[test]
fn too_large() {
    let error = ArrayBuffer::new(usize::MAX).unwrap_err();
    assert_eq!(error.class(), ErrorClass::RangeError);
}

#[test]
fn transfer_detaches_the_source() {
    let buffer = counting(4);
    let moved = buffer.transfer(Some(6)).unwrap();

    assert!(buffer.is_detached());
    assert_eq!(moved.to_vec(), Ok(vec![0, 1, 2, 3, 0, 0]));
    assert_eq!(buffer.transfer(None).unwrap_err(), BufferError::Detached);

    let truncated = moved.transfer(Some(2)).unwrap();
    assert_eq!(truncated.to_vec(), Ok(vec![0, 1]));
}

#[test]
fn memory_backed_buffers() {
    let memory = Rc::new(HeapMemory::with_limits(1, 2).unwrap());
    let key = DetachKey::new();
    let tag = Tag::new(SourceId::fresh(), Generation::INITIAL);
    let buffer = ArrayBuffer::for_memory(memory.clone(), tag, key);

    assert!(buffer.is_memory_backed());
    assert_eq!(buffer.byte_length(), PAGE_SIZE as usize);
    assert_eq!(buffer.tag(), tag);

    // Writes through the buffer are visible in the memory, and the other way around.
    buffer.write(16, &[0xAB]).unwrap();
    assert_eq!(memory.i8_load(16), Ok(0xABu8 as i8));
    memory.i32_store(32, 0x0403_0201).unwrap();
    assert_eq!(buffer.slice(Some(32), Some(36)).unwrap().to_vec(), Ok(vec![1, 2, 3, 4]));

    // The byte length is fixed when the view is created.
    memory.grow(1);
    assert_eq!(buffer.byte_length(), PAGE_SIZE as usize);

    assert_eq!(buffer.detach(None), Err(BufferError::DetachKeyMismatch));
    assert_eq!(buffer.detach(Some(&DetachKey::new())), Err(BufferError::DetachKeyMismatch));
    assert_eq!(buffer.transfer(None).unwrap_err(), BufferError::NotTransferable);

    buffer.detach(Some(&key)).unwrap();
    assert_eq!(buffer.byte_length(), 0);
}
