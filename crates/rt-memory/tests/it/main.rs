//! Unit tests for [`memprobe_rt_memory`].

use memprobe_rt_memory::{self as memory, HeapMemory, Memory, GROW_FAILED, PAGE_SIZE};
use std::{cell::RefCell, rc::Rc};

#[test]
fn limits() {
    let mem = HeapMemory::with_limits(1, 2).unwrap();
    assert_eq!(mem.size(), 1);
    assert_eq!(mem.maximum(), 2);
    assert_eq!(mem.len(), PAGE_SIZE as usize);

    assert!(HeapMemory::with_limits(3, 2).is_err());
    assert!(HeapMemory::with_maximum(65537).is_err());
}

#[test]
fn growing() {
    let mem = HeapMemory::with_limits(1, 2).unwrap();
    assert_eq!(mem.i32_store(0xFFFC, 0x0403_0201), Ok(()));

    assert_eq!(mem.grow(0), 1);
    assert_eq!(mem.size(), 1);

    assert_eq!(mem.grow(1), 1);
    assert_eq!(mem.size(), 2);
    assert_eq!(mem.len(), 2 * PAGE_SIZE as usize);

    // Old contents are kept, new pages are zeroed.
    assert_eq!(mem.i32_load(0xFFFC), Ok(0x0403_0201));
    assert_eq!(mem.i32_load(PAGE_SIZE), Ok(0));

    assert_eq!(mem.grow(1), GROW_FAILED);
    assert_eq!(mem.size(), 2);
}

#[test]
fn bounds_checking() {
    let mem = HeapMemory::with_limits(1, 1).unwrap();
    assert_eq!(mem.i32_load(PAGE_SIZE - 4), Ok(0));
    assert!(mem.i32_load(PAGE_SIZE - 3).is_err());
    assert!(mem.i8_store(PAGE_SIZE, 1).is_err());
    assert!(mem.copy_to_slice(u32::MAX, &mut [0u8; 2]).is_err());
}

#[test]
fn grow_callback_fires_for_zero_delta() {
    let mem = HeapMemory::with_limits(1, 2).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));

    let recorded = events.clone();
    mem.set_grow_callback(Rc::new(
        move |grown: &HeapMemory, event: &memory::GrowEvent| {
            assert_eq!(grown.size(), event.new_size());
            recorded.borrow_mut().push((event.old_size(), event.new_size()));
        },
    ));

    assert_eq!(mem.grow(0), 1);
    assert_eq!(mem.grow(1), 1);
    assert_eq!(mem.grow(1), GROW_FAILED);

    assert_eq!(*events.borrow(), [(1, 1), (1, 2)]);
}

#[test]
fn instruction_helpers() {
    let mem = HeapMemory::with_limits(1, 3).unwrap();
    assert_eq!(memory::size(&mem), 1);
    assert_eq!(memory::grow(&mem, 2), 1);
    assert_eq!(memory::grow(&mem, 1), -1);
    assert_eq!(memory::size(&mem), 3);

    assert_eq!(memory::i32_store(&mem, 0, 4, 8, 42), Ok(()));
    assert_eq!(memory::i32_load(&mem, 0, 0, 12), Ok(42));

    let error = memory::i32_load(&mem, 0, 16, -1).unwrap_err();
    assert_eq!(
        error.to_string(),
        "invalid access of linear memory #0 at address 0xFFFFFFFF + 0x10"
    );
}

#[test]
fn rc_memory() {
    let mem = Rc::new(HeapMemory::with_limits(0, 1).unwrap());
    assert_eq!(Memory::grow(&mem, 1), 0);
    assert_eq!(Memory::size(&mem), 1);
}
