use pixelq::error::PixelqError;
use pixelq::{FrameStacker, ReplayMemory, StackedState, Transition};
use std::collections::HashSet;
use std::sync::Arc;

fn state(tag: f32) -> StackedState {
    let mut stacker = FrameStacker::new(2);
    stacker.push(Arc::new(vec![tag]))
}

fn push_closed(memory: &mut ReplayMemory, tag: usize) {
    memory.append(Transition::open(state(tag as f32), tag));
    memory
        .close_last(1.0, state(tag as f32 + 0.5), false)
        .unwrap();
}

#[test]
fn capacity_bounds_and_fifo_eviction() {
    let capacity = 4;
    let mut memory = ReplayMemory::new(capacity, 0);

    for tag in 0..10 {
        push_closed(&mut memory, tag);
        assert!(memory.len() <= capacity);
    }

    assert!(memory.is_full());
    assert_eq!(memory.len(), capacity);

    // The oldest entries are the ones gone; insertion order survives.
    let tags: Vec<usize> = memory.iter().map(|t| t.action).collect();
    assert_eq!(tags, vec![6, 7, 8, 9]);
}

#[test]
fn only_the_newest_transition_is_open() {
    let mut memory = ReplayMemory::new(8, 0);
    for tag in 0..3 {
        push_closed(&mut memory, tag);
    }
    memory.append(Transition::open(state(3.0), 3));

    let open: Vec<usize> = memory
        .iter()
        .filter(|t| t.is_open())
        .map(|t| t.action)
        .collect();
    assert_eq!(open, vec![3]);
}

#[test]
fn sampling_returns_closed_transitions_only() {
    let mut memory = ReplayMemory::new(8, 0);
    for tag in 0..3 {
        push_closed(&mut memory, tag);
    }
    memory.append(Transition::open(state(3.0), 3));

    for _ in 0..20 {
        let batch = memory.sample(3).unwrap();
        assert!(batch.iter().all(|t| !t.is_open()));
    }

    // The open transition cannot make up the missing fourth entry.
    match memory.sample(4) {
        Err(PixelqError::InsufficientData {
            requested,
            available,
        }) => {
            assert_eq!(requested, 4);
            assert_eq!(available, 3);
        }
        other => panic!("expected InsufficientData, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn sampling_fails_when_only_the_open_transition_exists() {
    let mut memory = ReplayMemory::new(8, 0);
    memory.append(Transition::open(state(0.0), 0));
    assert!(matches!(
        memory.sample(1),
        Err(PixelqError::InsufficientData { available: 0, .. })
    ));
}

#[test]
fn sampling_is_without_replacement_within_a_batch() {
    let mut memory = ReplayMemory::new(16, 7);
    for tag in 0..8 {
        push_closed(&mut memory, tag);
    }

    for _ in 0..20 {
        let batch = memory.sample(8).unwrap();
        let tags: HashSet<usize> = batch.iter().map(|t| t.action).collect();
        assert_eq!(tags.len(), 8);
    }
}

#[test]
fn closing_without_an_open_transition_is_a_protocol_violation() {
    let mut memory = ReplayMemory::new(4, 0);
    assert!(matches!(
        memory.close_last(0.0, state(0.0), false),
        Err(PixelqError::EmptyMemoryClose)
    ));

    push_closed(&mut memory, 0);
    assert!(matches!(
        memory.close_last(0.0, state(0.0), false),
        Err(PixelqError::EmptyMemoryClose)
    ));
}

#[test]
fn closing_records_the_outcome() {
    let mut memory = ReplayMemory::new(4, 0);
    memory.append(Transition::open(state(0.0), 1));
    memory.close_last(2.5, state(1.0), true).unwrap();

    let t = memory.get(0).unwrap();
    assert_eq!(t.reward, Some(2.5));
    assert!(t.terminal);
    assert!(t.state_out.is_some());
}
