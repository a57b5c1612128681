//! Keyboard, mouse and resize handling.

pub mod raw;
pub mod service;

pub use raw::ScrollDirection;
pub use service::{spawn_input_thread, InputAction, InputService, InputState, InputStateMachine};
