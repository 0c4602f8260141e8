//! Focus Flow Desk: the non-audio half of the app.
//!
//! - [`timer`] : countdown timer with session type and cycle counter
//! - [`board`] : three-column task board persisted on every change
//! - [`store`] : key/value storage the board persists through
//!
//! Nothing in here touches the audio engine.

pub mod board;
pub mod store;
pub mod timer;

pub use board::{Board, BoardError, BoardResult, Column, Task};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use timer::{format_mm_ss, CountdownTimer, SessionType, TimerEvent};
