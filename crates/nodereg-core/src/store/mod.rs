// # List Store Implementations
//
// This module provides implementations of the ListStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileListStore, FileListStoreFactory};
pub use memory::{MemoryListStore, MemoryListStoreFactory};
