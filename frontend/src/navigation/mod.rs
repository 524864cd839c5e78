//! Route history and "go back" resolution.

pub mod history;
pub mod stack;

pub use history::{NavigationEntry, NavigationHistory};
pub use stack::{NavigationStack, NavigationTarget, PreviousPathBinding, ReturnData, Router};
