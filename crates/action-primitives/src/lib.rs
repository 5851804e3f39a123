//! L3 Action Primitives - synchronization and frame navigation for driven browser sessions
//!
//! This crate provides the building blocks the workflow layer composes:
//! - A synchronizer that polls the live document with bounded or deadline-driven retry
//! - A frame navigator that owns the session's position in the nested-frame tree
//! - Element primitives: click (with script fallback), fill, scroll, read text, settle

pub mod errors;
mod navigator;
mod primitives;
pub mod types;
mod waiting;

pub use errors::*;
pub use navigator::*;
pub use primitives::*;
pub use types::*;
pub use waiting::*;
