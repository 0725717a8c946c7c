//! Domain types - core editing entities
//!
//! This module contains the value types shared by the project actor, the
//! highlight pipeline and the UI bridge. None of them carry behavior that
//! depends on threads or channels.

pub mod highlight;
pub mod mapping;
pub mod selection;
