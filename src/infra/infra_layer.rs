// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "ranks/ranks_store.rs"]
pub mod ranks;
