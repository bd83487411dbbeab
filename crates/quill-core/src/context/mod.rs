//! Prompt context: token budgeting and file references

pub mod budget;
pub mod mentions;

pub use budget::{
    chunk_for_budget, estimate_tokens, select_chunks, split_into_chunks, ChunkedTextForTokenBudget,
};
pub use mentions::{extract_mentions, resolve_context, ContextBudget, ContextEntry, ResolvedContext};
