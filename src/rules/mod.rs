//! Bug rules and the compiled pattern set
//!
//! A rule is a named tracking signature whose pattern is searched for anywhere
//! in a fetched page body. Patterns the fast engine rejects (look-around,
//! backreferences) are retried with a backtracking engine; rules that neither
//! engine compiles are dropped at load time and reported, never fatal.

mod pattern_set;

pub use pattern_set::{PatternSet, Rule, RulePattern, RuleRow};
