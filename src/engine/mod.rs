pub mod animator;
pub mod arena;
pub mod control;
pub mod distance;
pub mod evaluator;
pub mod operators;
