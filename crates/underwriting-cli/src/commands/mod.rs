pub mod amortize;
pub mod classify;
pub mod evaluate;
pub mod grade;
