// Evaluation over derived metrics: ratings, head-to-head comparison, and
// team aggregation.

pub mod aggregate;
pub mod comparison;
pub mod rating;
