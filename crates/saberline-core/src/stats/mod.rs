// Raw records, metric values, and the calculator that connects them.

pub mod calculator;
pub mod derived;
pub mod metric;
pub mod record;
