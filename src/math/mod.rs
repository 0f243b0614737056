pub mod tick_math;
pub mod swap_math;
pub mod pool;
