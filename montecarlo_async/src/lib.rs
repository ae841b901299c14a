//! Monte Carlo kernel that fans chunks out as blocking tokio tasks.

mod monte_carlo;

pub use monte_carlo::AsyncParallelKernel;
