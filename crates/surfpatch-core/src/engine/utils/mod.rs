//! Small numeric kernels used by the engine tasks.

pub mod clustering;
pub mod eigen;
pub mod modularity;
