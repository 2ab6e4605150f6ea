/// Gradient-stack CSS approximation of a decoded placeholder.
pub mod generate;
