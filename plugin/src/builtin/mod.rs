pub mod leaky_relu;

pub use leaky_relu::{LeakyRelu, LeakyReluCreator};
