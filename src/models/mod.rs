pub mod price_observation;
pub mod product_rule;

// Re-exports for convenience
pub use price_observation::*;
pub use product_rule::*;
