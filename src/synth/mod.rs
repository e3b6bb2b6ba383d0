// Synthesis - recipe types, the recipe resolver and the DSP primitives
// used to realize recipes

pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod recipe;
pub mod resolver;

pub use recipe::SynthesisRecipe;
pub use resolver::resolve;
