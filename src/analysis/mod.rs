//! Gap analysis: set comparison and scoring
//!
//! The comparator intersects mapped resume skills with mapped job skills and
//! attaches proficiency deltas; the scorer condenses the result into a single
//! 0..10 coverage score.

pub mod comparator;
pub mod scorer;

pub use comparator::{ComparisonDiagnostics, ComparisonOutput, GapComparator};
pub use scorer::Scorer;
