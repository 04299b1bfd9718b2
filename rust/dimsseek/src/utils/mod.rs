pub mod correlation;
pub mod timings;
