pub mod centroiding;
pub mod ms2_deconvoluter;

pub use centroiding::centroid_profile;
pub use ms2_deconvoluter::Ms2Deconvoluter;
