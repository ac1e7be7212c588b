pub mod integrity;
pub mod keyschedule;
pub mod mtf;
pub mod sbwt;

pub use integrity::*;
pub use keyschedule::{alphabet, block_key, derive, invert, invert_alphabet, validate_key, Permutation};
pub use mtf::*;
pub use sbwt::*;
