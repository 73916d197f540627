//! The three composable sealing layers.
//!
//! Each layer is independently enable/disable-able and mutually independent:
//! the lexical layer is the only one that touches the shared codebook, the
//! structural and numeric layers depend only on the seeded source. The
//! pipeline composes them in the fixed order L1 -> L2 -> L3.
//!
//! License: MIT OR APACHE 2.0

pub mod lexical;
pub mod numeric;
pub mod structural;

pub use lexical::LexicalSealer;
pub use numeric::NumericSealer;
pub use structural::StructuralSealer;
