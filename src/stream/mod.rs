//! Bounds-checked byte access shared by every decoder in the crate.

pub(crate) mod io;
pub(crate) mod parser;
