//! Command recording and GPU resource lifetime management on top of the
//! backend-neutral interface in `emberline_core`.

pub mod graphics;
