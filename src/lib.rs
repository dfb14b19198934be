pub use rowmap_core::*;
