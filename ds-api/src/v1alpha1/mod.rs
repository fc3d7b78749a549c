mod devspace;

pub use devspace::*;
