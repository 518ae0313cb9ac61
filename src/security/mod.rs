mod path;

pub use path::{canonicalize_lenient, is_strictly_within, is_within, PathResolver, ResolvedPath};
