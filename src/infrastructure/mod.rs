pub mod name_refs;
pub mod state;

pub use name_refs::NameColumnRefs;
pub use state::Library;
