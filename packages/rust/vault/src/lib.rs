//! Notes on disk: scanning a vault directory, selecting notes, reading bodies.

mod scan;
mod selection;

pub use scan::{NoteSource, Vault};
pub use selection::{Selection, Term};
