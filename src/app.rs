//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the catalog lists, the
//! active view, selection and filter. Results of background catalog calls are
//! folded in through `app::catalog`.

mod catalog;
mod model;
mod view;

pub use catalog::CatalogEvent;
pub use model::*;
pub use view::*;
