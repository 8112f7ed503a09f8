pub mod aggregate;
pub mod align;
pub mod consts;
pub mod correlation;
pub mod error;
pub mod filters;
pub mod io;
pub mod movie;
pub mod pipeline;
pub mod reference;
