//! Syntax tree for a single line of a `.tl` schema.
//!
//! These types are a faithful picture of what was written. The resolved,
//! decoder-facing model lives in [`crate::schema`].

mod category;
mod definition;
mod flag;
mod parameter;
mod parameter_type;
mod ty;

pub use category::Category;
pub use definition::Definition;
pub use flag::Flag;
pub use parameter::Parameter;
pub use parameter_type::ParameterType;
pub use ty::Type;
