//! Built-in node and directive transforms.

pub mod hoist_static;
pub mod track_slot_scopes;
pub mod transform_element;
pub mod transform_slot_outlet;
pub mod transform_text;
pub mod v_bind;
pub mod v_for;
pub mod v_if;
pub mod v_on;
pub mod v_once;

pub use hoist_static::hoist_static;
pub use track_slot_scopes::track_slot_scopes;
pub use transform_element::transform_element;
pub use transform_slot_outlet::transform_slot_outlet;
pub use transform_text::transform_text;
pub use v_bind::transform_bind;
pub use v_for::transform_for;
pub use v_if::transform_if;
pub use v_on::transform_on;
pub use v_once::transform_once;
