pub mod interactions;
pub mod member;

pub use interactions::handle_component;
pub use member::handle_member_add;
