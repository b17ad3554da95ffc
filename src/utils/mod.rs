pub mod identity;
pub mod validate;

pub use identity::privy_user_id_to_uuid;
pub use validate::{ValidatedJson, ValidatedQuery};
