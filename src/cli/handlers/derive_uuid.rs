//! `derive-uuid` command handler

use uuid::Uuid;

use crate::utils::privy_user_id_to_uuid;

/// Prints the UUID a Privy user id is stored under.
pub struct DeriveUuidCommandHandler {
    privy_user_id: String,
}

impl DeriveUuidCommandHandler {
    pub fn new(privy_user_id: impl Into<String>) -> Self {
        Self {
            privy_user_id: privy_user_id.into(),
        }
    }

    pub fn derive(&self) -> Uuid {
        privy_user_id_to_uuid(self.privy_user_id.trim())
    }

    pub fn execute(&self) -> anyhow::Result<()> {
        println!("{}", self.derive());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_matches_identity_mapping() {
        let handler = DeriveUuidCommandHandler::new("did:privy:abc");
        assert_eq!(handler.derive(), privy_user_id_to_uuid("did:privy:abc"));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(
            DeriveUuidCommandHandler::new(" did:privy:abc\n").derive(),
            DeriveUuidCommandHandler::new("did:privy:abc").derive()
        );
    }
}
