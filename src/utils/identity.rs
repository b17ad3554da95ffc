use uuid::Uuid;

/// Map a Privy user id (e.g. `did:privy:clx...`) to a stable UUID.
///
/// Name-based UUID v5 in the URL namespace: the same id always yields the
/// same UUID, so it can key rows in tables whose primary key is a `uuid`.
pub fn privy_user_id_to_uuid(privy_user_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, privy_user_id.as_bytes())
}
