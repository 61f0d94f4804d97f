//! Credential store adapters

mod in_memory_credential_store;
mod keyring_credential_store;

pub use in_memory_credential_store::InMemoryCredentialStore;
pub use keyring_credential_store::KeyringCredentialStore;
