use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "authrelay";

pub struct CredentialStore;

impl CredentialStore {
    /// Store the password for a login in the OS keychain
    pub fn store(login: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, login).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Password for a login, if the keychain has one
    pub fn get_password(login: &str) -> Option<String> {
        Entry::new(SERVICE_NAME, login)
            .and_then(|entry| entry.get_password())
            .ok()
    }

    /// Delete the stored password for a login
    pub fn delete(login: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, login).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}
