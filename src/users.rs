// src/users.rs
use crate::models::UserAccount;
use std::collections::HashMap;

const SEEDED_PASSWORD: &str = "password123";

/// Email-keyed account store. Passwords are kept and compared in plaintext;
/// this directory backs a demo and offers no credential security.
pub struct UserDirectory {
    by_email: HashMap<String, UserAccount>,
    next_id: u64,
}

impl UserDirectory {
    pub fn new() -> Self {
        let mut directory = UserDirectory {
            by_email: HashMap::new(),
            next_id: 1,
        };
        for email in ["user1@example.com", "user2@example.com"] {
            directory.create(email, SEEDED_PASSWORD);
        }
        directory
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserAccount> {
        self.by_email.get(email)
    }

    /// Returns `None` if the email is already registered.
    pub fn create(&mut self, email: &str, password: &str) -> Option<UserAccount> {
        if self.by_email.contains_key(email) {
            return None;
        }
        let account = UserAccount {
            id: self.next_id,
            email: email.to_string(),
            password: password.to_string(),
        };
        self.next_id += 1;
        self.by_email.insert(email.to_string(), account.clone());
        Some(account)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Option<UserAccount> {
        self.find_by_email(email)
            .filter(|account| account.password == password)
            .cloned()
    }
}
