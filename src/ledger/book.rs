use super::account::Account;

/// Insertion-ordered account registry.
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    accounts: Vec<Account>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, account: Account) -> &Account {
        let index = self.accounts.len();
        self.accounts.push(account);
        &self.accounts[index]
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }
}
