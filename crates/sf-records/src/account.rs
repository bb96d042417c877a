use serde::Deserialize;
use serde::Serialize;
use sf_core::Credits;
use sf_core::ID;
use sf_core::Player;
use sf_core::Unique;

/// Account standing checked before any spin is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

/// A player account row: identity, standing, and the credit balance the
/// wallet ledger moves against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    id: ID<Player>,
    status: AccountStatus,
    credits: Credits,
    flags: Vec<String>,
}

impl Account {
    pub fn new(id: ID<Player>, credits: Credits) -> Self {
        Self {
            id,
            status: AccountStatus::Active,
            credits,
            flags: Vec::new(),
        }
    }
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }
    /// Rebuild a stored row.
    pub fn restore(
        id: ID<Player>,
        status: AccountStatus,
        credits: Credits,
        flags: Vec<String>,
    ) -> Self {
        Self {
            id,
            status,
            credits,
            flags,
        }
    }
    pub fn status(&self) -> AccountStatus {
        self.status
    }
    pub fn credits(&self) -> Credits {
        self.credits
    }
    pub fn flags(&self) -> &[String] {
        &self.flags
    }
    pub fn active(&self) -> bool {
        self.status == AccountStatus::Active
    }
    /// Add credits to the balance.
    pub fn credit(&mut self, amount: Credits) {
        self.credits += amount;
    }
    /// Remove credits; refused when the balance would go negative.
    pub fn debit(&mut self, amount: Credits) -> bool {
        if amount > self.credits {
            return false;
        }
        self.credits -= amount;
        true
    }
}

impl Unique<Player> for Account {
    fn id(&self) -> ID<Player> {
        self.id
    }
}

#[cfg(feature = "database")]
mod schema {
    use super::*;
    use sf_pg::*;

    impl Table for Account {
        fn name() -> &'static str {
            PLAYERS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                PLAYERS,
                " (
                    id          UUID PRIMARY KEY,
                    status      VARCHAR(16) NOT NULL,
                    credits     BIGINT NOT NULL CHECK (credits >= 0),
                    flags       JSONB NOT NULL DEFAULT '[]'
                );"
            )
        }
        fn indices() -> &'static str {
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_refuses_overdraft() {
        let mut account = Account::new(ID::default(), 100);
        assert!(!account.debit(101));
        assert_eq!(account.credits(), 100);
        assert!(account.debit(100));
        assert_eq!(account.credits(), 0);
    }

    #[test]
    fn status_gates_activity() {
        let account = Account::new(ID::default(), 0).with_status(AccountStatus::Suspended);
        assert!(!account.active());
    }
}
