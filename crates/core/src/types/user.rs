//! Customer accounts.
//!
//! Users are created by the storefront app, not by the dashboard, so `User`
//! implements [`Entity`] but not [`Editable`](super::document::Editable):
//! the dashboard can only list and delete them.

use serde::{Deserialize, Serialize};

use super::document::Entity;
use super::id::UserId;
use super::price::Price;

/// A customer account.
///
/// The document identifier is the user's `uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip)]
    pub uid: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referrals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Price>,
    #[serde(default)]
    pub daily: DailyClaim,
}

/// Daily reward claim bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DailyClaim {
    /// When the last claim happened, as stored (timestamp or date string).
    #[serde(default)]
    pub claimed_time: Option<String>,
    /// Consecutive day counter.
    #[serde(default)]
    pub claimed_day: i64,
}

impl User {
    /// Display name ("First Last"), falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        if name.is_empty() {
            self.username.clone().unwrap_or_default()
        } else {
            name
        }
    }

    /// Case-insensitive substring match on the first name.
    #[must_use]
    pub fn first_name_contains(&self, term: &str) -> bool {
        self.first_name
            .to_lowercase()
            .contains(&term.trim().to_lowercase())
    }

    /// Balance, treating a missing value as zero.
    #[must_use]
    pub fn balance_or_zero(&self) -> Price {
        self.balance.unwrap_or_default()
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    const LABEL: &'static str = "user";
    const PLURAL: &'static str = "users";

    fn id(&self) -> &str {
        self.uid.as_str()
    }

    fn set_id(&mut self, id: String) {
        self.uid = UserId::from(id);
    }
}
