//! Owner / operator authorization

use lendpool_core::{AccountId, ErrorCategory};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Privilege level of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Public,
    Operator,
    Owner,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("{caller} is not the owner")]
    NotOwner { caller: AccountId },

    #[error("{caller} is neither owner nor operator")]
    NotOperator { caller: AccountId },
}

impl AuthorizationError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Authorization
    }
}

/// Who may call the privileged operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: AccountId,
    #[serde(default)]
    operator: Option<AccountId>,
}

impl AccessControl {
    pub fn new(owner: AccountId, operator: Option<AccountId>) -> Self {
        Self { owner, operator }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn operator(&self) -> Option<&AccountId> {
        self.operator.as_ref()
    }

    pub fn role_of(&self, caller: &AccountId) -> Role {
        if *caller == self.owner {
            Role::Owner
        } else if self.operator.as_ref() == Some(caller) {
            Role::Operator
        } else {
            Role::Public
        }
    }

    pub fn require_owner(&self, caller: &AccountId) -> Result<(), AuthorizationError> {
        if self.role_of(caller) < Role::Owner {
            return Err(AuthorizationError::NotOwner {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    pub fn require_operator(&self, caller: &AccountId) -> Result<(), AuthorizationError> {
        if self.role_of(caller) < Role::Operator {
            return Err(AuthorizationError::NotOperator {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Replace the operator, returning the previous one
    pub fn set_operator(&mut self, operator: Option<AccountId>) -> Option<AccountId> {
        std::mem::replace(&mut self.operator, operator)
    }
}
