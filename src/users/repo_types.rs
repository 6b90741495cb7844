use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::users::error::UnknownVariant;

/// Declares a closed vocabulary backed by a native Postgres enum type.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident => $pg_type:tt {
            $($(#[$vmeta:meta])* $variant:ident => $label:tt),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[sqlx(type_name = $pg_type, rename_all = "lowercase")]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $pg_type,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// How the account signs in.
    AuthMethod => "user_auth_method" {
        Email => "email",
        Google => "google",
    }
}

vocabulary! {
    Role => "user_role" {
        User => "user",
        Admin => "admin",
    }
}

vocabulary! {
    Subscription => "user_subscription" {
        Free => "free",
        Pro => "pro",
    }
}

vocabulary! {
    /// Account status. New rows default to `Active`.
    #[derive(Default)]
    UserStatus => "user_status" {
        #[default]
        Active => "active",
        Inactive => "inactive",
        Banned => "banned",
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    #[serde(skip_serializing)]
    pub serial: i32, // internal key, never exposed
    pub id: Uuid,
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub subscription: Option<Subscription>,
    pub status: Option<UserStatus>,
}

/// Values for a new row. `None` leaves the column to its storage default.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub id: Option<Uuid>,
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub subscription: Option<Subscription>,
    pub status: Option<UserStatus>,
}

/// Partial update of the mutable columns. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub subscription: Option<Subscription>,
    pub status: Option<UserStatus>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.auth_method.is_none()
            && self.role.is_none()
            && self.subscription.is_none()
            && self.status.is_none()
    }
}
