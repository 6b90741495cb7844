use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::{AuthMethod, NewUser, Role, Subscription, User, UserPatch, UserStatus};

/// Request body for creating a user. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub id: Option<Uuid>,
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub subscription: Option<Subscription>,
    pub status: Option<UserStatus>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(r: CreateUserRequest) -> Self {
        Self {
            id: r.id,
            auth_method: r.auth_method,
            role: r.role,
            subscription: r.subscription,
            status: r.status,
        }
    }
}

/// Request body for updating a user. `id` is immutable and not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub subscription: Option<Subscription>,
    pub status: Option<UserStatus>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(r: UpdateUserRequest) -> Self {
        Self {
            auth_method: r.auth_method,
            role: r.role,
            subscription: r.subscription,
            status: r.status,
        }
    }
}

/// Public user info returned in responses.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub auth_method: Option<AuthMethod>,
    pub role: Option<Role>,
    pub subscription: Option<Subscription>,
    pub status: Option<UserStatus>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            auth_method: u.auth_method,
            role: u.role,
            subscription: u.subscription,
            status: u.status,
        }
    }
}
