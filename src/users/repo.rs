use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::users::error::UserRepoError;
use crate::users::repo_types::{NewUser, Role, Subscription, User, UserPatch, UserStatus};

const USER_COLUMNS: &str = "serial, id, auth_method, role, subscription, status";

impl User {
    /// Insert a new user. Columns left as `None` take their storage default.
    pub async fn create(db: &PgPool, new: &NewUser) -> Result<User, UserRepoError> {
        let mut columns = Vec::new();
        if new.id.is_some() {
            columns.push("id");
        }
        if new.auth_method.is_some() {
            columns.push("auth_method");
        }
        if new.role.is_some() {
            columns.push("role");
        }
        if new.subscription.is_some() {
            columns.push("subscription");
        }
        if new.status.is_some() {
            columns.push("status");
        }

        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO users ");
        if columns.is_empty() {
            qb.push("DEFAULT VALUES");
        } else {
            qb.push("(");
            qb.push(columns.join(", "));
            qb.push(") VALUES (");
            let mut values = qb.separated(", ");
            if let Some(id) = new.id {
                values.push_bind(id);
            }
            if let Some(auth_method) = new.auth_method {
                values.push_bind(auth_method);
            }
            if let Some(role) = new.role {
                values.push_bind(role);
            }
            if let Some(subscription) = new.subscription {
                values.push_bind(subscription);
            }
            if let Some(status) = new.status {
                values.push_bind(status);
            }
            values.push_unseparated(")");
        }
        qb.push(" RETURNING ");
        qb.push(USER_COLUMNS);

        let user = qb.build_query_as::<User>().fetch_one(db).await?;
        debug!(user_id = %user.id, serial = user.serial, "user created");
        Ok(user)
    }

    /// Find a user by its public id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, UserRepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT serial, id, auth_method, role, subscription, status
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_serial(db: &PgPool, serial: i32) -> Result<Option<User>, UserRepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT serial, id, auth_method, role, subscription, status
            FROM users
            WHERE serial = $1
            "#,
        )
        .bind(serial)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Apply a partial update. `id` and `serial` are never touched.
    pub async fn update(db: &PgPool, id: Uuid, patch: &UserPatch) -> Result<User, UserRepoError> {
        if patch.is_empty() {
            return Self::find_by_id(db, id).await?.ok_or(UserRepoError::NotFound);
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET auth_method  = COALESCE($2, auth_method),
                   role         = COALESCE($3, role),
                   subscription = COALESCE($4, subscription),
                   status       = COALESCE($5, status)
             WHERE id = $1
            RETURNING serial, id, auth_method, role, subscription, status
            "#,
        )
        .bind(id)
        .bind(patch.auth_method)
        .bind(patch.role)
        .bind(patch.subscription)
        .bind(patch.status)
        .fetch_optional(db)
        .await?
        .ok_or(UserRepoError::NotFound)?;

        debug!(user_id = %user.id, ?patch, "user updated");
        Ok(user)
    }

    pub async fn set_role(db: &PgPool, id: Uuid, role: Role) -> Result<User, UserRepoError> {
        let patch = UserPatch {
            role: Some(role),
            ..Default::default()
        };
        Self::update(db, id, &patch).await
    }

    pub async fn set_subscription(
        db: &PgPool,
        id: Uuid,
        subscription: Subscription,
    ) -> Result<User, UserRepoError> {
        let patch = UserPatch {
            subscription: Some(subscription),
            ..Default::default()
        };
        Self::update(db, id, &patch).await
    }

    pub async fn set_status(
        db: &PgPool,
        id: Uuid,
        status: UserStatus,
    ) -> Result<User, UserRepoError> {
        let patch = UserPatch {
            status: Some(status),
            ..Default::default()
        };
        Self::update(db, id, &patch).await
    }
}
