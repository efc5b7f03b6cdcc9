use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};

use super::{Store, new_id};
use crate::{
    dates::now_sec,
    entities::{auth_user, user_profile},
    error::AppResult,
};

const FALLBACK_USERNAME: &str = "movieboxd-user";

/// Lower-cases, collapses runs of non-alphanumerics into `-` and trims dashes from the ends.
pub fn normalize_username(seed: &str) -> String {
    let mut out = String::with_capacity(seed.len());
    for ch in seed.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() { FALLBACK_USERNAME.to_string() } else { trimmed.to_string() }
}

impl Store {
    pub async fn find_user_by_email(&self, email: &str) -> AppResult<Option<auth_user::Model>> {
        let user = auth_user::Entity::find()
            .filter(auth_user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    pub async fn find_user_with_profile(
        &self,
        id: &str,
    ) -> Result<Option<(auth_user::Model, Option<user_profile::Model>)>, sea_orm::DbErr> {
        auth_user::Entity::find_by_id(id.to_string())
            .find_also_related(user_profile::Entity)
            .one(&self.db)
            .await
    }

    /// Creates the credential row and its profile together. The username is derived
    /// from `username_seed` and suffixed `-2`, `-3`, ... until it is free.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        username_seed: &str,
        display_name: Option<&str>,
    ) -> AppResult<auth_user::Model> {
        let txn = self.db.begin().await?;

        let username = unique_username(&txn, username_seed).await?;
        let user = auth_user::Model {
            id: new_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now_sec(),
        };
        let row = auth_user::ActiveModel {
            id: Set(user.id.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            created_at: Set(user.created_at),
        };
        auth_user::Entity::insert(row).exec_without_returning(&txn).await?;

        let profile = user_profile::ActiveModel {
            id: Set(new_id()),
            user_id: Set(user.id.clone()),
            username: Set(username),
            display_name: Set(super::clean_text(display_name)),
        };
        user_profile::Entity::insert(profile).exec_without_returning(&txn).await?;

        txn.commit().await?;
        tracing::debug!(user_id = %user.id, "created user");
        Ok(user)
    }
}

async fn unique_username<C: ConnectionTrait>(conn: &C, seed: &str) -> AppResult<String> {
    let base = normalize_username(seed);
    let taken: HashSet<String> = user_profile::Entity::find()
        .select_only()
        .column(user_profile::Column::Username)
        .filter(
            user_profile::Column::Username
                .eq(base.as_str())
                .or(user_profile::Column::Username.starts_with(format!("{base}-"))),
        )
        .into_tuple::<String>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    if !taken.contains(&base) {
        return Ok(base);
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    #[test]
    fn normalizes_usernames() {
        assert_eq!(normalize_username("Ada Lovelace"), "ada-lovelace");
        assert_eq!(normalize_username("  --Film__Buff!! "), "film-buff");
        assert_eq!(normalize_username("***"), FALLBACK_USERNAME);
        assert_eq!(normalize_username(""), FALLBACK_USERNAME);
    }

    #[tokio::test]
    async fn usernames_get_numeric_suffixes() {
        let store = testing::store().await;
        let mut names = Vec::new();
        for email in ["a@x.test", "b@x.test", "c@x.test"] {
            let user = store.create_user(email, "1:00:00", "Film Fan", Some(" Fan ")).await.unwrap();
            let (_, profile) = store.find_user_with_profile(&user.id).await.unwrap().unwrap();
            let profile = profile.unwrap();
            assert_eq!(profile.display_name.as_deref(), Some("Fan"));
            names.push(profile.username);
        }
        assert_eq!(names, ["film-fan", "film-fan-2", "film-fan-3"]);
    }

    #[tokio::test]
    async fn finds_users_by_email() {
        let store = testing::store().await;
        let id = testing::user(&store, "who@x.test").await;
        let found = store.find_user_by_email("who@x.test").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(store.find_user_by_email("nobody@x.test").await.unwrap().is_none());
        assert!(store.find_user_with_profile("missing").await.unwrap().is_none());
    }
}
