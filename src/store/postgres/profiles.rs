use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use super::{PgStore, conflict_as_validation, from_db_time, to_db_time};
use crate::{
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::AppResult,
    models::UserProfile,
    store::{ProfileChanges, ProfileRepository},
};

#[async_trait]
impl ProfileRepository for PgStore {
    async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        let profile = Users::find_by_id(user_id.to_owned()).one(&self.orm).await?;
        Ok(profile.map(profile_from_entity))
    }

    async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let model = UserActive {
            id: Set(profile.user_id),
            name: Set(profile.name),
            surname: Set(profile.surname),
            phone: Set(profile.phone),
            email: Set(profile.email),
            is_admin: Set(profile.is_admin),
            created_at: Set(to_db_time(profile.created_at)),
        }
        .insert(&self.orm)
        .await
        .map_err(|err| conflict_as_validation(err, "profile already exists"))?;
        Ok(profile_from_entity(model))
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChanges,
    ) -> AppResult<Option<UserProfile>> {
        let Some(existing) = Users::find_by_id(user_id.to_owned()).one(&self.orm).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(profile_from_entity(existing)));
        }

        let mut active: UserActive = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(surname) = changes.surname {
            active.surname = Set(surname);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(phone);
        }
        let updated = active.update(&self.orm).await?;
        Ok(Some(profile_from_entity(updated)))
    }
}

fn profile_from_entity(model: UserModel) -> UserProfile {
    UserProfile {
        user_id: model.id,
        name: model.name,
        surname: model.surname,
        phone: model.phone,
        email: model.email,
        is_admin: model.is_admin,
        created_at: from_db_time(model.created_at),
    }
}
