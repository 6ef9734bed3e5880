use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use super::{PgStore, decode, from_db_time, to_db_time};
use crate::{
    entity::{
        appointment_requests::{
            ActiveModel as AppointmentActive, Column as AppointmentCol,
            Entity as AppointmentRequests, Model as AppointmentModel,
        },
        appointment_services::{
            ActiveModel as AppointmentServiceActive, Column as AppointmentServiceCol,
            Entity as AppointmentServices,
        },
    },
    error::AppResult,
    models::{AppointmentRequest, AppointmentStatus},
    store::{AppointmentCounts, AppointmentFilter, AppointmentRepository, Page, Paged},
};

#[async_trait]
impl AppointmentRepository for PgStore {
    async fn create_appointment(
        &self,
        appointment: AppointmentRequest,
    ) -> AppResult<AppointmentRequest> {
        let txn = self.orm.begin().await?;

        let model = AppointmentActive {
            id: Set(appointment.id),
            name: Set(appointment.name.clone()),
            surname: Set(appointment.surname.clone()),
            phone: Set(appointment.phone.clone()),
            preferred_date: Set(to_db_time(appointment.preferred_date)),
            comment: Set(appointment.comment.clone()),
            status: Set(appointment.status.as_str().to_string()),
            created_at: Set(to_db_time(appointment.created_at)),
            updated_at: Set(to_db_time(appointment.updated_at)),
        }
        .insert(&txn)
        .await?;

        if !appointment.service_ids.is_empty() {
            let links = appointment
                .service_ids
                .iter()
                .enumerate()
                .map(|(position, service_id)| AppointmentServiceActive {
                    appointment_id: Set(appointment.id),
                    service_id: Set(*service_id),
                    position: Set(position as i32),
                });
            AppointmentServices::insert_many(links).exec(&txn).await?;
        }

        txn.commit().await?;

        appointment_from_entity(model, appointment.service_ids)
    }

    async fn get_appointment(&self, id: Uuid) -> AppResult<Option<AppointmentRequest>> {
        let Some(model) = AppointmentRequests::find_by_id(id).one(&self.orm).await? else {
            return Ok(None);
        };
        let service_ids = self.load_service_ids(model.id).await?;
        appointment_from_entity(model, service_ids).map(Some)
    }

    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: Page,
    ) -> AppResult<Paged<AppointmentRequest>> {
        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(AppointmentCol::Status.eq(status.as_str()));
        }

        let mut finder = AppointmentRequests::find().filter(condition);
        finder = if filter.oldest_first {
            finder.order_by_asc(AppointmentCol::CreatedAt)
        } else {
            finder.order_by_desc(AppointmentCol::CreatedAt)
        };

        let total = finder.clone().count(&self.orm).await?;
        let models = finder
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.orm)
            .await?;

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for link in AppointmentServices::find()
            .filter(AppointmentServiceCol::AppointmentId.is_in(ids))
            .order_by_asc(AppointmentServiceCol::Position)
            .all(&self.orm)
            .await?
        {
            grouped
                .entry(link.appointment_id)
                .or_default()
                .push(link.service_id);
        }

        let items = models
            .into_iter()
            .map(|model| {
                let service_ids = grouped.remove(&model.id).unwrap_or_default();
                appointment_from_entity(model, service_ids)
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Paged { items, total })
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Option<AppointmentRequest>> {
        let txn = self.orm.begin().await?;

        let Some(existing) = AppointmentRequests::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        let mut request = appointment_from_entity(existing.clone(), Vec::new())?;
        request.advance(status, at)?;

        let mut active: AppointmentActive = existing.into();
        active.status = Set(request.status.as_str().to_string());
        active.updated_at = Set(to_db_time(request.updated_at));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        let service_ids = self.load_service_ids(updated.id).await?;
        appointment_from_entity(updated, service_ids).map(Some)
    }

    async fn appointment_counts(&self) -> AppResult<AppointmentCounts> {
        let total = AppointmentRequests::find().count(&self.orm).await?;
        let pending = AppointmentRequests::find()
            .filter(AppointmentCol::Status.eq(AppointmentStatus::Pending.as_str()))
            .count(&self.orm)
            .await?;
        Ok(AppointmentCounts { total, pending })
    }
}

impl PgStore {
    async fn load_service_ids(&self, appointment_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = AppointmentServices::find()
            .filter(AppointmentServiceCol::AppointmentId.eq(appointment_id))
            .order_by_asc(AppointmentServiceCol::Position)
            .all(&self.orm)
            .await?
            .into_iter()
            .map(|link| link.service_id)
            .collect();
        Ok(ids)
    }
}

fn appointment_from_entity(
    model: AppointmentModel,
    service_ids: Vec<Uuid>,
) -> AppResult<AppointmentRequest> {
    Ok(AppointmentRequest {
        id: model.id,
        name: model.name,
        surname: model.surname,
        phone: model.phone,
        service_ids,
        preferred_date: from_db_time(model.preferred_date),
        comment: model.comment,
        status: decode("appointment_requests.status", &model.status)?,
        created_at: from_db_time(model.created_at),
        updated_at: from_db_time(model.updated_at),
    })
}
