use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointment_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub preferred_date: DateTimeWithTimeZone,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::appointment_services::Entity")]
    AppointmentServices,
}

impl Related<super::appointment_services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppointmentServices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
