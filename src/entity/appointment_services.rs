use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointment_services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub appointment_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub service_id: Uuid,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::appointment_requests::Entity",
        from = "Column::AppointmentId",
        to = "super::appointment_requests::Column::Id"
    )]
    AppointmentRequests,
}

impl Related<super::appointment_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppointmentRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
