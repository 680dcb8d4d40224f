//! Lesson entity
//!
//! Rates are stored as thousandths of `currency`, snapshotted when the row
//! is inserted and never rewritten.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Teacher's assessment of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Evaluation {
    #[sea_orm(string_value = "Acceptable")]
    Acceptable,
    #[sea_orm(string_value = "Good")]
    Good,
    #[sea_orm(string_value = "VeryGood")]
    VeryGood,
    #[sea_orm(string_value = "Excellent")]
    Excellent,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub teacher_id: i32,
    pub family_id: i32,
    pub supervisor_id: Option<i32>,
    pub date: DateTime<Utc>,
    pub duration_minutes: i32,
    pub student_rate_milli: i64,
    pub teacher_rate_milli: i64,
    pub currency: String,
    pub evaluation: Option<Evaluation>,
    pub notes: Option<String>,
    pub is_absent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
