use serde::Serialize;
use utoipa::ToSchema;

/// A learner. Belongs to exactly one family and is taught by one teacher.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub family_id: i32,
    pub teacher_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub family_id: i32,
    pub teacher_id: i32,
}
