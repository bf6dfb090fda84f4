use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Location {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "渋谷店")]
    pub name: String,
    #[schema(example = "東京都渋谷区1-2-3", nullable = true)]
    pub address: Option<String>,
}
