use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A staff member as exposed by the API. The password hash never leaves
/// the auth module.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "login_id": "tanaka",
        "name": "田中 太郎",
        "role_id": 2,
        "location_id": 3,
        "is_active": true
    })
)]
pub struct Staff {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "tanaka")]
    pub login_id: String,

    #[schema(example = "田中 太郎")]
    pub name: String,

    #[schema(example = 2)]
    pub role_id: u8,

    #[schema(example = 3, nullable = true)]
    pub location_id: Option<u64>,

    #[schema(example = true)]
    pub is_active: bool,
}
