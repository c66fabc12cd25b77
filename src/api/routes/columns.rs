use axum::Json;
use serde::Serialize;

use crate::display::{all_columns, ColumnInfo};

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<ColumnInfo>,
}

pub async fn list_columns() -> Json<ColumnsResponse> {
    Json(ColumnsResponse {
        columns: all_columns(),
    })
}
