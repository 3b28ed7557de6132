//! DTOs for decoding admin settings API responses.
//!
//! Request bodies reuse the port types directly since they already carry the
//! wire field names.

use serde::Deserialize;

use crate::domain::ports::{EntityConfigs, ViewOptions};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ViewOptionsResponseDto {
    #[serde(default)]
    pub(super) view_options: ViewOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FormFieldsResponseDto {
    #[serde(default)]
    pub(super) form_fields: EntityConfigs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TableColumnsResponseDto {
    #[serde(default)]
    pub(super) table_columns: EntityConfigs,
}
