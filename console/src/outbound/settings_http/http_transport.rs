//! Reqwest-backed settings transport.
//!
//! This adapter owns transport details only: URL construction, JSON request
//! bodies, timeout and HTTP status mapping, and decoding responses into the
//! port's raw settings maps.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::dto::{FormFieldsResponseDto, TableColumnsResponseDto, ViewOptionsResponseDto};
use crate::domain::ports::{
    EntityConfigPatch, EntityConfigs, EntitySettingDelete, EntitySettingPatch, SettingsTransport,
    SettingsTransportError, ViewOptions,
};

const SETTINGS_PATH: &str = "/admin/api/settings";
const SETTING_ENTITY_PATH: &str = "/admin/api/settings/entity";
const FORM_FIELDS_PATH: &str = "/admin/api/settings/form-fields";
const FORM_FIELDS_ENTITY_PATH: &str = "/admin/api/settings/form-fields/entity";
const TABLE_COLUMNS_PATH: &str = "/admin/api/settings/table-columns";
const TABLE_COLUMNS_ENTITY_PATH: &str = "/admin/api/settings/table-columns/entity";

/// Settings transport that talks to one admin API origin.
pub struct HttpSettingsTransport {
    client: Client,
    base_url: Url,
}

impl HttpSettingsTransport {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// Endpoint paths are absolute, so any path on `base_url` is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SettingsTransportError> {
        self.base_url.join(path).map_err(|error| {
            SettingsTransportError::transport(format!("invalid settings URL for {path}: {error}"))
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, SettingsTransportError> {
        let url = self.endpoint(path)?;
        Ok(self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn get<D: DeserializeOwned>(&self, path: &str) -> Result<D, SettingsTransportError> {
        let body = send(self.request(Method::GET, path)?).await?;
        decode(path, &body)
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        payload: &B,
    ) -> Result<(), SettingsTransportError> {
        send(self.request(method, path)?.json(payload)).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsTransport for HttpSettingsTransport {
    async fn fetch_view_options(&self) -> Result<ViewOptions, SettingsTransportError> {
        let dto: ViewOptionsResponseDto = self.get(SETTINGS_PATH).await?;
        Ok(dto.view_options)
    }

    async fn patch_entity_setting(
        &self,
        patch: &EntitySettingPatch,
    ) -> Result<(), SettingsTransportError> {
        self.send_json(Method::PATCH, SETTING_ENTITY_PATH, patch).await
    }

    async fn delete_entity_setting(
        &self,
        request: &EntitySettingDelete,
    ) -> Result<(), SettingsTransportError> {
        self.send_json(Method::DELETE, SETTING_ENTITY_PATH, request).await
    }

    async fn fetch_form_fields(&self) -> Result<EntityConfigs, SettingsTransportError> {
        let dto: FormFieldsResponseDto = self.get(FORM_FIELDS_PATH).await?;
        Ok(dto.form_fields)
    }

    async fn patch_form_fields(
        &self,
        patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError> {
        self.send_json(Method::PATCH, FORM_FIELDS_ENTITY_PATH, patch).await
    }

    async fn fetch_table_columns(&self) -> Result<EntityConfigs, SettingsTransportError> {
        let dto: TableColumnsResponseDto = self.get(TABLE_COLUMNS_PATH).await?;
        Ok(dto.table_columns)
    }

    async fn patch_table_columns(
        &self,
        patch: &EntityConfigPatch,
    ) -> Result<(), SettingsTransportError> {
        self.send_json(Method::PATCH, TABLE_COLUMNS_ENTITY_PATH, patch).await
    }
}

async fn send(request: RequestBuilder) -> Result<Vec<u8>, SettingsTransportError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn decode<D: DeserializeOwned>(path: &str, body: &[u8]) -> Result<D, SettingsTransportError> {
    serde_json::from_slice(body).map_err(|error| {
        SettingsTransportError::decode(format!("invalid JSON from {path}: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> SettingsTransportError {
    if error.is_timeout() {
        SettingsTransportError::transport(format!("request timed out: {error}"))
    } else {
        SettingsTransportError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> SettingsTransportError {
    if status == StatusCode::UNAUTHORIZED {
        return SettingsTransportError::unauthorized();
    }
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_owned()
    } else {
        preview
    };
    SettingsTransportError::status(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
