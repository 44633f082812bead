use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use uuid::Uuid;

use super::{ImageStore, ProfileStore};
use crate::providers::assert_ok_response;
use crate::records::{ImageRecord, Profile, TattooUpdate};

const VENDOR: &str = "Supabase";

/// Supabase tables reached through their PostgREST endpoint.
pub struct PostgrestStore {
    rest_url: String,
    api_key: String,
    client: Client,
}

impl PostgrestStore {
    pub fn new(project_url: &str, api_key: &str, client: Client) -> Self {
        Self {
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            client,
        }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{name}", self.rest_url)
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Vec<T>> {
        let response = self.authed(builder).send().await?;
        let response = assert_ok_response(VENDOR, response).await?;
        Ok(response.json().await?)
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl ImageStore for PostgrestStore {
    async fn insert_image(&self, record: &ImageRecord) -> Result<()> {
        let request = self
            .client
            .post(self.table("images"))
            .header("Prefer", "return=minimal")
            .json(record);
        let response = self.authed(request).send().await?;
        assert_ok_response(VENDOR, response).await?;
        Ok(())
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        let request = self
            .client
            .get(self.table("images"))
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        let rows: Vec<ImageRecord> = self.fetch_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_images(&self, user_id: &str) -> Result<Vec<ImageRecord>> {
        let request = self.client.get(self.table("images")).query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ]);
        self.fetch_rows(request).await
    }

    async fn mark_processed(
        &self,
        id: Uuid,
        user_id: &str,
        update: &TattooUpdate,
    ) -> Result<Option<ImageRecord>> {
        let request = self
            .client
            .patch(self.table("images"))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header("Prefer", "return=representation")
            .json(&json!({
                "tattoo_path": update.tattoo_ref,
                "style": update.style,
                "processed": true,
            }));
        let rows: Vec<ImageRecord> = self.fetch_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_images(&self, user_id: &str) -> Result<Vec<ImageRecord>> {
        let request = self
            .client
            .delete(self.table("images"))
            .query(&[("user_id", eq(user_id))])
            .header("Prefer", "return=representation");
        self.fetch_rows(request).await
    }
}

#[async_trait]
impl ProfileStore for PostgrestStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let request = self
            .client
            .get(self.table("profiles"))
            .query(&[("select", "*".to_string()), ("id", eq(user_id))]);
        let rows: Vec<Profile> = self.fetch_rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        let request = self
            .client
            .post(self.table("profiles"))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile);
        let response = self.authed(request).send().await?;
        assert_ok_response(VENDOR, response).await?;
        Ok(())
    }
}
