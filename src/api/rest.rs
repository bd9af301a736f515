//! PostgREST-style client for the remote record store.
//!
//! Tables are reached at `<base>/rest/v1/<table>` with `apikey` and bearer
//! headers. Row filters use the `column=eq.value` query convention. The
//! service key determines the authenticated user; rows carry no explicit
//! user column on this side of the wire.

use crate::api::{
    CardRow, ProjectRow, RecordStore, Snapshot, SubTaskRow, TaskLogRow, TaskRow, TransactionRow,
};
use crate::model::Transaction;
use crate::Result;
use anyhow::{bail, Context};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

const REST_PATH: &str = "rest/v1";

/// Record store backed by a PostgREST-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base: Url,
    key: String,
}

impl RestStore {
    /// Creates a client for the store at `base_url`, authenticating with
    /// `service_key`.
    pub fn new(base_url: &str, service_key: impl Into<String>) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid record store URL '{base_url}'"))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            key: service_key.into(),
        })
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder> {
        let url = self
            .base
            .join(&format!("{REST_PATH}/{table}"))
            .with_context(|| format!("Unable to build endpoint for table '{table}'"))?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key))
    }

    async fn get_rows<T>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let resp = self
            .request(Method::GET, table)?
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {table} failed to send"))?;
        let resp = expect_success(resp, table).await?;
        resp.json::<Vec<T>>()
            .await
            .with_context(|| format!("GET {table} returned an unparsable body"))
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, body: &T) -> Result<()> {
        let resp = self
            .request(Method::POST, table)?
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {table} failed to send"))?;
        expect_success(resp, table).await.map(|_| ())
    }

    async fn patch_where(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: serde_json::Value,
    ) -> Result<()> {
        let resp = self
            .request(Method::PATCH, table)?
            .query(filters)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("PATCH {table} failed to send"))?;
        expect_success(resp, table).await.map(|_| ())
    }

    async fn delete_where(&self, table: &str, filters: &[(&str, String)]) -> Result<()> {
        let resp = self
            .request(Method::DELETE, table)?
            .query(filters)
            .send()
            .await
            .with_context(|| format!("DELETE {table} failed to send"))?;
        expect_success(resp, table).await.map(|_| ())
    }
}

/// Formats a value for the `eq.` filter operator.
fn eq(value: &str) -> String {
    format!("eq.{value}")
}

async fn expect_success(resp: Response, table: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    bail!("Record store rejected the {table} request with {status}: {body}")
}

#[async_trait::async_trait]
impl RecordStore for RestStore {
    async fn fetch_all(&self) -> Result<Snapshot> {
        let select_all = ("select", "*".to_string());
        let newest_first = ("order", "created_at.desc".to_string());

        let transaction_rows: Vec<TransactionRow> = self
            .get_rows("transactions", &[select_all.clone(), newest_first.clone()])
            .await?;
        let task_rows: Vec<TaskRow> = self
            .get_rows(
                "tasks",
                &[
                    ("select", "*,subtasks(*),task_logs(*)".to_string()),
                    newest_first.clone(),
                ],
            )
            .await?;
        let project_rows: Vec<ProjectRow> = self
            .get_rows("projects", &[select_all.clone(), newest_first.clone()])
            .await?;
        let card_rows: Vec<CardRow> = self
            .get_rows("credit_cards", &[select_all, newest_first])
            .await?;

        let transactions = transaction_rows
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Snapshot {
            transactions,
            tasks: task_rows.into_iter().map(Into::into).collect(),
            projects: project_rows.into_iter().map(Into::into).collect(),
            cards: card_rows.into_iter().map(Into::into).collect(),
        })
    }

    async fn insert_transaction(&self, row: TransactionRow) -> Result<()> {
        self.insert("transactions", &row).await
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.delete_where("transactions", &[("id", eq(id))]).await
    }

    async fn mark_card_paid(&self, card_id: &str) -> Result<()> {
        self.patch_where(
            "transactions",
            &[
                ("card_id", eq(card_id)),
                ("type", eq("expense")),
                ("is_paid", eq("false")),
            ],
            serde_json::json!({ "is_paid": true }),
        )
        .await
    }

    async fn insert_task(
        &self,
        row: TaskRow,
        subtasks: Vec<SubTaskRow>,
        logs: Vec<TaskLogRow>,
    ) -> Result<()> {
        self.insert("tasks", &row).await?;
        if !subtasks.is_empty() {
            self.insert("subtasks", &subtasks).await?;
        }
        if !logs.is_empty() {
            self.insert("task_logs", &logs).await?;
        }
        Ok(())
    }

    async fn update_task(&self, row: TaskRow) -> Result<()> {
        let id = row.id.clone();
        self.patch_where("tasks", &[("id", eq(&id))], serde_json::to_value(row)?)
            .await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.delete_where("tasks", &[("id", eq(id))]).await
    }

    async fn insert_task_log(&self, row: TaskLogRow) -> Result<()> {
        self.insert("task_logs", &row).await
    }

    async fn insert_project(&self, row: ProjectRow) -> Result<()> {
        self.insert("projects", &row).await
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.delete_where("projects", &[("id", eq(id))]).await
    }

    async fn clear_project_refs(&self, project_id: &str) -> Result<()> {
        self.patch_where(
            "tasks",
            &[("project_id", eq(project_id))],
            serde_json::json!({ "project_id": null }),
        )
        .await
    }

    async fn insert_card(&self, row: CardRow) -> Result<()> {
        self.insert("credit_cards", &row).await
    }

    async fn delete_card(&self, id: &str) -> Result<()> {
        self.delete_where("credit_cards", &[("id", eq(id))]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_filter_format() {
        assert_eq!(eq("abc-123"), "eq.abc-123");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(RestStore::new("not a url", "key").is_err());
    }

    #[test]
    fn test_endpoint_paths() {
        let store = RestStore::new("https://example.supabase.co", "key").unwrap();
        let url = store.base.join("rest/v1/transactions").unwrap();
        assert_eq!(url.as_str(), "https://example.supabase.co/rest/v1/transactions");
    }
}
