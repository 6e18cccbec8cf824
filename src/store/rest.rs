//! REST implementation against a PostgREST-style data API and object storage.
//!
//! ## Endpoints
//!
//! ```text
//! {base}/rest/v1/{table}?{filters}                 # rows
//! {base}/storage/v1/object/{bucket}/{path}          # upload
//! {base}/storage/v1/object/public/{bucket}/{path}   # public URL
//! ```
//!
//! Every request carries the anon key in `apikey` and a bearer token (the
//! signed-in user's access token when set, the anon key otherwise).

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    Application, ApplicationEntry, ApplicationStatus, BackendConfig, Job, JobAlert,
    JobNotification, JobUpdate, NewApplication, NewJob, NewJobAlert, Page, SavedJob,
    SavedJobEntry,
};
use crate::query::JobQuery;
use crate::store::{AlertStore, ApplicationStore, FileStore, JobStore, tables};
use crate::utils::http::{create_async_client, error_from_response, parse_content_range_total};

const PREFER: &str = "Prefer";

/// Data API client.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base: Url,
    anon_key: String,
    access_token: Option<String>,
}

type Pairs = Vec<(&'static str, String)>;

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl RestStore {
    /// Create a store from backend settings.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(AppError::config("backend.url is not set"));
        }
        if config.anon_key.trim().is_empty() {
            return Err(AppError::config("backend.anon_key is not set"));
        }

        // Trailing slash so `join` appends instead of replacing the last segment
        let mut base = config.url.trim_end_matches('/').to_string();
        base.push('/');

        Ok(Self {
            client: create_async_client(config)?,
            base: Url::parse(&base)?,
            anon_key: config.anon_key.clone(),
            access_token: None,
        })
    }

    /// Act as a signed-in user so row-level policies apply.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        Ok(self.base.join(&format!("rest/v1/{table}"))?)
    }

    fn object_url(&self, bucket: &str, path: &str) -> Result<Url> {
        Ok(self.base.join(&format!("storage/v1/object/{bucket}/{path}"))?)
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        Ok(self
            .base
            .join(&format!("storage/v1/object/public/{bucket}/{path}"))?
            .to_string())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await?;
        let err = error_from_response(status, &body);
        log::debug!("Backend request failed ({}): {}", status, err);
        Err(err)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, pairs: &Pairs) -> Result<Vec<T>> {
        let request = self.request(Method::GET, self.table_url(table)?).query(pairs);
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        mut pairs: Pairs,
    ) -> Result<Option<T>> {
        pairs.push(("limit", "1".to_string()));
        let rows: Vec<T> = self.select(table, &pairs).await?;
        Ok(rows.into_iter().next())
    }

    /// Send a JSON body and return the affected rows.
    async fn write<B, T>(&self, method: Method, table: &str, pairs: &Pairs, body: &B) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self
            .request(method, self.table_url(table)?)
            .query(pairs)
            .header(PREFER, "return=representation")
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?);
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    async fn insert_row<B, T>(&self, table: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let rows: Vec<T> = self.write(Method::POST, table, &Vec::new(), body).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::remote("empty", format!("insert into {table} returned no row")))
    }

    /// PATCH the matching rows, returning how many were changed.
    async fn patch_rows<B>(&self, table: &str, pairs: &Pairs, body: &B) -> Result<usize>
    where
        B: Serialize + ?Sized + Sync,
    {
        let rows: Vec<serde_json::Value> = self.write(Method::PATCH, table, pairs, body).await?;
        Ok(rows.len())
    }

    /// DELETE the matching rows, returning how many were removed.
    async fn delete_rows(&self, table: &str, pairs: &Pairs) -> Result<usize> {
        let request = self
            .request(Method::DELETE, self.table_url(table)?)
            .query(pairs)
            .header(PREFER, "return=representation");
        let response = self.send(request).await?;
        let rows: Vec<serde_json::Value> = Self::read_json(response).await?;
        Ok(rows.len())
    }

    /// Exact row count for the filters, without transferring rows.
    async fn count(&self, table: &str, mut pairs: Pairs) -> Result<usize> {
        pairs.push(("select", "id".to_string()));
        let request = self
            .request(Method::HEAD, self.table_url(table)?)
            .query(&pairs)
            .header(PREFER, "count=exact");
        let response = self.send(request).await?;
        total_from(&response)
            .ok_or_else(|| AppError::remote("count", "missing Content-Range header"))
    }
}

fn total_from(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range_total)
}

#[derive(serde::Deserialize)]
struct LocationRow {
    #[serde(default)]
    location: Option<String>,
}

#[async_trait]
impl JobStore for RestStore {
    async fn fetch_jobs(&self, query: &JobQuery) -> Result<Page> {
        let request = self
            .request(Method::GET, self.table_url(tables::JOBS)?)
            .query(&query.to_query_pairs())
            .header(PREFER, "count=exact");
        let response = self.send(request).await?;
        let reported = total_from(&response);
        let rows: Vec<Job> = Self::read_json(response).await?;

        let total = reported.unwrap_or_else(|| {
            log::warn!("No exact count in response; deriving total from rows");
            query.offset + rows.len()
        });
        Ok(Page { rows, total })
    }

    async fn distinct_locations(&self) -> Result<Vec<String>> {
        let pairs: Pairs = vec![
            ("select", "location".to_string()),
            ("is_active", eq("true")),
        ];
        let rows: Vec<LocationRow> = self.select(tables::JOBS, &pairs).await?;
        let unique: BTreeSet<String> = rows
            .into_iter()
            .filter_map(|r| r.location)
            .filter(|l| !l.trim().is_empty())
            .collect();
        Ok(unique.into_iter().collect())
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        let pairs: Pairs = vec![("select", "*".to_string()), ("id", eq(id))];
        self.select_one(tables::JOBS, pairs)
            .await?
            .ok_or_else(|| AppError::not_found(format!("job {id}")))
    }

    async fn jobs_by_employer(&self, employer_id: &str) -> Result<Vec<Job>> {
        let pairs: Pairs = vec![
            ("select", "*".to_string()),
            ("employer_id", eq(employer_id)),
            ("order", "created_at.desc,id.asc".to_string()),
        ];
        self.select(tables::JOBS, &pairs).await
    }

    async fn insert_job(&self, job: &NewJob) -> Result<Job> {
        self.insert_row(tables::JOBS, job).await
    }

    async fn update_job(&self, id: &str, employer_id: &str, update: &JobUpdate) -> Result<Job> {
        let pairs: Pairs = vec![("id", eq(id)), ("employer_id", eq(employer_id))];
        let rows: Vec<Job> = self.write(Method::PATCH, tables::JOBS, &pairs, update).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("job {id} for employer {employer_id}")))
    }

    async fn delete_job(&self, id: &str, employer_id: &str) -> Result<()> {
        let pairs: Pairs = vec![("id", eq(id)), ("employer_id", eq(employer_id))];
        if self.delete_rows(tables::JOBS, &pairs).await? == 0 {
            return Err(AppError::not_found(format!(
                "job {id} for employer {employer_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for RestStore {
    async fn insert_application(&self, application: &NewApplication) -> Result<Application> {
        self.insert_row(tables::APPLICATIONS, application).await
    }

    async fn find_application(
        &self,
        job_id: &str,
        applicant_id: &str,
    ) -> Result<Option<Application>> {
        let pairs: Pairs = vec![
            ("select", "*".to_string()),
            ("job_id", eq(job_id)),
            ("applicant_id", eq(applicant_id)),
        ];
        self.select_one(tables::APPLICATIONS, pairs).await
    }

    async fn list_applications(&self, job_id: &str) -> Result<Vec<Application>> {
        let pairs: Pairs = vec![
            ("select", "*".to_string()),
            ("job_id", eq(job_id)),
            ("order", "created_at.desc".to_string()),
        ];
        self.select(tables::APPLICATIONS, &pairs).await
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<ApplicationEntry>> {
        let pairs: Pairs = vec![
            ("select", "*,job:jobs(*)".to_string()),
            ("applicant_id", eq(applicant_id)),
            ("order", "created_at.desc".to_string()),
        ];
        self.select(tables::APPLICATIONS, &pairs).await
    }

    async fn set_application_status(&self, id: &str, status: ApplicationStatus) -> Result<()> {
        let pairs: Pairs = vec![("id", eq(id))];
        let body = serde_json::json!({ "status": status });
        if self.patch_rows(tables::APPLICATIONS, &pairs, &body).await? == 0 {
            return Err(AppError::not_found(format!("application {id}")));
        }
        Ok(())
    }

    async fn insert_saved_job(&self, user_id: &str, job_id: &str) -> Result<SavedJob> {
        let body = serde_json::json!({ "user_id": user_id, "job_id": job_id });
        self.insert_row(tables::SAVED_JOBS, &body).await
    }

    async fn delete_saved_job(&self, user_id: &str, job_id: &str) -> Result<()> {
        let pairs: Pairs = vec![("user_id", eq(user_id)), ("job_id", eq(job_id))];
        let request = self
            .request(Method::DELETE, self.table_url(tables::SAVED_JOBS)?)
            .query(&pairs);
        self.send(request).await?;
        Ok(())
    }

    async fn find_saved_job(&self, user_id: &str, job_id: &str) -> Result<Option<SavedJob>> {
        let pairs: Pairs = vec![
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("job_id", eq(job_id)),
        ];
        self.select_one(tables::SAVED_JOBS, pairs).await
    }

    async fn list_saved_jobs(&self, user_id: &str) -> Result<Vec<SavedJobEntry>> {
        let pairs: Pairs = vec![
            ("select", "id,job_id,created_at,job:jobs(*)".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ];
        self.select(tables::SAVED_JOBS, &pairs).await
    }

    async fn count_saved_jobs(&self, user_id: &str) -> Result<usize> {
        self.count(tables::SAVED_JOBS, vec![("user_id", eq(user_id))])
            .await
    }
}

#[async_trait]
impl AlertStore for RestStore {
    async fn active_alerts(&self) -> Result<Vec<JobAlert>> {
        let pairs: Pairs = vec![("select", "*".to_string()), ("is_active", eq("true"))];
        self.select(tables::JOB_ALERTS, &pairs).await
    }

    async fn insert_alert(&self, alert: &NewJobAlert) -> Result<JobAlert> {
        self.insert_row(tables::JOB_ALERTS, alert).await
    }

    async fn insert_notifications(&self, notifications: &[JobNotification]) -> Result<()> {
        if notifications.is_empty() {
            return Ok(());
        }
        let request = self
            .request(Method::POST, self.table_url(tables::JOB_NOTIFICATIONS)?)
            .header(PREFER, "return=minimal")
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(notifications)?);
        self.send(request).await?;
        Ok(())
    }

    async fn alerts_for(&self, user_id: &str) -> Result<Vec<JobAlert>> {
        let pairs: Pairs = vec![
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ];
        self.select(tables::JOB_ALERTS, &pairs).await
    }

    async fn notifications_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<JobNotification>> {
        let pairs: Pairs = vec![
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        self.select(tables::JOB_NOTIFICATIONS, &pairs).await
    }

    async fn mark_read(&self, notification_id: &str, user_id: &str) -> Result<()> {
        let pairs: Pairs = vec![("id", eq(notification_id)), ("user_id", eq(user_id))];
        let body = serde_json::json!({ "is_read": true });
        if self.patch_rows(tables::JOB_NOTIFICATIONS, &pairs, &body).await? == 0 {
            return Err(AppError::not_found(format!(
                "notification {notification_id} for {user_id}"
            )));
        }
        Ok(())
    }

    async fn set_alert_active(&self, alert_id: &str, user_id: &str, active: bool) -> Result<()> {
        let pairs: Pairs = vec![("id", eq(alert_id)), ("user_id", eq(user_id))];
        let body = serde_json::json!({ "is_active": active });
        if self.patch_rows(tables::JOB_ALERTS, &pairs, &body).await? == 0 {
            return Err(AppError::not_found(format!("alert {alert_id} for {user_id}")));
        }
        Ok(())
    }

    async fn delete_alert(&self, alert_id: &str, user_id: &str) -> Result<()> {
        let pairs: Pairs = vec![("id", eq(alert_id)), ("user_id", eq(user_id))];
        if self.delete_rows(tables::JOB_ALERTS, &pairs).await? == 0 {
            return Err(AppError::not_found(format!("alert {alert_id} for {user_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for RestStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let request = self
            .request(Method::POST, self.object_url(bucket, path)?)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", upsert.to_string())
            .body(bytes);
        self.send(request).await?;
        log::info!("Uploaded {}/{}", bucket, path);
        self.public_url(bucket, path)
    }
}
