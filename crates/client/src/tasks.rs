//! Typed calls for the task resources behind the proxy.

use serde_json::Value;

use taskgate_core::{EntityId, NewTask, Page, Task, TaskQuery, TaskUpdate, UserSummary, unwrap_data};

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::request::ApiRequest;

pub type TaskPage = Page<Task>;

impl ApiClient {
    /// One page of tasks; cursor or offset shaped depending on the backend.
    pub async fn list_tasks(&self, query: &TaskQuery) -> ApiResult<TaskPage> {
        let req = ApiRequest::get("/tasks").query(query.to_pairs());
        let value = self.send(&req).await?;
        Page::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get_task(&self, id: &EntityId) -> ApiResult<Task> {
        let value = self.send(&ApiRequest::get(format!("/tasks/{id}"))).await?;
        decode_data(value)
    }

    pub async fn create_task(&self, task: &NewTask) -> ApiResult<Task> {
        let value = self.send(&ApiRequest::post("/tasks").json(task)?).await?;
        decode_data(value)
    }

    pub async fn update_task(&self, id: &EntityId, update: &TaskUpdate) -> ApiResult<Task> {
        let req = ApiRequest::patch(format!("/tasks/{id}")).json(update)?;
        decode_data(self.send(&req).await?)
    }

    pub async fn delete_task(&self, id: &EntityId) -> ApiResult<()> {
        self.send(&ApiRequest::delete(format!("/tasks/{id}"))).await?;
        Ok(())
    }

    /// Users a task can be assigned to.
    pub async fn list_users(&self) -> ApiResult<Vec<UserSummary>> {
        decode_data(self.send(&ApiRequest::get("/users/list")).await?)
    }
}

fn decode_data<T: serde::de::DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(unwrap_data(&value).clone()).map_err(|e| ApiError::Decode(e.to_string()))
}
