//! User Administration Endpoints

use super::{ApiClient, ApiResult};
use crate::model::{ListPayload, User, UserForm};

impl ApiClient {
    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let payload: ListPayload<User> = self.get("/users", &[]).await?;
        Ok(payload.into_parts().0)
    }

    pub async fn create_user(&self, form: &UserForm) -> ApiResult<User> {
        self.post("/users", form).await
    }

    pub async fn update_user(&self, id: &str, form: &UserForm) -> ApiResult<User> {
        self.put(&format!("/users/{id}"), form).await
    }

    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/users/{id}")).await
    }
}
