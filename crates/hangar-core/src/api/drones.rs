//! Private drone and dump endpoints.

use reqwest::multipart::{Form, Part};

use super::{ApiClient, ApiResult};
use crate::models::{Drone, DronePayload, Dump, DumpReport, DumpUpload};

impl ApiClient {
    /// Lists the signed-in account's drones, newest (highest id) first.
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn list_drones(&self) -> ApiResult<Vec<Drone>> {
        let mut drones: Vec<Drone> = self.get_list("/drones").await?;
        drones.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(drones)
    }

    /// # Errors
    /// Returns the classified request failure.
    pub async fn get_drone(&self, id: i64) -> ApiResult<Drone> {
        self.get_json(&format!("/drones/{id}")).await
    }

    /// # Errors
    /// Returns the classified request failure.
    pub async fn create_drone(&self, payload: &DronePayload) -> ApiResult<Drone> {
        self.post_json("/drones", payload).await
    }

    /// # Errors
    /// Returns the classified request failure.
    pub async fn update_drone(&self, id: i64, payload: &DronePayload) -> ApiResult<Drone> {
        self.put_json(&format!("/drones/{id}"), payload).await
    }

    /// # Errors
    /// Returns the classified request failure.
    pub async fn delete_drone(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("/drones/{id}")).await
    }

    /// Lists a drone's dumps, newest first.
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn list_dumps(&self, drone_id: i64) -> ApiResult<Vec<Dump>> {
        let mut dumps: Vec<Dump> = self.get_list(&format!("/drones/{drone_id}/dumps")).await?;
        dumps.sort_by(Dump::newest_first);
        Ok(dumps)
    }

    /// # Errors
    /// Returns the classified request failure.
    pub async fn delete_dump(&self, drone_id: i64, dump_id: i64) -> ApiResult<()> {
        self.delete(&format!("/drones/{drone_id}/dumps/{dump_id}"))
            .await
    }

    /// Uploads a dump as `multipart/form-data` (`drone_id` field plus `file`).
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn upload_dump(&self, upload: DumpUpload) -> ApiResult<Dump> {
        let file = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new()
            .text("drone_id", upload.drone_id.to_string())
            .part("file", file);
        self.post_form("/dumps", form).await
    }

    /// Asks the backend to split a stored dump into its sections.
    ///
    /// # Errors
    /// Returns the classified request failure.
    pub async fn parse_dump(&self, drone_id: i64, dump_id: i64) -> ApiResult<DumpReport> {
        self.get_json(&format!("/drones/{drone_id}/dumps/{dump_id}/parse"))
            .await
    }
}
