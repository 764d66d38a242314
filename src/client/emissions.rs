//! Emission Endpoints
//!
//! `/emissions` records, report generation, and Excel/PDF export
//! downloads.

use super::{ApiClient, ApiResult};
use crate::model::{EmissionForm, EmissionRecord, EmissionReport, ListPayload, ReportStatus};
use serde_json::json;

/// Export document formats offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Pdf,
}

impl ExportFormat {
    fn path(self) -> &'static str {
        match self {
            ExportFormat::Excel => "/emissions/export/excel",
            ExportFormat::Pdf => "/emissions/export/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl ApiClient {
    pub async fn list_emissions(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ApiResult<(Vec<EmissionRecord>, u64)> {
        let mut query = Vec::new();
        if let Some(start) = start_date {
            query.push(("startDate", start.to_string()));
        }
        if let Some(end) = end_date {
            query.push(("endDate", end.to_string()));
        }

        let payload: ListPayload<EmissionRecord> = self.get("/emissions", &query).await?;
        Ok(payload.into_parts())
    }

    pub async fn create_emission(&self, form: &EmissionForm) -> ApiResult<EmissionRecord> {
        self.post("/emissions", form).await
    }

    pub async fn delete_emission(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/emissions/{id}")).await
    }

    pub async fn list_reports(&self) -> ApiResult<Vec<EmissionReport>> {
        let payload: ListPayload<EmissionReport> = self.get("/emissions/reports", &[]).await?;
        Ok(payload.into_parts().0)
    }

    /// Ask the backend to generate a report over a date range.
    pub async fn create_report(
        &self,
        title: &str,
        start_date: &str,
        end_date: &str,
    ) -> ApiResult<EmissionReport> {
        self.post(
            "/emissions/reports",
            &json!({
                "title": title,
                "startDate": start_date,
                "endDate": end_date,
            }),
        )
        .await
    }

    pub async fn get_report(&self, id: &str) -> ApiResult<EmissionReport> {
        self.get(&format!("/emissions/reports/{id}"), &[]).await
    }

    pub async fn delete_report(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/emissions/reports/{id}")).await
    }

    /// Move a report between draft and finalized.
    pub async fn set_report_status(
        &self,
        id: &str,
        status: ReportStatus,
    ) -> ApiResult<EmissionReport> {
        self.patch(&format!("/emissions/reports/{id}/status"), &json!({ "status": status }))
            .await
    }

    /// Download an export document as raw bytes.
    pub async fn export_emissions(
        &self,
        format: ExportFormat,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ApiResult<Vec<u8>> {
        let mut query = Vec::new();
        if let Some(start) = start_date {
            query.push(("startDate", start.to_string()));
        }
        if let Some(end) = end_date {
            query.push(("endDate", end.to_string()));
        }
        self.get_bytes(format.path(), &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_paths() {
        assert_eq!(ExportFormat::Excel.path(), "/emissions/export/excel");
        assert_eq!(ExportFormat::Pdf.path(), "/emissions/export/pdf");
        assert_eq!(ExportFormat::Excel.extension(), "xlsx");
    }
}
