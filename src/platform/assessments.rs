use reqwest::StatusCode;
use tracing::info;

use super::context::PlatformContext;
use super::errors::PlatformError;
use super::types::{AssessmentId, Created, CreatedAssessment, NewAssessment};
use crate::clock::{Clock, DATE_FORMAT, TIME_FORMAT};
use crate::http::Transport;

const OPERATION: &str = "create assessment";
pub const ASSESSMENT_PREFIX: &str = "Dependabot";

/// Handler for assessment creation
pub struct AssessmentHandler<'a> {
    transport: &'a dyn Transport,
    context: &'a PlatformContext,
}

impl<'a> AssessmentHandler<'a> {
    pub fn new(transport: &'a dyn Transport, context: &'a PlatformContext) -> Self {
        Self { transport, context }
    }

    /// Build the assessment body from a single clock reading
    pub fn new_assessment(clock: &dyn Clock) -> NewAssessment {
        let now = clock.now();
        let start_date = now.format(DATE_FORMAT).to_string();
        let start_time = now.format(TIME_FORMAT).to_string();

        NewAssessment {
            name: format!("{ASSESSMENT_PREFIX}_{start_date}_{start_time}"),
            start_date,
            notes: String::new(),
            start_time,
        }
    }

    /// Create a fresh assessment. Every call creates a new resource on the platform.
    pub async fn create(&self, clock: &dyn Clock) -> Result<CreatedAssessment, PlatformError> {
        let assessment = Self::new_assessment(clock);
        let body = serde_json::to_value(&assessment)
            .map_err(|source| PlatformError::Encode { operation: OPERATION, source })?;
        let request = self.context.post("assessment").json(body);

        let response = self.transport.send(&request).await?;
        if response.status != StatusCode::CREATED {
            return Err(PlatformError::unexpected_status(
                OPERATION,
                response.status,
                StatusCode::CREATED,
                &response.body,
            ));
        }

        let created: Created<AssessmentId> = response
            .json()
            .map_err(|source| PlatformError::Decode { operation: OPERATION, source })?;

        info!(assessment_id = %created.id, name = %assessment.name, "Assessment created");
        Ok(CreatedAssessment {
            id: created.id,
            name: assessment.name,
            start_date: assessment.start_date,
            start_time: assessment.start_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::http::{ApiResponse, MockTransport};
    use serde_json::json;

    #[test]
    fn test_name_is_derived_from_clock() {
        let clock = FixedClock::parse("2024-01-15 09:30").unwrap();
        let assessment = AssessmentHandler::new_assessment(&clock);

        assert_eq!(assessment.name, "Dependabot_2024-01-15_09:30");
        assert_eq!(assessment.start_date, "2024-01-15");
        assert_eq!(assessment.start_time, "09:30");
        assert!(assessment.notes.is_empty());
    }

    #[tokio::test]
    async fn test_created_returns_id_and_sends_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.url.ends_with("/api/v1/client/3/assessment")
                    && request.json_body()
                        == Some(&json!({
                            "name": "Dependabot_2024-01-15_09:30",
                            "startDate": "2024-01-15",
                            "notes": "",
                            "startTime": "09:30"
                        }))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::CREATED, r#"{"id":"assess-7"}"#)));
        let context = PlatformContext::new("https://p.example.com", "3", "k");
        let clock = FixedClock::parse("2024-01-15 09:30").unwrap();

        let created = AssessmentHandler::new(&transport, &context).create(&clock).await.unwrap();
        assert_eq!(created.id, AssessmentId::new("assess-7"));
        assert_eq!(created.name, "Dependabot_2024-01-15_09:30");
    }

    #[tokio::test]
    async fn test_ok_instead_of_created_is_failure() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::OK, r#"{"id":"assess-7"}"#)));
        let context = PlatformContext::new("https://p.example.com", "3", "k");
        let clock = FixedClock::parse("2024-01-15 09:30").unwrap();

        let error = AssessmentHandler::new(&transport, &context).create(&clock).await.unwrap_err();
        assert!(matches!(error, PlatformError::UnexpectedStatus { status: StatusCode::OK, .. }));
    }

    #[tokio::test]
    async fn test_created_without_id_is_decode_failure() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::CREATED, "{}")));
        let context = PlatformContext::new("https://p.example.com", "3", "k");
        let clock = FixedClock::parse("2024-01-15 09:30").unwrap();

        let error = AssessmentHandler::new(&transport, &context).create(&clock).await.unwrap_err();
        assert!(matches!(error, PlatformError::Decode { .. }));
    }
}
