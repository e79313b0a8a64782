use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use jarcast_core::events::ManualTrigger;
use jarcast_core::utils::amount::{AmountParseError, parse_major_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Optional body of `POST /test-donation`. Missing fields fall back to the
/// stock test donation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TestDonationRequest {
    /// Amount in major units, at most two decimal places.
    #[serde(default)]
    amount: Option<Decimal>,
    #[serde(default)]
    donor_name: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct TestDonationResponse {
    status: &'static str,
    amount: i64,
}

pub(crate) enum TestDonationError {
    InvalidBody(serde_json::Error),
    InvalidAmount(AmountParseError),
    TriggerChannelClosed,
}

impl IntoResponse for TestDonationError {
    fn into_response(self) -> Response {
        match self {
            TestDonationError::InvalidBody(e) => {
                (StatusCode::BAD_REQUEST, format!("invalid request body: {e}")).into_response()
            }
            TestDonationError::InvalidAmount(e) => {
                (StatusCode::BAD_REQUEST, format!("invalid amount: {e}")).into_response()
            }
            TestDonationError::TriggerChannelClosed => {
                tracing::error!("Manual trigger channel closed");
                (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response()
            }
        }
    }
}

impl TestDonationRequest {
    fn into_trigger(self) -> Result<ManualTrigger, TestDonationError> {
        let mut trigger = ManualTrigger::default();
        if let Some(amount) = self.amount {
            trigger.amount = parse_major_amount(&amount.to_string())
                .map_err(TestDonationError::InvalidAmount)?;
        }
        if let Some(donor_name) = self.donor_name.filter(|d| !d.trim().is_empty()) {
            trigger.donor_name = Some(donor_name);
        }
        if let Some(comment) = self.comment {
            trigger.comment = Some(comment).filter(|c| !c.trim().is_empty());
        }
        Ok(trigger)
    }
}

/// `POST /test-donation`: Show a test donation right away.
///
/// The body is optional; an empty body sends the stock test donation.
pub(super) async fn test_donation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, TestDonationError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        TestDonationRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(TestDonationError::InvalidBody)?
    };
    let trigger = request.into_trigger()?;
    let amount = trigger.amount;

    state
        .manual_triggers
        .send(trigger)
        .await
        .map_err(|_| TestDonationError::TriggerChannelClosed)?;

    tracing::info!(amount, "Test donation requested over HTTP");
    Ok((
        StatusCode::ACCEPTED,
        Json(TestDonationResponse {
            status: "accepted",
            amount,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::server::build_router;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use jarcast_core::events::{ManualTrigger, manual_trigger_channel};
    use jarcast_core::overlay::BroadcastOverlay;
    use jarcast_core::processors::DonationFeed;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn post(body: &'static str) -> Request<Body> {
        Request::post("/test-donation")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_body_sends_default_trigger() {
        let (tx, mut rx) = manual_trigger_channel();
        let state = AppState::new(
            BroadcastOverlay::new(8),
            Arc::new(DonationFeed::default()),
            tx,
            std::env::temp_dir(),
        );

        let response = build_router(state).oneshot(post("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(rx.recv().await.unwrap(), ManualTrigger::default());
    }

    #[tokio::test]
    async fn test_body_fields_override_defaults() {
        let (tx, mut rx) = manual_trigger_channel();
        let state = AppState::new(
            BroadcastOverlay::new(8),
            Arc::new(DonationFeed::default()),
            tx,
            std::env::temp_dir(),
        );
        let router = build_router(state);

        let response = router
            .clone()
            .oneshot(post(r#"{"amount": 250.5, "donor_name": "Olena"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let trigger = rx.recv().await.unwrap();
        assert_eq!(trigger.amount, 25_050);
        assert_eq!(trigger.donor_name.as_deref(), Some("Olena"));
        assert_eq!(trigger.comment.as_deref(), Some("Test donation"));

        let response = router.clone().oneshot(post(r#"{"amount": 0}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = router.oneshot(post("not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
