//! End-to-end flow over the public API: a multi-turn conversation that fills
//! the booking state, followed by a geo quote for the completed trip.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio_test::assert_ok;

use rideflow_core::agent::{booking_assistant_workflow, REQUIRED_BOOKING_FIELDS};
use rideflow_core::geo::{
    DriverLocationIndex, DriverMetadata, DriverMetadataSource, InMemoryGeoStore,
};
use rideflow_core::llm::{AgentAction, LlmClient};
use rideflow_core::models::VehicleType;
use rideflow_core::workflow::ExecutionContext;
use rideflow_core::Result as CoreResult;

/// Replays a scripted conversation: each model call pops the next response.
struct ScriptedModel {
    responses: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedModel {
    async fn complete(&self, _prompt: &str) -> CoreResult<String> {
        let mut responses = self.responses.lock();
        Ok(if responses.is_empty() {
            "{}".to_string()
        } else {
            responses.remove(0)
        })
    }
}

struct StaticMetadata {
    drivers: HashMap<i64, DriverMetadata>,
}

#[async_trait]
impl DriverMetadataSource for StaticMetadata {
    async fn driver_metadata(&self, driver_id: i64) -> CoreResult<Option<DriverMetadata>> {
        Ok(self.drivers.get(&driver_id).cloned())
    }
}

fn turn(state_from: &ExecutionContext, input: &str) -> ExecutionContext {
    let mut ctx = ExecutionContext::with_session("chat-e2e").with_input(json!(input));
    ctx.state = state_from.state.clone();
    ctx.set_storage("prompt", json!("opaque turn prompt"));
    ctx
}

#[tokio::test]
async fn conversation_fills_state_then_quotes_the_trip() -> anyhow::Result<()> {
    // Turn 1 extracts pickup and destination, asks for the time; turn 2
    // extracts the time and a no-requests marker, asks for confirmation;
    // turn 3 confirms.
    let llm = Arc::new(ScriptedModel::new(&[
        r#"{"action": "update_state", "args": {"pickup_location": "harbor", "destination": "airport"}}"#,
        r#"{"action": "respond_to_user", "args": {"message": "When should we pick you up?"}}"#,
        r#"{"action": "update_state", "args": {"pickup_time": "18:00", "special_requests": "N/A"}}"#,
        r#"{"action": "respond_to_user", "args": {"message": "Shall I confirm the booking?"}}"#,
        r#"{"action": "update_state", "args": {"confirmed": true}}"#,
    ]));
    let assistant = booking_assistant_workflow(llm)?;

    let first = assistant
        .run(turn(&ExecutionContext::new(), "harbor to the airport please"))
        .await?;
    assert!(matches!(
        AgentAction::from_value(&first.output),
        Some(AgentAction::RespondToUser { .. })
    ));
    assert_eq!(first.state_value("pickup_location"), Some(&json!("harbor")));

    let second = assistant.run(turn(&first, "at six pm, nothing special")).await?;
    assert_eq!(second.state_value("pickup_time"), Some(&json!("18:00")));

    let third = assistant.run(turn(&second, "yes, confirm")).await?;
    assert!(third.stop);
    assert!(third.error.is_none());
    for field in REQUIRED_BOOKING_FIELDS {
        assert!(third.state_field_filled(field), "missing {field}");
    }
    assert_eq!(third.state_value("confirmed"), Some(&json!(true)));

    // With the booking confirmed, quote the trip from nearby drivers.
    let metadata = StaticMetadata {
        drivers: HashMap::from([
            (
                1,
                DriverMetadata {
                    channel: "TELEGRAM".to_string(),
                    channel_id: "d1".to_string(),
                    vehicle_type: VehicleType::Standard,
                },
            ),
            (
                2,
                DriverMetadata {
                    channel: "TELEGRAM".to_string(),
                    channel_id: "d2".to_string(),
                    vehicle_type: VehicleType::Van,
                },
            ),
        ]),
    };
    let index = DriverLocationIndex::new(Arc::new(InMemoryGeoStore::new()), Arc::new(metadata));
    tokio_test::assert_ok!(index.upsert_location(1, -82.38, 23.13).await);
    tokio_test::assert_ok!(index.upsert_location(2, -82.37, 23.14).await);

    let quotes = index.quote((-82.38, 23.13), (-82.30, 23.00), 5, 10.0).await?;
    assert_eq!(quotes.len(), 2);
    assert!(quotes.iter().any(|q| q.vehicle_type == VehicleType::Standard));
    assert!(quotes.iter().any(|q| q.vehicle_type == VehicleType::Van));
    assert!(quotes.iter().all(|q| q.price > 0.0));

    Ok(())
}
