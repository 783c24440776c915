use cucumber::given;
use famto_engine::{test_utils::doubles::RecordingGateway, traits::GatewayError};

use crate::cucumber::{famto_world::DeliverySystem, FamtoWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut FamtoWorld) {
    let system = DeliverySystem::new(RecordingGateway::default()).await;
    world.system = Some(system);
}

#[given("a fresh install with the payment gateway down")]
async fn fresh_database_gateway_down(world: &mut FamtoWorld) {
    let gateway = RecordingGateway::failing(GatewayError::Unreachable("connection refused".into()));
    world.system = Some(DeliverySystem::new(gateway).await);
}
