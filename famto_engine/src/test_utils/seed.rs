//! Seed data for the parts of the marketplace the engine reads but does not manage: customers, merchants, agents
//! and the platform settings.
use chrono::Utc;

use crate::{
    db_types::{
        Agent,
        AutoAllocation,
        CommissionRuleRecord,
        CommissionType,
        Customer,
        Manager,
        Merchant,
        Money,
        NewAgent,
        PricingModel,
        Product,
    },
    geo::GeoPoint,
    sqlite::db::{agents, allocation, commission, customers, managers, merchants},
    SqliteDatabase,
};

pub async fn customer(db: &SqliteDatabase, id: &str, wallet_balance: Money) -> Customer {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    customers::insert_customer(id, &format!("Customer {id}"), wallet_balance, Utc::now(), &mut conn)
        .await
        .expect("Error inserting customer")
}

pub fn merchant(id: &str, category: Option<&str>, pricing_model: PricingModel, location: Option<GeoPoint>) -> Merchant {
    Merchant {
        id: id.to_string(),
        name: format!("Merchant {id}"),
        business_category: category.map(String::from),
        pricing_model,
        latitude: location.map(|p| p.latitude),
        longitude: location.map(|p| p.longitude),
    }
}

pub async fn insert_merchant(db: &SqliteDatabase, merchant: &Merchant) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    merchants::insert_merchant(merchant, &mut conn).await.expect("Error inserting merchant");
}

pub async fn commission_rule(db: &SqliteDatabase, merchant_id: &str, commission_type: CommissionType, value: i64) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let rule = CommissionRuleRecord {
        merchant_id: merchant_id.to_string(),
        commission_type,
        commission_value: value,
    };
    commission::upsert_rule(&rule, &mut conn).await.expect("Error inserting commission rule");
}

pub async fn product(db: &SqliteDatabase, id: &str, merchant_id: &str, available_quantity: i64) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let product = Product {
        id: id.to_string(),
        merchant_id: merchant_id.to_string(),
        name: format!("Product {id}"),
        available_quantity,
    };
    merchants::insert_product(&product, &mut conn).await.expect("Error inserting product");
}

pub async fn product_quantity(db: &SqliteDatabase, id: &str) -> Option<i64> {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    merchants::fetch_product(id, &mut conn).await.expect("Error fetching product").map(|p| p.available_quantity)
}

pub async fn agent(db: &SqliteDatabase, agent: NewAgent) -> Agent {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    agents::insert_agent(agent, Utc::now(), &mut conn).await.expect("Error inserting agent")
}

pub async fn allocation_policy(db: &SqliteDatabase, policy: &AutoAllocation) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    allocation::upsert_policy(policy, &mut conn).await.expect("Error saving allocation policy");
}

pub async fn pricing_rule(db: &SqliteDatabase, id: &str, rule_name: &str) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    allocation::insert_pricing_rule(id, rule_name, &mut conn).await.expect("Error inserting pricing rule");
}

pub async fn manager(db: &SqliteDatabase, id: &str, role: &str) {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let manager = Manager { id: id.to_string(), name: format!("Manager {id}"), role: role.to_string() };
    managers::insert_manager(&manager, &mut conn).await.expect("Error inserting manager");
}
