use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
pub use famto_common::Money;
use famto_common::MoneyError;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Generates `Display` and `FromStr` for the string-backed enums that are stored as TEXT columns. The string forms
/// match the values stored in the database.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($text),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError::new($kind, s)),
                }
            }
        }
    };
}

//--------------------------------------   OrderStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order has been placed, but not confirmed by the merchant or an admin.
    Pending,
    /// The order was confirmed and is being prepared or delivered.
    #[sqlx(rename = "On-going")]
    #[serde(rename = "On-going")]
    OnGoing,
    /// The order was fulfilled.
    Completed,
    /// The order was rejected or cancelled.
    Cancelled,
}

text_enum!(OrderStatus, "order status", {
    Pending => "Pending",
    OnGoing => "On-going",
    Completed => "Completed",
    Cancelled => "Cancelled",
});

impl OrderStatus {
    /// Completed and Cancelled orders can never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------   DeliveryMode   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DeliveryMode {
    #[sqlx(rename = "Home Delivery")]
    #[serde(rename = "Home Delivery")]
    HomeDelivery,
    #[sqlx(rename = "Take Away")]
    #[serde(rename = "Take Away")]
    TakeAway,
    #[sqlx(rename = "Pick and Drop")]
    #[serde(rename = "Pick and Drop")]
    PickAndDrop,
    #[sqlx(rename = "Custom Order")]
    #[serde(rename = "Custom Order")]
    CustomOrder,
}

text_enum!(DeliveryMode, "delivery mode", {
    HomeDelivery => "Home Delivery",
    TakeAway => "Take Away",
    PickAndDrop => "Pick and Drop",
    CustomOrder => "Custom Order",
});

impl DeliveryMode {
    /// Take Away orders are collected by the customer and never need a delivery task.
    pub fn needs_task(&self) -> bool {
        !matches!(self, Self::TakeAway)
    }
}

//--------------------------------------   DeliveryOption   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DeliveryOption {
    #[sqlx(rename = "On-demand")]
    #[serde(rename = "On-demand")]
    OnDemand,
    Scheduled,
}

text_enum!(DeliveryOption, "delivery option", {
    OnDemand => "On-demand",
    Scheduled => "Scheduled",
});

//--------------------------------------   PaymentMode   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMode {
    /// Paid from the customer's Famto wallet
    #[sqlx(rename = "Famto-cash")]
    #[serde(rename = "Famto-cash")]
    FamtoCash,
    #[sqlx(rename = "Cash-on-delivery")]
    #[serde(rename = "Cash-on-delivery")]
    CashOnDelivery,
    #[sqlx(rename = "Online-payment")]
    #[serde(rename = "Online-payment")]
    OnlinePayment,
}

text_enum!(PaymentMode, "payment mode", {
    FamtoCash => "Famto-cash",
    CashOnDelivery => "Cash-on-delivery",
    OnlinePayment => "Online-payment",
});

//--------------------------------------   PaymentStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

//--------------------------------------     OrderId       ---------------------------------------------------------
/// Human-readable order identifier, e.g. `O2610042` for the 42nd order placed in October 2026.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The counter period for identifiers created at `at`, e.g. `O2610` for orders placed in October 2026.
pub fn id_period(prefix: char, at: DateTime<Utc>) -> String {
    format!("{prefix}{:02}{:02}", at.year() % 100, at.month())
}

/// Formats the `seq`th identifier of a period.
pub fn format_period_id(period: &str, seq: i64) -> String {
    format!("{period}{seq:03}")
}

//--------------------------------------     TaskId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TaskId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------   Order details   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The catalogue product this item was bought from. Custom and Pick-and-Drop items have no product.
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub price: Money,
}

impl OrderItem {
    pub fn new<S: Into<String>>(name: S, quantity: i64, price: Money) -> Self {
        Self { product_id: None, name: name.into(), quantity, price }
    }

    pub fn with_product<S: Into<String>>(mut self, product_id: S) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn line_total(&self) -> Result<Money, MoneyError> {
        self.price.checked_mul(self.quantity)
    }
}

/// `Σ price × quantity` over the items. Fails rather than wrapping if the total does not fit.
pub fn item_total(items: &[OrderItem]) -> Result<Money, MoneyError> {
    items.iter().try_fold(Money::default(), |total, item| total.checked_add(item.line_total()?))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub phone: String,
    pub line: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub address: Option<Address>,
    pub location: Option<GeoPoint>,
}

/// The delivery window of a multi-day order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Delivery time of day, as entered by the customer, e.g. "18:30"
    pub time: String,
    pub num_of_days: i64,
}

impl ScheduleWindow {
    /// Builds a window covering `start_date..=end_date`. Returns `None` if the end date is before the start date.
    pub fn new<S: Into<String>>(start_date: NaiveDate, end_date: NaiveDate, time: S) -> Option<Self> {
        let days = (end_date - start_date).num_days() + 1;
        (days > 0).then(|| Self { start_date, end_date, time: time.into(), num_of_days: days })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetail {
    pub pickup: Stop,
    pub drop_off: Stop,
    pub distance_km: f64,
    pub schedule: Option<ScheduleWindow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillDetail {
    pub item_total: Money,
    pub delivery_charge: Money,
    pub surge_charge: Money,
    pub tax: Money,
    pub discount: Money,
    pub grand_total: Money,
}

impl BillDetail {
    /// Builds a bill with the grand total derived from the itemised charges.
    pub fn itemised(item_total: Money, delivery_charge: Money, surge_charge: Money, tax: Money, discount: Money) -> Self {
        let grand_total = item_total + delivery_charge + surge_charge + tax - discount;
        Self { item_total, delivery_charge, surge_charge, tax, discount, grand_total }
    }
}

//--------------------------------------   Actors & stepper   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    Admin,
    Merchant,
    Manager,
    Agent,
    Customer,
    System,
}

text_enum!(ActorRole, "actor role", {
    Admin => "Admin",
    Merchant => "Merchant",
    Manager => "Manager",
    Agent => "Agent",
    Customer => "Customer",
    System => "System",
});

/// Whoever triggered a state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    pub user_id: String,
}

impl Actor {
    pub fn new<S: Into<String>>(role: ActorRole, user_id: S) -> Self {
        Self { role, user_id: user_id.into() }
    }

    pub fn system() -> Self {
        Self::new(ActorRole::System, "system")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub by: ActorRole,
    pub user_id: String,
    pub date: DateTime<Utc>,
}

impl StepRecord {
    pub fn new(actor: &Actor, date: DateTime<Utc>) -> Self {
        Self { by: actor.role, user_id: actor.user_id.clone(), date }
    }
}

/// Audit trail of the transitions an order went through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStepper {
    pub created: Option<StepRecord>,
    pub accepted: Option<StepRecord>,
    pub ready: Option<StepRecord>,
    pub completed: Option<StepRecord>,
    pub cancelled: Option<StepRecord>,
}

/// The stepper fields, as addressed by JSON path in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Created,
    Accepted,
    Ready,
    Completed,
    Cancelled,
}

impl Step {
    pub fn json_path(&self) -> &'static str {
        match self {
            Step::Created => "$.created",
            Step::Accepted => "$.accepted",
            Step::Ready => "$.ready",
            Step::Completed => "$.completed",
            Step::Cancelled => "$.cancelled",
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    pub merchant_id: Option<String>,
    pub agent_id: Option<String>,
    pub items: Json<Vec<OrderItem>>,
    pub delivery_mode: DeliveryMode,
    pub delivery_option: DeliveryOption,
    pub delivery: Json<DeliveryDetail>,
    pub bill: Json<BillDetail>,
    pub status: OrderStatus,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub refund_id: Option<String>,
    /// When a gateway refund for cancelling the order was started, while it is in flight
    pub refund_claimed_at: Option<DateTime<Utc>>,
    pub merchant_earnings: Option<Money>,
    pub famto_earnings: Option<Money>,
    pub stepper: Json<OrderStepper>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn grand_total(&self) -> Money {
        self.bill.grand_total
    }

    pub fn item_total(&self) -> Result<Money, MoneyError> {
        item_total(&self.items)
    }

    pub fn num_of_days(&self) -> Option<i64> {
        self.delivery.schedule.as_ref().map(|s| s.num_of_days)
    }

    pub fn commission(&self) -> Option<CommissionDetail> {
        match (self.merchant_earnings, self.famto_earnings) {
            (Some(merchant_earnings), Some(famto_earnings)) => Some(CommissionDetail { merchant_earnings, famto_earnings }),
            _ => None,
        }
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: String,
    pub merchant_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub delivery_mode: DeliveryMode,
    pub delivery_option: DeliveryOption,
    pub delivery: DeliveryDetail,
    pub bill: BillDetail,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    /// The gateway payment identifier, for online payments
    pub payment_id: Option<String>,
    pub created_by: Actor,
}

impl NewOrder {
    /// An on-demand home delivery with a bill consisting of the item total only.
    pub fn new<S: Into<String>>(customer_id: S, items: Vec<OrderItem>, payment_mode: PaymentMode) -> Self {
        let customer_id = customer_id.into();
        // An overflowing item list is refused when the order is placed
        let total = item_total(&items).unwrap_or_default();
        let zero = Money::default();
        Self {
            created_by: Actor::new(ActorRole::Customer, customer_id.clone()),
            customer_id,
            merchant_id: None,
            items,
            delivery_mode: DeliveryMode::HomeDelivery,
            delivery_option: DeliveryOption::OnDemand,
            delivery: DeliveryDetail::default(),
            bill: BillDetail::itemised(total, zero, zero, zero, zero),
            payment_mode,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
        }
    }

    pub fn with_merchant<S: Into<String>>(mut self, merchant_id: S) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn with_delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryDetail) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_bill(mut self, bill: BillDetail) -> Self {
        self.bill = bill;
        self
    }

    /// Turns the order into a scheduled order over the given window.
    pub fn scheduled(mut self, window: ScheduleWindow) -> Self {
        self.delivery_option = DeliveryOption::Scheduled;
        self.delivery.schedule = Some(window);
        self
    }

    pub fn with_payment_id<S: Into<String>>(mut self, payment_id: S) -> Self {
        self.payment_id = Some(payment_id.into());
        self.payment_status = PaymentStatus::Completed;
        self
    }

    pub fn created_by(mut self, actor: Actor) -> Self {
        self.created_by = actor;
        self
    }
}

//--------------------------------------   ScheduledOrder   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct ScheduledOrder {
    pub id: String,
    pub customer_id: String,
    pub merchant_id: Option<String>,
    pub items: Json<Vec<OrderItem>>,
    pub delivery_mode: DeliveryMode,
    pub delivery: Json<DeliveryDetail>,
    pub bill: Json<BillDetail>,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub time: String,
    pub num_of_days: i64,
    pub is_viewed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScheduledOrder {
    pub customer_id: String,
    pub merchant_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub delivery_mode: DeliveryMode,
    pub delivery: DeliveryDetail,
    pub bill: BillDetail,
    pub payment_mode: PaymentMode,
    pub payment_status: PaymentStatus,
    pub window: ScheduleWindow,
}

//--------------------------------------        Task       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TaskStatus {
    Unassigned,
    Assigned,
    Completed,
}

text_enum!(TaskStatus, "task status", {
    Unassigned => "Unassigned",
    Assigned => "Assigned",
    Completed => "Completed",
});

#[derive(Debug, Clone, FromRow)]
pub struct Task {
    pub id: TaskId,
    pub order_id: OrderId,
    pub delivery_mode: DeliveryMode,
    pub pickup: Json<Stop>,
    pub drop_off: Json<Stop>,
    pub status: TaskStatus,
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The delivery task to create for an order.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub order_id: OrderId,
    pub delivery_mode: DeliveryMode,
    pub pickup: Stop,
    pub drop_off: Stop,
}

impl NewTask {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            delivery_mode: order.delivery_mode,
            pickup: order.delivery.pickup.clone(),
            drop_off: order.delivery.drop_off.clone(),
        }
    }
}

//--------------------------------------     TaskOffer       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Withdrawn,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskOffer {
    pub id: i64,
    pub task_id: TaskId,
    pub agent_id: String,
    pub status: OfferStatus,
    pub offered_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TaskOffer {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == OfferStatus::Pending && self.expires_at > now
    }
}

//--------------------------------------        Agent       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AgentStatus {
    Free,
    Busy,
    /// Off shift
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    pub approval: ApprovalStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tag: Option<String>,
    pub salary_structure_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == AgentStatus::Free && self.approval == ApprovalStatus::Approved
    }
}

#[derive(Debug, Clone)]
pub struct NewAgent {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    pub approval: ApprovalStatus,
    pub location: Option<GeoPoint>,
    pub tag: Option<String>,
    pub salary_structure_id: Option<String>,
}

impl NewAgent {
    /// A free, approved agent with no location, tag or salary structure.
    pub fn available<S: Into<String>>(id: S, name: S) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: AgentStatus::Free,
            approval: ApprovalStatus::Approved,
            location: None,
            tag: None,
            salary_structure_id: None,
        }
    }

    pub fn at(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_salary_structure<S: Into<String>>(mut self, id: S) -> Self {
        self.salary_structure_id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_approval(mut self, approval: ApprovalStatus) -> Self {
        self.approval = approval;
        self
    }
}

//--------------------------------------   AutoAllocation   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AllocationType {
    All,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PriorityType {
    Default,
    #[sqlx(rename = "Monthly-salaried")]
    #[serde(rename = "Monthly-salaried")]
    MonthlySalaried,
}

/// The name of the agent pricing rule that identifies salaried agents.
pub const MONTHLY_SALARIED_RULE: &str = "Monthly-salaried";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AutoAllocation {
    pub allocation_type: AllocationType,
    pub priority_type: PriorityType,
    /// 0 means unbounded
    pub max_radius_km: f64,
    pub expire_time_secs: i64,
    pub is_active: bool,
}

impl AutoAllocation {
    pub fn expire_time(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.expire_time_secs.max(0))
    }
}

impl Default for AutoAllocation {
    fn default() -> Self {
        Self {
            allocation_type: AllocationType::All,
            priority_type: PriorityType::Default,
            max_radius_km: 0.0,
            expire_time_secs: 60,
            is_active: false,
        }
    }
}

//--------------------------------------   Merchant   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PricingModel {
    Commission,
    Subscription,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub business_category: Option<String>,
    pub pricing_model: PricingModel,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Merchant {
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

//--------------------------------------   Commission   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CommissionType {
    Percentage,
    Fixed,
}

/// A merchant's commission rule, as stored.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CommissionRuleRecord {
    pub merchant_id: String,
    pub commission_type: CommissionType,
    /// Basis points for percentage rules, minor currency units for fixed rules
    pub commission_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionDetail {
    pub merchant_earnings: Money,
    pub famto_earnings: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CommissionStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CommissionLog {
    pub id: i64,
    pub order_id: OrderId,
    pub merchant_id: String,
    pub total_amount: Money,
    pub merchant_earnings: Money,
    pub famto_earnings: Money,
    pub payment_mode: PaymentMode,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   Customers   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub wallet_balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionType {
    #[sqlx(rename = "Refund/Credit")]
    #[serde(rename = "Refund/Credit")]
    RefundCredit,
}

/// Where the money of a customer transaction went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum MoneyChannel {
    Wallet,
    Gateway,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CustomerTransaction {
    pub id: i64,
    pub customer_id: String,
    pub order_id: OrderId,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub channel: MoneyChannel,
    /// The gateway refund id, for gateway refunds
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   Catalogue   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Product {
    pub id: String,
    pub merchant_id: String,
    pub name: String,
    pub available_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Manager {
    pub id: String,
    pub name: String,
    pub role: String,
}
