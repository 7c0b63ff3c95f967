use std::str::FromStr;

use chrono::NaiveDate;
use derive_more::Display;
use serde::{de, Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::utils::{lenient, now_ms};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, Default)]
pub enum OrderStatus {
    #[default]
    Active,
    Inactive,
}

/// Yes/No answer used by `isShowUp` and `isDeal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
pub enum Flag {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
pub enum LossDeal {
    Yes,
    No,
    Sold,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl Flag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl LossDeal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Sold => "Sold",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Self::Yes),
            "No" => Ok(Self::No),
            other => Err(format!("expected Yes or No, got: {other}")),
        }
    }
}

impl FromStr for LossDeal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Self::Yes),
            "No" => Ok(Self::No),
            "Sold" => Ok(Self::Sold),
            other => Err(format!("expected Yes, No or Sold, got: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub entry_date: NaiveDate,
    pub entry_time: String,
    pub registration: String,
    pub enquiry_type: String,
    pub opening_date: NaiveDate,
    #[serde(default)]
    pub closing_date: Option<NaiveDate>,
    #[serde(default)]
    pub closing_time: Option<String>,
    pub sales_executive: String,
    pub location: String,
    pub customer: String,
    #[serde(default)]
    pub is_pct_sheet_received_within_time: Option<String>,
    #[serde(default)]
    pub pct_status: Option<String>,
    pub order_status: OrderStatus,
    #[serde(default)]
    pub is_show_up: Option<Flag>,
    #[serde(default)]
    pub is_deal: Option<Flag>,
    #[serde(default)]
    pub reason_for_action: Option<String>,
    #[serde(default)]
    pub reason_detail: Option<String>,
    #[serde(default)]
    pub is_loss_deal: Option<LossDeal>,
    pub created: i64,
    pub updated: i64,
}

/// An order that passed validation but has no identity yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub entry_date: NaiveDate,
    pub entry_time: String,
    pub registration: String,
    pub enquiry_type: String,
    pub opening_date: NaiveDate,
    pub closing_date: Option<NaiveDate>,
    pub closing_time: Option<String>,
    pub sales_executive: String,
    pub location: String,
    pub customer: String,
    pub is_pct_sheet_received_within_time: Option<String>,
    pub pct_status: Option<String>,
    pub order_status: OrderStatus,
    pub is_show_up: Option<Flag>,
    pub is_deal: Option<Flag>,
    pub reason_for_action: Option<String>,
    pub reason_detail: Option<String>,
    pub is_loss_deal: Option<LossDeal>,
}

impl Order {
    pub fn from_new(new: NewOrder) -> Self {
        let now = now_ms();
        Self::assemble(Uuid::new_v4().to_string(), new, now, now)
    }

    /// Full replacement that keeps identity and creation time.
    pub fn replace_with(&self, new: NewOrder) -> Self {
        Self::assemble(self.id.clone(), new, self.created, now_ms().max(self.updated))
    }

    fn assemble(id: String, new: NewOrder, created: i64, updated: i64) -> Self {
        Self {
            id,
            entry_date: new.entry_date,
            entry_time: new.entry_time,
            registration: new.registration,
            enquiry_type: new.enquiry_type,
            opening_date: new.opening_date,
            closing_date: new.closing_date,
            closing_time: new.closing_time,
            sales_executive: new.sales_executive,
            location: new.location,
            customer: new.customer,
            is_pct_sheet_received_within_time: new.is_pct_sheet_received_within_time,
            pct_status: new.pct_status,
            order_status: new.order_status,
            is_show_up: new.is_show_up,
            is_deal: new.is_deal,
            reason_for_action: new.reason_for_action,
            reason_detail: new.reason_detail,
            is_loss_deal: new.is_loss_deal,
            created,
            updated,
        }
    }
}

/// Field names older clients still send.
const LEGACY_NAMES: &[(&str, &str)] = &[
    ("orderDate", "openingDate"),
    ("collectionDate", "closingDate"),
    ("cancellationDate", "closingDate"),
    ("collectionTime", "closingTime"),
    ("registeration", "registration"),
];

/// Server-maintained keys that a patch may echo back but never changes.
const IMMUTABLE_KEYS: &[&str] = &["_id", "id", "created", "updated", "__v"];

fn canonical_field(key: &str) -> &str {
    LEGACY_NAMES
        .iter()
        .find(|(legacy, _)| *legacy == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// Unvalidated order payload, as submitted by a form or API client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderDraft {
    #[serde(default, deserialize_with = "lenient::date")]
    pub entry_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub entry_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed", alias = "registeration")]
    pub registration: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub enquiry_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::date", alias = "orderDate")]
    pub opening_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "lenient::date",
        alias = "collectionDate",
        alias = "cancellationDate"
    )]
    pub closing_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::parsed", alias = "collectionTime")]
    pub closing_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub sales_executive: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub is_pct_sheet_received_within_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub pct_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub order_status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub is_show_up: Option<Flag>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub is_deal: Option<Flag>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub reason_for_action: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub reason_detail: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub is_loss_deal: Option<LossDeal>,
}

impl OrderDraft {
    /// Overlays a JSON patch on this draft. `null` clears a field, legacy names
    /// are mapped to their canonical field and unknown keys are rejected.
    pub fn merge_patch(&self, patch: Value) -> Result<OrderDraft, serde_json::Error> {
        let Value::Object(patch) = patch else {
            return Err(de::Error::custom("order patch must be a JSON object"));
        };
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        for (key, value) in patch {
            if IMMUTABLE_KEYS.contains(&key.as_str()) {
                continue;
            }
            merged.insert(canonical_field(&key).to_string(), value);
        }
        serde_json::from_value(Value::Object(merged))
    }
}

impl From<&Order> for OrderDraft {
    fn from(o: &Order) -> Self {
        Self {
            entry_date: Some(o.entry_date),
            entry_time: Some(o.entry_time.clone()),
            registration: Some(o.registration.clone()),
            enquiry_type: Some(o.enquiry_type.clone()),
            opening_date: Some(o.opening_date),
            closing_date: o.closing_date,
            closing_time: o.closing_time.clone(),
            sales_executive: Some(o.sales_executive.clone()),
            location: Some(o.location.clone()),
            customer: Some(o.customer.clone()),
            is_pct_sheet_received_within_time: o.is_pct_sheet_received_within_time.clone(),
            pct_status: o.pct_status.clone(),
            order_status: Some(o.order_status),
            is_show_up: o.is_show_up,
            is_deal: o.is_deal,
            reason_for_action: o.reason_for_action.clone(),
            reason_detail: o.reason_detail.clone(),
            is_loss_deal: o.is_loss_deal,
        }
    }
}
