//! Order rules shared by the API and the form model.
//!
//! Requiredness depends on `orderStatus` ([`STATUS_RULES`]); the allowed
//! values of the outcome flags depend on `isShowUp`/`isDeal`
//! ([`allowed_outcomes`]). Both create and update go through [`validate`].

mod form;
mod user;

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::entities::order::{Flag, LossDeal, NewOrder, OrderDraft, OrderStatus};
use crate::utils::is_clock_time;

pub use form::{FormEvent, FormField, OrderForm};
pub use user::validate_user;

pub const SOLD: &str = "Sold";

static REGISTRATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All problems found in one pass, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn clear_field(&mut self, field: &str) {
        self.0.retain(|e| e.field != field);
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(e) => f.write_str(&e.message),
            None => f.write_str("invalid order"),
        }
    }
}

/// Fields whose requiredness flips with the order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeField {
    ClosingDate,
    IsShowUp,
    IsDeal,
    ReasonForAction,
    ReasonDetail,
    IsLossDeal,
}

impl OutcomeField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::ClosingDate => "closingDate",
            Self::IsShowUp => "isShowUp",
            Self::IsDeal => "isDeal",
            Self::ReasonForAction => "reasonForAction",
            Self::ReasonDetail => "reasonDetail",
            Self::IsLossDeal => "isLossDeal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ClosingDate => "Closing date",
            Self::IsShowUp => "Show up status",
            Self::IsDeal => "Deal status",
            Self::ReasonForAction => "Reason for action",
            Self::ReasonDetail => "Reason detail",
            Self::IsLossDeal => "Loss deal status",
        }
    }

    pub fn is_set(&self, d: &OrderDraft) -> bool {
        match self {
            Self::ClosingDate => d.closing_date.is_some(),
            Self::IsShowUp => d.is_show_up.is_some(),
            Self::IsDeal => d.is_deal.is_some(),
            Self::ReasonForAction => present(&d.reason_for_action),
            Self::ReasonDetail => present(&d.reason_detail),
            Self::IsLossDeal => d.is_loss_deal.is_some(),
        }
    }

    pub fn clear(&self, d: &mut OrderDraft) {
        match self {
            Self::ClosingDate => d.closing_date = None,
            Self::IsShowUp => d.is_show_up = None,
            Self::IsDeal => d.is_deal = None,
            Self::ReasonForAction => d.reason_for_action = None,
            Self::ReasonDetail => d.reason_detail = None,
            Self::IsLossDeal => d.is_loss_deal = None,
        }
    }
}

pub struct StatusRule {
    pub status: OrderStatus,
    pub required: &'static [OutcomeField],
    pub empty: &'static [OutcomeField],
}

const OUTCOME_FLAGS: &[OutcomeField] = &[
    OutcomeField::IsShowUp,
    OutcomeField::IsDeal,
    OutcomeField::ReasonForAction,
    OutcomeField::ReasonDetail,
    OutcomeField::IsLossDeal,
];

pub const STATUS_RULES: [StatusRule; 2] = [
    StatusRule {
        status: OrderStatus::Active,
        required: &[],
        empty: OUTCOME_FLAGS,
    },
    StatusRule {
        status: OrderStatus::Inactive,
        required: &[
            OutcomeField::ClosingDate,
            OutcomeField::IsShowUp,
            OutcomeField::IsDeal,
            OutcomeField::ReasonForAction,
            OutcomeField::ReasonDetail,
            OutcomeField::IsLossDeal,
        ],
        empty: &[],
    },
];

pub fn status_rule(status: OrderStatus) -> &'static StatusRule {
    match status {
        OrderStatus::Active => &STATUS_RULES[0],
        OrderStatus::Inactive => &STATUS_RULES[1],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonRule {
    Any,
    Exactly(&'static str),
    NotSold,
    StartsWith(&'static str),
}

impl ReasonRule {
    pub fn accepts(&self, reason: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(v) => reason == *v,
            Self::NotSold => reason != SOLD,
            Self::StartsWith(prefix) => reason.starts_with(prefix),
        }
    }

    fn complaint(&self) -> String {
        match self {
            Self::Any => "Reason for action is invalid".into(),
            Self::Exactly(v) => format!("Reason for action must be {v} when the deal is done"),
            Self::NotSold => format!("Reason for action cannot be {SOLD} when there is no deal"),
            Self::StartsWith(prefix) => {
                format!("Reason for action must be one of the {prefix} reasons")
            }
        }
    }
}

/// Outcome values permitted for a given show-up/deal combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allowed {
    pub deal: &'static [Flag],
    pub reason: ReasonRule,
    pub loss: &'static [LossDeal],
}

pub fn allowed_outcomes(show_up: Option<Flag>, deal: Option<Flag>) -> Allowed {
    let deals: &'static [Flag] = match show_up {
        Some(Flag::No) => &[Flag::No],
        _ => &[Flag::Yes, Flag::No],
    };
    let (reason, loss): (ReasonRule, &'static [LossDeal]) = match (deal, show_up) {
        (Some(Flag::Yes), _) => (ReasonRule::Exactly(SOLD), &[LossDeal::No]),
        (Some(Flag::No), Some(Flag::Yes)) => {
            (ReasonRule::StartsWith("Onsite"), &[LossDeal::Yes, LossDeal::No])
        }
        (Some(Flag::No), Some(Flag::No)) => {
            (ReasonRule::StartsWith("Phone"), &[LossDeal::Yes, LossDeal::No])
        }
        (Some(Flag::No), None) => (ReasonRule::NotSold, &[LossDeal::Yes, LossDeal::No]),
        (None, _) => (ReasonRule::Any, &[LossDeal::Yes, LossDeal::No, LossDeal::Sold]),
    };
    Allowed {
        deal: deals,
        reason,
        loss,
    }
}

/// Narrows reason candidates for the current answers. A sold deal always
/// offers exactly `Sold`, whether or not it is among the candidates.
pub fn reason_options<I>(show_up: Option<Flag>, deal: Option<Flag>, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    match allowed_outcomes(show_up, deal).reason {
        ReasonRule::Exactly(v) => vec![v.to_string()],
        rule => candidates.into_iter().filter(|c| rule.accepts(c)).collect(),
    }
}

fn present(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

pub fn validate(d: &OrderDraft) -> Result<NewOrder, ValidationErrors> {
    let mut errs = ValidationErrors::default();

    match d.registration.as_deref().map(str::trim) {
        None | Some("") => errs.push("registration", "Registration is required"),
        Some(r) if !REGISTRATION.is_match(r) => errs.push(
            "registration",
            "Registration must contain only uppercase letters and numbers, no spaces or special characters",
        ),
        Some(_) => {}
    }

    match d.customer.as_deref().map(str::trim) {
        None | Some("") => errs.push("customer", "Customer is required"),
        Some(c) if c.chars().count() < 3 => {
            errs.push("customer", "Customer name must be at least 3 characters")
        }
        Some(_) => {}
    }

    let base_required: [(&'static str, &str, bool); 6] = [
        ("entryDate", "Entry date", d.entry_date.is_some()),
        ("entryTime", "Entry time", present(&d.entry_time)),
        ("enquiryType", "Enquiry type", present(&d.enquiry_type)),
        ("openingDate", "Order date", d.opening_date.is_some()),
        ("salesExecutive", "Sales executive", present(&d.sales_executive)),
        ("location", "Location", present(&d.location)),
    ];
    for (field, label, ok) in base_required {
        if !ok {
            errs.push(field, format!("{label} is required"));
        }
    }

    for (field, label, value) in [
        ("entryTime", "Entry time", &d.entry_time),
        ("closingTime", "Closing time", &d.closing_time),
    ] {
        if let Some(t) = value.as_deref().filter(|t| !t.trim().is_empty()) {
            if !is_clock_time(t.trim()) {
                errs.push(field, format!("{label} must be in HH:MM format"));
            }
        }
    }

    if let (Some(opening), Some(entry)) = (d.opening_date, d.entry_date) {
        if opening > entry {
            errs.push("openingDate", "Order date cannot be later than entry date");
        }
    }
    if let (Some(closing), Some(opening)) = (d.closing_date, d.opening_date) {
        if closing < opening {
            errs.push("closingDate", "Closing date cannot be earlier than order date");
        }
    }

    let status = d.order_status.unwrap_or_default();
    let rule = status_rule(status);
    for f in rule.empty {
        if f.is_set(d) {
            errs.push(
                f.key(),
                format!("{} must be empty while the order is active", f.label()),
            );
        }
    }
    for f in rule.required {
        if !f.is_set(d) {
            errs.push(f.key(), format!("{} is required", f.label()));
        }
    }

    if status == OrderStatus::Inactive {
        let allowed = allowed_outcomes(d.is_show_up, d.is_deal);
        if let Some(deal) = d.is_deal.filter(|v| !allowed.deal.contains(v)) {
            errs.push(
                "isDeal",
                format!(
                    "Deal status must be {} when show up status is {}, got {deal}",
                    join(allowed.deal),
                    d.is_show_up.map(|f| f.as_str()).unwrap_or("unset"),
                ),
            );
        }
        if let Some(reason) = d.reason_for_action.as_deref().filter(|r| !r.trim().is_empty()) {
            if !allowed.reason.accepts(reason.trim()) {
                errs.push("reasonForAction", allowed.reason.complaint());
            }
        }
        if let Some(loss) = d.is_loss_deal.filter(|v| !allowed.loss.contains(v)) {
            errs.push(
                "isLossDeal",
                format!("Loss deal status must be {}, got {loss}", join(allowed.loss)),
            );
        }
    }

    if !errs.is_empty() {
        return Err(errs);
    }
    build(d, status).ok_or(errs)
}

fn build(d: &OrderDraft, order_status: OrderStatus) -> Option<NewOrder> {
    let owned = |v: &Option<String>| v.as_deref().map(|s| s.trim().to_string());
    let optional = |v: &Option<String>| owned(v).filter(|s| !s.is_empty());
    Some(NewOrder {
        entry_date: d.entry_date?,
        entry_time: owned(&d.entry_time)?,
        registration: owned(&d.registration)?,
        enquiry_type: owned(&d.enquiry_type)?,
        opening_date: d.opening_date?,
        closing_date: d.closing_date,
        closing_time: optional(&d.closing_time),
        sales_executive: owned(&d.sales_executive)?,
        location: owned(&d.location)?,
        customer: owned(&d.customer)?,
        is_pct_sheet_received_within_time: optional(&d.is_pct_sheet_received_within_time),
        pct_status: optional(&d.pct_status),
        order_status,
        is_show_up: d.is_show_up,
        is_deal: d.is_deal,
        reason_for_action: optional(&d.reason_for_action),
        reason_detail: optional(&d.reason_detail),
        is_loss_deal: d.is_loss_deal,
    })
}
