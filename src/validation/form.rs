use chrono::NaiveDate;

use super::{allowed_outcomes, reason_options, validate, ReasonRule, ValidationErrors, OUTCOME_FLAGS};
use crate::entities::order::{NewOrder, Order, OrderDraft, OrderStatus};
use crate::utils::parse_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    EntryDate,
    EntryTime,
    Registration,
    EnquiryType,
    OpeningDate,
    ClosingDate,
    ClosingTime,
    SalesExecutive,
    Location,
    Customer,
    IsPctSheetReceivedWithinTime,
    PctStatus,
    OrderStatus,
    IsShowUp,
    IsDeal,
    ReasonForAction,
    ReasonDetail,
    IsLossDeal,
}

impl FormField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::EntryDate => "entryDate",
            Self::EntryTime => "entryTime",
            Self::Registration => "registration",
            Self::EnquiryType => "enquiryType",
            Self::OpeningDate => "openingDate",
            Self::ClosingDate => "closingDate",
            Self::ClosingTime => "closingTime",
            Self::SalesExecutive => "salesExecutive",
            Self::Location => "location",
            Self::Customer => "customer",
            Self::IsPctSheetReceivedWithinTime => "isPctSheetReceivedWithinTime",
            Self::PctStatus => "pctStatus",
            Self::OrderStatus => "orderStatus",
            Self::IsShowUp => "isShowUp",
            Self::IsDeal => "isDeal",
            Self::ReasonForAction => "reasonForAction",
            Self::ReasonDetail => "reasonDetail",
            Self::IsLossDeal => "isLossDeal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A field was edited; `None` or a blank string clears it.
    Set(FormField, Option<String>),
    Reset,
}

/// Register/edit form state. Edits keep the outcome fields consistent with
/// the rule table as the user goes; `submit` runs the full validation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderForm {
    draft: OrderDraft,
    initial: OrderDraft,
    errors: ValidationErrors,
}

impl OrderForm {
    /// Blank register form dated `today`, status Active.
    pub fn register(today: NaiveDate, now: &str) -> Self {
        let draft = OrderDraft {
            entry_date: Some(today),
            entry_time: Some(now.to_string()),
            opening_date: Some(today),
            closing_time: Some(now.to_string()),
            order_status: Some(OrderStatus::Active),
            ..Default::default()
        };
        Self::from_draft(draft)
    }

    pub fn edit(order: &Order) -> Self {
        Self::from_draft(OrderDraft::from(order))
    }

    fn from_draft(draft: OrderDraft) -> Self {
        Self {
            initial: draft.clone(),
            draft,
            errors: ValidationErrors::default(),
        }
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn apply(&mut self, event: FormEvent) {
        match event {
            FormEvent::Reset => {
                self.draft = self.initial.clone();
                self.errors = ValidationErrors::default();
            }
            FormEvent::Set(field, value) => {
                self.errors.clear_field(field.key());
                let value = value.filter(|v| !v.trim().is_empty());
                if let Err(msg) = self.set(field, value) {
                    self.errors.push(field.key(), msg);
                    return;
                }
                self.reconcile(field);
            }
        }
    }

    fn set(&mut self, field: FormField, value: Option<String>) -> Result<(), String> {
        let d = &mut self.draft;
        let date = |v: Option<String>| match v {
            None => Ok(None),
            Some(s) => parse_date(&s).map(Some).ok_or_else(|| format!("Invalid date: {s}")),
        };
        match field {
            FormField::EntryDate => d.entry_date = date(value)?,
            FormField::OpeningDate => d.opening_date = date(value)?,
            FormField::ClosingDate => d.closing_date = date(value)?,
            FormField::EntryTime => d.entry_time = value,
            FormField::Registration => d.registration = value,
            FormField::EnquiryType => d.enquiry_type = value,
            FormField::ClosingTime => d.closing_time = value,
            FormField::SalesExecutive => d.sales_executive = value,
            FormField::Location => d.location = value,
            FormField::Customer => d.customer = value,
            FormField::IsPctSheetReceivedWithinTime => d.is_pct_sheet_received_within_time = value,
            FormField::PctStatus => d.pct_status = value,
            FormField::ReasonForAction => d.reason_for_action = value,
            FormField::ReasonDetail => d.reason_detail = value,
            FormField::OrderStatus => d.order_status = value.map(|v| v.parse()).transpose()?,
            FormField::IsShowUp => d.is_show_up = value.map(|v| v.parse()).transpose()?,
            FormField::IsDeal => d.is_deal = value.map(|v| v.parse()).transpose()?,
            FormField::IsLossDeal => d.is_loss_deal = value.map(|v| v.parse()).transpose()?,
        }
        Ok(())
    }

    fn reconcile(&mut self, changed: FormField) {
        let d = &mut self.draft;
        match changed {
            FormField::OrderStatus if d.order_status != Some(OrderStatus::Inactive) => {
                for f in OUTCOME_FLAGS {
                    f.clear(d);
                }
            }
            FormField::IsShowUp | FormField::IsDeal => {
                let allowed = allowed_outcomes(d.is_show_up, d.is_deal);
                if let [only] = allowed.deal {
                    d.is_deal = Some(*only);
                }

                let allowed = allowed_outcomes(d.is_show_up, d.is_deal);
                match allowed.reason {
                    ReasonRule::Exactly(v) => d.reason_for_action = Some(v.to_string()),
                    rule => {
                        if d.reason_for_action.as_deref().is_some_and(|r| !rule.accepts(r)) {
                            d.reason_for_action = None;
                        }
                    }
                }
                match allowed.loss {
                    [only] => d.is_loss_deal = Some(*only),
                    options => {
                        if d.is_loss_deal.is_some_and(|l| !options.contains(&l)) {
                            d.is_loss_deal = None;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Reason choices to offer for the current show-up/deal answers.
    pub fn reason_options(&self, candidates: Vec<String>) -> Vec<String> {
        reason_options(self.draft.is_show_up, self.draft.is_deal, candidates)
    }

    /// Validates the whole form. All errors are kept on the form; the first
    /// message is returned for display.
    pub fn submit(&mut self) -> Result<NewOrder, String> {
        match validate(&self.draft) {
            Ok(new) => {
                self.errors = ValidationErrors::default();
                Ok(new)
            }
            Err(errs) => {
                let first = errs.to_string();
                self.errors = errs;
                Err(first)
            }
        }
    }
}
