//! Query-string → order filter translation.
//!
//! Every listing endpoint goes through [`ListRequest::parse`]. The resulting
//! [`OrderFilter`] renders to a MongoDB filter document and can also be
//! evaluated against an in-memory [`Order`], so both stores answer the same
//! query the same way.

mod months;

use std::{cmp::Ordering, collections::BTreeMap};

use bson::{doc, Document};

use crate::entities::order::Order;

pub use months::MonthRange;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Date field the `months` parameter ranges over.
const MONTH_FIELD: &str = "openingDate";

/// Fields matched by free-text `search`, case-insensitively.
pub const SEARCH_FIELDS: [&str; 10] = [
    "entryTime",
    "enquiryType",
    "registration",
    "salesExecutive",
    "location",
    "pctStatus",
    "orderStatus",
    "reasonForAction",
    "reasonDetail",
    "customer",
];

fn search_haystack(o: &Order) -> [Option<&str>; 10] {
    [
        Some(o.entry_time.as_str()),
        Some(o.enquiry_type.as_str()),
        Some(o.registration.as_str()),
        Some(o.sales_executive.as_str()),
        Some(o.location.as_str()),
        o.pct_status.as_deref(),
        Some(o.order_status.as_str()),
        o.reason_for_action.as_deref(),
        o.reason_detail.as_deref(),
        Some(o.customer.as_str()),
    ]
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter field: {0}")]
    UnknownField(String),
    #[error("invalid month: {0} (expected e.g. \"Jan 2024\")")]
    BadMonth(String),
    #[error("invalid {0}: {1}")]
    BadDatePart(&'static str, String),
    #[error("page {0} is out of range")]
    PageOutOfRange(u64),
}

/// Fields a client may filter on with an exact/IN match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    EnquiryType,
    SalesExecutive,
    IsPctSheetReceivedWithinTime,
    PctStatus,
    Location,
    OrderStatus,
    IsShowUp,
    IsDeal,
    ReasonForAction,
    IsLossDeal,
}

impl FilterField {
    pub const ALL: [FilterField; 10] = [
        Self::EnquiryType,
        Self::SalesExecutive,
        Self::IsPctSheetReceivedWithinTime,
        Self::PctStatus,
        Self::Location,
        Self::OrderStatus,
        Self::IsShowUp,
        Self::IsDeal,
        Self::ReasonForAction,
        Self::IsLossDeal,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::EnquiryType => "enquiryType",
            Self::SalesExecutive => "salesExecutive",
            Self::IsPctSheetReceivedWithinTime => "isPctSheetReceivedWithinTime",
            Self::PctStatus => "pctStatus",
            Self::Location => "location",
            Self::OrderStatus => "orderStatus",
            Self::IsShowUp => "isShowUp",
            Self::IsDeal => "isDeal",
            Self::ReasonForAction => "reasonForAction",
            Self::IsLossDeal => "isLossDeal",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        if param == "isPCTSheetReceivedWithinTime" {
            return Some(Self::IsPctSheetReceivedWithinTime);
        }
        Self::ALL.into_iter().find(|f| f.key() == param)
    }

    pub fn value_of<'a>(&self, o: &'a Order) -> Option<&'a str> {
        match self {
            Self::EnquiryType => Some(&o.enquiry_type),
            Self::SalesExecutive => Some(&o.sales_executive),
            Self::IsPctSheetReceivedWithinTime => o.is_pct_sheet_received_within_time.as_deref(),
            Self::PctStatus => o.pct_status.as_deref(),
            Self::Location => Some(&o.location),
            Self::OrderStatus => Some(o.order_status.as_str()),
            Self::IsShowUp => o.is_show_up.map(|f| f.as_str()),
            Self::IsDeal => o.is_deal.map(|f| f.as_str()),
            Self::ReasonForAction => o.reason_for_action.as_deref(),
            Self::IsLossDeal => o.is_loss_deal.map(|l| l.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest order first.
    OpeningDesc,
    /// Earliest closing first; orders without a closing date lead.
    ClosingAsc,
}

impl SortOrder {
    pub fn to_document(&self) -> Document {
        match self {
            Self::OpeningDesc => doc! { "openingDate": -1, "_id": 1 },
            Self::ClosingAsc => doc! { "closingDate": 1, "_id": 1 },
        }
    }

    pub fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let primary = match self {
            Self::OpeningDesc => b.opening_date.cmp(&a.opening_date),
            Self::ClosingAsc => a.closing_date.cmp(&b.closing_date),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    fields: BTreeMap<FilterField, Vec<String>>,
    search: Option<String>,
    months: Vec<MonthRange>,
    closing_prefix: Option<String>,
}

impl OrderFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts `field` to `values`, replacing any previous restriction.
    pub fn with_values<I, S>(mut self, field: FilterField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(field, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_only(&self, field: FilterField, value: &str) -> Self {
        self.clone().with_values(field, [value])
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_months(mut self, months: Vec<MonthRange>) -> Self {
        self.months = months;
        self
    }

    pub fn with_closing_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.closing_prefix = Some(prefix.into());
        self
    }

    /// Whether an order with `field == value` could pass this filter.
    pub fn allows(&self, field: FilterField, value: &str) -> bool {
        self.fields
            .get(&field)
            .map_or(true, |values| values.iter().any(|v| v == value))
    }

    pub fn values(&self, field: FilterField) -> Option<&[String]> {
        self.fields.get(&field).map(Vec::as_slice)
    }

    /// Filters for the sold (`isDeal=Yes`) and cancelled (`isDeal=No`) subsets,
    /// or `None` where this filter already excludes that outcome.
    pub fn outcome_filters(&self) -> (Option<Self>, Option<Self>) {
        let narrow = |v: &str| {
            self.allows(FilterField::IsDeal, v)
                .then(|| self.with_only(FilterField::IsDeal, v))
        };
        (narrow("Yes"), narrow("No"))
    }

    pub fn to_document(&self) -> Document {
        let mut clauses: Vec<Document> = Vec::new();

        for (field, values) in &self.fields {
            let key = field.key();
            clauses.push(match values.as_slice() {
                [one] => doc! { key: one.as_str() },
                many => doc! { key: { "$in": many.to_vec() } },
            });
        }

        if let Some(term) = &self.search {
            let pattern = regex::escape(term);
            let any: Vec<Document> = SEARCH_FIELDS
                .iter()
                .map(|&key| doc! { key: { "$regex": pattern.as_str(), "$options": "i" } })
                .collect();
            clauses.push(doc! { "$or": any });
        }

        if !self.months.is_empty() {
            let key = MONTH_FIELD;
            let any: Vec<Document> = self
                .months
                .iter()
                .map(|m| {
                    doc! { key: { "$gte": m.start.to_string(), "$lte": m.end.to_string() } }
                })
                .collect();
            clauses.push(doc! { "$or": any });
        }

        if let Some(prefix) = &self.closing_prefix {
            let pattern = format!("^{}", regex::escape(prefix));
            clauses.push(doc! { "closingDate": { "$regex": pattern } });
        }

        match clauses.len() {
            0 => Document::new(),
            1 => clauses.remove(0),
            _ => doc! { "$and": clauses },
        }
    }

    pub fn matches(&self, o: &Order) -> bool {
        let fields_ok = self.fields.iter().all(|(field, values)| {
            field
                .value_of(o)
                .is_some_and(|v| values.iter().any(|x| x == v))
        });
        if !fields_ok {
            return false;
        }

        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            let hit = search_haystack(o)
                .into_iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if !self.months.is_empty() && !self.months.iter().any(|m| m.contains(o.opening_date)) {
            return false;
        }

        match &self.closing_prefix {
            Some(prefix) => o
                .closing_date
                .is_some_and(|d| d.to_string().starts_with(prefix.as_str())),
            None => true,
        }
    }
}

/// Which listing endpoint a request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    Active,
    Inactive,
    Cancellation,
}

impl ListScope {
    /// Constraints the scope always applies; client values for these fields
    /// are ignored.
    pub fn pinned(&self) -> &'static [(FilterField, &'static str)] {
        match self {
            Self::All => &[],
            Self::Active => &[(FilterField::OrderStatus, "Active")],
            Self::Inactive => &[(FilterField::OrderStatus, "Inactive")],
            Self::Cancellation => &[
                (FilterField::OrderStatus, "Inactive"),
                (FilterField::IsDeal, "No"),
            ],
        }
    }

    pub fn sort(&self) -> SortOrder {
        match self {
            Self::Cancellation => SortOrder::ClosingAsc,
            _ => SortOrder::OpeningDesc,
        }
    }

    /// Whether the response carries sold/cancelled totals.
    pub fn reports_outcomes(&self) -> bool {
        !matches!(self, Self::Cancellation)
    }

    fn is_pinned(&self, field: FilterField) -> bool {
        self.pinned().iter().any(|(f, _)| *f == field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub scope: ListScope,
    pub page: u64,
    pub limit: u64,
    pub filter: OrderFilter,
}

impl ListRequest {
    /// Bounded by `parse`; saturates for hand-built requests.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn sort(&self) -> SortOrder {
        self.scope.sort()
    }

    pub fn parse<I, K, V>(scope: ListScope, pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page = None;
        let mut limit = None;
        let mut search: Option<String> = None;
        let mut months = Vec::new();
        let mut wanted: BTreeMap<FilterField, Vec<String>> = BTreeMap::new();
        let (mut year, mut month, mut day) = (None, None, None);

        for (key, raw) in pairs {
            let (key, raw) = (key.as_ref(), raw.as_ref().trim());
            match key {
                "page" => page = positive(raw),
                "limit" => limit = positive(raw),
                "search" | "query" => {
                    if !raw.is_empty() {
                        search = Some(raw.to_string());
                    }
                }
                "months" => {
                    for token in split_list(raw) {
                        months.push(MonthRange::parse(token)?);
                    }
                }
                "year" | "month" | "day" if scope == ListScope::Cancellation => {
                    let slot = match key {
                        "year" => &mut year,
                        "month" => &mut month,
                        _ => &mut day,
                    };
                    if !raw.is_empty() {
                        *slot = Some(raw.to_string());
                    }
                }
                other => {
                    let field = FilterField::from_param(other)
                        .ok_or_else(|| FilterError::UnknownField(other.to_string()))?;
                    if scope.is_pinned(field) {
                        continue;
                    }
                    let values: Vec<String> = split_list(raw)
                        .filter(|v| *v != "all")
                        .map(str::to_string)
                        .collect();
                    if !values.is_empty() {
                        wanted.entry(field).or_default().extend(values);
                    }
                }
            }
        }

        let mut filter = OrderFilter::new();
        for (field, value) in scope.pinned() {
            filter = filter.with_values(*field, [*value]);
        }
        for (field, values) in wanted {
            filter = filter.with_values(field, values);
        }
        if let Some(term) = search {
            filter = filter.with_search(term);
        }
        if !months.is_empty() {
            filter = filter.with_months(months);
        }
        if let Some(prefix) = closing_prefix(year, month, day)? {
            filter = filter.with_closing_prefix(prefix);
        }

        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        // Mongo takes the skip as a signed 64-bit integer.
        let in_range = (page - 1)
            .checked_mul(limit)
            .is_some_and(|skip| i64::try_from(skip).is_ok());
        if !in_range {
            return Err(FilterError::PageOutOfRange(page));
        }

        Ok(Self {
            scope,
            page,
            limit,
            filter,
        })
    }
}

fn positive(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().filter(|n| *n > 0)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// `yyyy`, `yyyy-mm` or `yyyy-mm-dd`; parts after a missing one are ignored.
fn closing_prefix(
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
) -> Result<Option<String>, FilterError> {
    let Some(year) = year else {
        return Ok(None);
    };
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Err(FilterError::BadDatePart("year", year));
    }
    let mut prefix = year;
    let Some(month) = month else {
        return Ok(Some(prefix));
    };
    prefix.push_str(&format!("-{:02}", bounded("month", &month, 12)?));
    if let Some(day) = day {
        prefix.push_str(&format!("-{:02}", bounded("day", &day, 31)?));
    }
    Ok(Some(prefix))
}

fn bounded(name: &'static str, raw: &str, max: u32) -> Result<u32, FilterError> {
    raw.parse::<u32>()
        .ok()
        .filter(|n| (1..=max).contains(n))
        .ok_or_else(|| FilterError::BadDatePart(name, raw.to_string()))
}

#[cfg(test)]
mod tests {
    use bson::Bson;
    use chrono::NaiveDate;

    use super::*;
    use crate::entities::order::{Flag, NewOrder, OrderStatus};

    fn order(reg: &str, opening: (i32, u32, u32)) -> Order {
        let opening = NaiveDate::from_ymd_opt(opening.0, opening.1, opening.2).unwrap();
        Order::from_new(NewOrder {
            entry_date: opening,
            entry_time: "10:00".into(),
            registration: reg.into(),
            enquiry_type: "Reservation".into(),
            opening_date: opening,
            closing_date: None,
            closing_time: None,
            sales_executive: "Jane Smith".into(),
            location: "Leeds".into(),
            customer: "Charles Babbage".into(),
            is_pct_sheet_received_within_time: None,
            pct_status: Some("Pending".into()),
            order_status: OrderStatus::Active,
            is_show_up: None,
            is_deal: None,
            reason_for_action: None,
            reason_detail: None,
            is_loss_deal: None,
        })
    }

    fn parse(scope: ListScope, q: &[(&str, &str)]) -> Result<ListRequest, FilterError> {
        ListRequest::parse(scope, q.iter().copied())
    }

    #[test]
    fn pagination_defaults_and_skip() {
        let req = parse(ListScope::All, &[]).unwrap();
        assert_eq!((req.page, req.limit, req.skip()), (1, 10, 0));

        let req = parse(ListScope::All, &[("page", "2"), ("limit", "10")]).unwrap();
        assert_eq!(req.skip(), 10);

        let req = parse(ListScope::All, &[("page", "0"), ("limit", "abc")]).unwrap();
        assert_eq!((req.page, req.limit), (1, 10));

        let req = parse(ListScope::All, &[("limit", "5000")]).unwrap();
        assert_eq!(req.limit, MAX_LIMIT);
    }

    #[test]
    fn huge_page_is_rejected() {
        let err = parse(ListScope::All, &[("page", "18446744073709551615"), ("limit", "10")])
            .unwrap_err();
        assert_eq!(err, FilterError::PageOutOfRange(u64::MAX));

        let last = (i64::MAX as u64) / 100 + 1;
        let (fits, overflows) = (last.to_string(), (last + 1).to_string());
        let req = parse(ListScope::All, &[("page", fits.as_str()), ("limit", "100")]).unwrap();
        assert!(req.skip() <= i64::MAX as u64);
        assert!(parse(ListScope::All, &[("page", overflows.as_str()), ("limit", "100")]).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = parse(ListScope::All, &[("$where", "1")]).unwrap_err();
        assert_eq!(err, FilterError::UnknownField("$where".into()));
        assert!(parse(ListScope::All, &[("year", "2024")]).is_err());
    }

    #[test]
    fn comma_values_become_in_match() {
        let req = parse(ListScope::All, &[("location", "Leeds, London"), ("isDeal", "Yes")]).unwrap();
        let d = req.filter.to_document();
        let and = d.get_array("$and").unwrap();
        assert_eq!(and.len(), 2);
        assert!(and.contains(&Bson::Document(doc! { "location": { "$in": ["Leeds", "London"] } })));
        assert!(and.contains(&Bson::Document(doc! { "isDeal": "Yes" })));
    }

    #[test]
    fn legacy_pct_param_and_all_are_accepted() {
        let req = parse(
            ListScope::All,
            &[("isPCTSheetReceivedWithinTime", "Yes"), ("isShowUp", "all")],
        )
        .unwrap();
        assert_eq!(
            req.filter.values(FilterField::IsPctSheetReceivedWithinTime),
            Some(&["Yes".to_string()][..])
        );
        assert_eq!(req.filter.values(FilterField::IsShowUp), None);
    }

    #[test]
    fn single_clause_is_not_wrapped() {
        let req = parse(ListScope::Active, &[]).unwrap();
        assert_eq!(req.filter.to_document(), doc! { "orderStatus": "Active" });
        assert_eq!(parse(ListScope::All, &[]).unwrap().filter.to_document(), doc! {});
    }

    #[test]
    fn scope_pins_override_client_values() {
        let req = parse(ListScope::Active, &[("orderStatus", "Inactive")]).unwrap();
        assert_eq!(
            req.filter.values(FilterField::OrderStatus),
            Some(&["Active".to_string()][..])
        );
        let req = parse(ListScope::Cancellation, &[("isDeal", "Yes")]).unwrap();
        assert!(!req.filter.allows(FilterField::IsDeal, "Yes"));
    }

    #[test]
    fn search_and_months_are_anded() {
        let req = parse(ListScope::All, &[("search", "a.b"), ("months", "Jan 2024,Feb 2024")]).unwrap();
        let d = req.filter.to_document();
        let and = d.get_array("$and").unwrap();
        assert_eq!(and.len(), 2);
        let search = and[0].as_document().unwrap().get_array("$or").unwrap();
        assert_eq!(search.len(), SEARCH_FIELDS.len());
        assert_eq!(
            search[0].as_document().unwrap(),
            &doc! { "entryTime": { "$regex": "a\\.b", "$options": "i" } }
        );
        let months = and[1].as_document().unwrap().get_array("$or").unwrap();
        assert_eq!(
            months[0].as_document().unwrap(),
            &doc! { "openingDate": { "$gte": "2024-01-01", "$lte": "2024-01-31" } }
        );
    }

    #[test]
    fn bad_month_is_an_error() {
        assert_eq!(
            parse(ListScope::All, &[("months", "Jan 2024,Smarch 2024")]).unwrap_err(),
            FilterError::BadMonth("Smarch 2024".into())
        );
    }

    #[test]
    fn closing_prefix_from_parts() {
        let req = parse(ListScope::Cancellation, &[("year", "2024"), ("month", "3"), ("day", "5")]).unwrap();
        let d = req.filter.to_document();
        let and = d.get_array("$and").unwrap();
        assert!(and.contains(&Bson::Document(doc! { "closingDate": { "$regex": "^2024-03-05" } })));

        let req = parse(ListScope::Cancellation, &[("month", "3")]).unwrap();
        assert_eq!(req.filter.values(FilterField::IsDeal), Some(&["No".to_string()][..]));
        assert!(parse(ListScope::Cancellation, &[("year", "24")]).is_err());
        assert!(parse(ListScope::Cancellation, &[("year", "2024"), ("month", "13")]).is_err());
    }

    #[test]
    fn matches_search_case_insensitively() {
        let o = order("AB12CDE", (2024, 1, 5));
        assert!(OrderFilter::new().with_search("ab12").matches(&o));
        assert!(OrderFilter::new().with_search("BABBAGE").matches(&o));
        assert!(OrderFilter::new().with_search("pend").matches(&o));
        assert!(!OrderFilter::new().with_search("zzz").matches(&o));
    }

    #[test]
    fn matches_months_inclusive() {
        let jan = vec![MonthRange::parse("Jan 2024").unwrap()];
        let f = OrderFilter::new().with_months(jan);
        assert!(f.matches(&order("A1", (2024, 1, 1))));
        assert!(f.matches(&order("A2", (2024, 1, 31))));
        assert!(!f.matches(&order("A3", (2024, 2, 1))));
        assert!(!f.matches(&order("A4", (2023, 12, 31))));
    }

    #[test]
    fn matches_fields_and_missing_values() {
        let mut o = order("A1", (2024, 1, 1));
        let f = OrderFilter::new().with_values(FilterField::IsDeal, ["Yes", "No"]);
        assert!(!f.matches(&o));
        o.is_deal = Some(Flag::No);
        assert!(f.matches(&o));
        assert!(!f.with_only(FilterField::IsDeal, "Yes").matches(&o));
    }

    #[test]
    fn outcome_filters_respect_existing_deal_filter() {
        let (sold, cancelled) = OrderFilter::new().outcome_filters();
        assert_eq!(sold.unwrap().values(FilterField::IsDeal), Some(&["Yes".to_string()][..]));
        assert!(cancelled.is_some());

        let only_yes = OrderFilter::new().with_values(FilterField::IsDeal, ["Yes"]);
        let (sold, cancelled) = only_yes.outcome_filters();
        assert!(sold.is_some());
        assert!(cancelled.is_none());
    }

    #[test]
    fn sort_orders() {
        let older = order("A1", (2024, 1, 1));
        let newer = order("A2", (2024, 2, 1));
        assert_eq!(SortOrder::OpeningDesc.compare(&newer, &older), Ordering::Less);
        let mut closed = older.clone();
        closed.closing_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(SortOrder::ClosingAsc.compare(&newer, &closed), Ordering::Less);
    }
}
