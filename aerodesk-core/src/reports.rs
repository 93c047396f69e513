use aerodesk_shared::Money;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::airline::Flight;
use crate::identity::{Principal, SessionContext};
use crate::repository::ReportRepository;
use crate::{CoreError, CoreResult};

const TOP_CUSTOMERS: i64 = 5;
const TOP_AGENTS: i64 = 5;
const TOP_DESTINATIONS: i64 = 3;

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Custom window from user input; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::validation(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        Self {
            start: today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    pub fn last_months(today: NaiveDate, months: u32) -> Self {
        Self {
            start: today.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Every `YYYY-MM` bucket the window touches, oldest first.
    pub fn months(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut cursor = self.start.with_day(1).unwrap_or(self.start);
        while cursor <= self.end {
            out.push(month_key(cursor));
            match cursor.checked_add_months(Months::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        out
    }
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    pub month: String,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    pub tickets_sold: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSummary {
    pub total_commission: Money,
    pub tickets_sold: i64,
    pub average_commission: Money,
}

impl CommissionSummary {
    pub fn from_totals(total_commission: Money, tickets_sold: i64) -> Self {
        Self {
            total_commission,
            tickets_sold,
            average_commission: total_commission.average(tickets_sold),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerTickets {
    pub email: String,
    pub name: Option<String>,
    pub tickets: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAmount {
    pub email: String,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTickets {
    pub email: String,
    pub booking_agent_id: i32,
    pub tickets_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAmount {
    pub email: String,
    pub booking_agent_id: i32,
    pub commission: Money,
}

/// Ticket revenue split by whether an agent was involved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    pub direct: Money,
    pub indirect: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub airport_name: String,
    pub airport_city: String,
    pub num_flights: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSpending {
    pub range: DateRange,
    pub total: Money,
    pub monthly: Vec<MonthlyAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingOverview {
    pub last_year_total: Money,
    pub last_six_months: Vec<MonthlyAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTopCustomers {
    pub by_tickets: Vec<CustomerTickets>,
    pub by_commission: Vec<CustomerAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopAgents {
    pub by_tickets_last_month: Vec<AgentTickets>,
    pub by_tickets_last_year: Vec<AgentTickets>,
    pub by_commission_last_year: Vec<AgentAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSales {
    pub range: DateRange,
    pub total: i64,
    pub monthly: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueComparison {
    pub last_month: RevenueSplit,
    pub last_year: RevenueSplit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDestinations {
    pub last_three_months: Vec<Destination>,
    pub last_year: Vec<Destination>,
}

/// Read-only dashboards. Windows are anchored at the `today` passed in and
/// include both ends.
pub struct ReportService {
    reports: Arc<dyn ReportRepository>,
}

impl ReportService {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }

    pub async fn spending_overview(&self, ctx: &SessionContext, today: NaiveDate) -> CoreResult<SpendingOverview> {
        let email = customer_email(ctx)?;
        let year = self
            .reports
            .customer_monthly_spending(email, &DateRange::last_months(today, 12))
            .await?;
        let six_months = DateRange::last_months(today, 6);
        let recent = self.reports.customer_monthly_spending(email, &six_months).await?;

        Ok(SpendingOverview {
            last_year_total: year.iter().map(|m| m.total).sum(),
            last_six_months: fill_amounts(&six_months, recent),
        })
    }

    pub async fn spending_between(&self, ctx: &SessionContext, range: DateRange) -> CoreResult<CustomerSpending> {
        let email = customer_email(ctx)?;
        let range = DateRange::new(range.start, range.end)?;
        let rows = self.reports.customer_monthly_spending(email, &range).await?;
        let total = rows.iter().map(|m| m.total).sum();
        Ok(CustomerSpending {
            range,
            total,
            monthly: fill_amounts(&range, rows),
        })
    }

    /// Last 30 days unless a custom window is given.
    pub async fn agent_commission(
        &self,
        ctx: &SessionContext,
        today: NaiveDate,
        range: Option<DateRange>,
    ) -> CoreResult<CommissionSummary> {
        let agent_id = agent_id(ctx)?;
        let range = match range {
            Some(r) => DateRange::new(r.start, r.end)?,
            None => DateRange::last_days(today, 30),
        };
        self.reports.agent_commission(agent_id, &range).await
    }

    pub async fn agent_top_customers(&self, ctx: &SessionContext, today: NaiveDate) -> CoreResult<AgentTopCustomers> {
        let agent_id = agent_id(ctx)?;
        let by_tickets = self
            .reports
            .agent_top_customers_by_tickets(agent_id, &DateRange::last_months(today, 6), TOP_CUSTOMERS)
            .await?;
        let by_commission = self
            .reports
            .agent_top_customers_by_commission(agent_id, &DateRange::last_months(today, 12), TOP_CUSTOMERS)
            .await?;
        Ok(AgentTopCustomers {
            by_tickets,
            by_commission,
        })
    }

    pub async fn top_agents(&self, ctx: &SessionContext, today: NaiveDate) -> CoreResult<TopAgents> {
        let airline = staff_airline(ctx)?;
        let month = DateRange::last_months(today, 1);
        let year = DateRange::last_months(today, 12);
        Ok(TopAgents {
            by_tickets_last_month: self.reports.top_agents_by_tickets(airline, &month, TOP_AGENTS).await?,
            by_tickets_last_year: self.reports.top_agents_by_tickets(airline, &year, TOP_AGENTS).await?,
            by_commission_last_year: self.reports.top_agents_by_commission(airline, &year, TOP_AGENTS).await?,
        })
    }

    pub async fn frequent_customers(&self, ctx: &SessionContext, today: NaiveDate) -> CoreResult<Vec<CustomerTickets>> {
        let airline = staff_airline(ctx)?;
        self.reports
            .frequent_customers(airline, &DateRange::last_months(today, 12), TOP_CUSTOMERS)
            .await
    }

    /// Flights a customer holds tickets for on the staff member's airline.
    pub async fn customer_flights(&self, ctx: &SessionContext, email: &str) -> CoreResult<Vec<Flight>> {
        let airline = staff_airline(ctx)?;
        self.reports.customer_flights_on_airline(airline, email).await
    }

    /// Last year unless a custom window is given.
    pub async fn ticket_sales(
        &self,
        ctx: &SessionContext,
        today: NaiveDate,
        range: Option<DateRange>,
    ) -> CoreResult<TicketSales> {
        let airline = staff_airline(ctx)?;
        let range = match range {
            Some(r) => DateRange::new(r.start, r.end)?,
            None => DateRange::last_months(today, 12),
        };
        let rows = self.reports.monthly_ticket_sales(airline, &range).await?;
        let total = rows.iter().map(|m| m.tickets_sold).sum();
        Ok(TicketSales {
            range,
            total,
            monthly: fill_counts(&range, rows),
        })
    }

    pub async fn revenue_comparison(&self, ctx: &SessionContext, today: NaiveDate) -> CoreResult<RevenueComparison> {
        let airline = staff_airline(ctx)?;
        Ok(RevenueComparison {
            last_month: self
                .reports
                .revenue_split(airline, &DateRange::last_months(today, 1))
                .await?,
            last_year: self
                .reports
                .revenue_split(airline, &DateRange::last_months(today, 12))
                .await?,
        })
    }

    pub async fn top_destinations(&self, ctx: &SessionContext, today: NaiveDate) -> CoreResult<TopDestinations> {
        let airline = staff_airline(ctx)?;
        Ok(TopDestinations {
            last_three_months: self
                .reports
                .top_destinations(airline, &DateRange::last_months(today, 3), TOP_DESTINATIONS)
                .await?,
            last_year: self
                .reports
                .top_destinations(airline, &DateRange::last_months(today, 12), TOP_DESTINATIONS)
                .await?,
        })
    }
}

fn customer_email(ctx: &SessionContext) -> CoreResult<&str> {
    match &ctx.principal {
        Principal::Customer { email } => Ok(email),
        _ => Err(CoreError::forbidden("This action requires the customer role")),
    }
}

fn agent_id(ctx: &SessionContext) -> CoreResult<i32> {
    match &ctx.principal {
        Principal::BookingAgent { booking_agent_id, .. } => Ok(*booking_agent_id),
        _ => Err(CoreError::forbidden("This action requires the booking_agent role")),
    }
}

fn staff_airline(ctx: &SessionContext) -> CoreResult<&str> {
    match &ctx.principal {
        Principal::AirlineStaff { airline_name, .. } => Ok(airline_name),
        _ => Err(CoreError::forbidden("This action requires the airline_staff role")),
    }
}

// Months without sales still get a bar in the chart.
fn fill_amounts(range: &DateRange, rows: Vec<MonthlyAmount>) -> Vec<MonthlyAmount> {
    range
        .months()
        .into_iter()
        .map(|month| {
            let total = rows.iter().filter(|r| r.month == month).map(|r| r.total).sum();
            MonthlyAmount { month, total }
        })
        .collect()
}

fn fill_counts(range: &DateRange, rows: Vec<MonthlyCount>) -> Vec<MonthlyCount> {
    range
        .months()
        .into_iter()
        .map(|month| {
            let tickets_sold = rows.iter().filter(|r| r.month == month).map(|r| r.tickets_sold).sum();
            MonthlyCount { month, tickets_sold }
        })
        .collect()
}
