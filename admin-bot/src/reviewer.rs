//! Simulated admin reviewing support tickets.
//!
//! Each cycle "opens" every ticket newest-first and writes its raw body to
//! the log, as a privileged browser would render it. Bodies containing
//! `<script>` get a warning, but they are rendered all the same.

use bank_common::SupportTicket;
use bank_server::{BankResult, Database};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ReviewerConfig {
    /// Pause between cycles
    pub interval: Duration,
    /// Per-ticket "reading time" is drawn from `min_delay..=max_delay`
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
        }
    }
}

impl ReviewerConfig {
    /// No per-ticket delay; handy in tests.
    pub fn immediate(interval: Duration) -> Self {
        Self {
            interval,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedTicket {
    pub id: i64,
    pub user_id: Option<i64>,
    pub flagged: bool,
}

#[derive(Debug, Clone)]
pub struct ReviewSummary {
    pub started_at: DateTime<Utc>,
    pub reviewed: Vec<ReviewedTicket>,
}

impl ReviewSummary {
    pub fn flagged_count(&self) -> usize {
        self.reviewed.iter().filter(|t| t.flagged).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub failed_cycles: u64,
}

/// Naive, bypassable check. Advisory only.
pub fn looks_like_script(body: &str) -> bool {
    body.to_lowercase().contains("<script>")
}

pub struct Reviewer {
    db: Arc<Database>,
    config: ReviewerConfig,
}

impl Reviewer {
    pub fn new(db: Arc<Database>, config: ReviewerConfig) -> Self {
        Self { db, config }
    }

    /// View every ticket once. Fails only when the tickets cannot be read.
    pub async fn review_cycle(&self) -> BankResult<ReviewSummary> {
        let started_at = Utc::now();
        let tickets = self.db.try_support_messages().await?;
        info!(count = tickets.len(), "Reviewing support messages");

        let mut reviewed = Vec::with_capacity(tickets.len());
        for ticket in &tickets {
            reviewed.push(self.view(ticket));

            let delay = self.review_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(ReviewSummary {
            started_at,
            reviewed,
        })
    }

    fn view(&self, ticket: &SupportTicket) -> ReviewedTicket {
        info!(
            ticket_id = ticket.id,
            user_id = ?ticket.user_id,
            "Admin viewing message: {}",
            ticket.message
        );

        let flagged = looks_like_script(&ticket.message);
        if flagged {
            warn!(ticket_id = ticket.id, "Possible XSS payload detected in support message");
        }

        ReviewedTicket {
            id: ticket.id,
            user_id: ticket.user_id,
            flagged,
        }
    }

    fn review_delay(&self) -> Duration {
        let (low, high) = if self.config.min_delay <= self.config.max_delay {
            (self.config.min_delay, self.config.max_delay)
        } else {
            (self.config.max_delay, self.config.min_delay)
        };
        if high.is_zero() {
            return Duration::ZERO;
        }
        rand::thread_rng().gen_range(low..=high)
    }

    /// Poll until `cancel` fires. A failed cycle is logged and the loop
    /// carries on after the usual interval.
    pub async fn run(&self, cancel: CancellationToken) -> RunStats {
        info!(interval = ?self.config.interval, "Admin bot started");
        let mut stats = RunStats::default();

        while !cancel.is_cancelled() {
            stats.cycles += 1;
            match self.review_cycle().await {
                Ok(summary) => info!(
                    reviewed = summary.reviewed.len(),
                    flagged = summary.flagged_count(),
                    "Review cycle complete"
                ),
                Err(e) => {
                    stats.failed_cycles += 1;
                    error!("Review cycle failed: {}", e);
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(cycles = stats.cycles, "Admin bot stopped");
        stats
    }
}
