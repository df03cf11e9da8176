// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFormInput {
    pub first_name: String,
    pub last_name: String,
    pub reason: String,
    pub scheduled_at: OffsetDateTime,
}

impl BookingFormInput {
    pub fn validate(&self, now: OffsetDateTime) -> Result<()> {
        if self.first_name.trim().is_empty() {
            bail!("first name is required -- enter a first name and retry");
        }
        if self.last_name.trim().is_empty() {
            bail!("last name is required -- enter a last name and retry");
        }
        if self.reason.trim().is_empty() {
            bail!("consultation reason is required -- enter a reason and retry");
        }
        if self.scheduled_at <= now {
            bail!("consultation must be scheduled in the future");
        }
        Ok(())
    }
}
