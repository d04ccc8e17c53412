//! Core booking types for skybook.
//!
//! This module defines the persistent booking record, the transient per-user
//! draft that bridges the two-step booking form, and the raw form submissions
//! with their numeric parsing rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::TicketId;

/// A persisted flight booking.
///
/// All passenger-supplied fields are trusted free text at write time; only
/// `age` and `price` are coerced to integers when the forms are submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Generated public identifier for this booking.
    pub ticket_id: TicketId,
    /// Passenger name.
    pub name: String,
    /// Passenger age (unvalidated range).
    pub age: i64,
    /// Passport number (unvalidated format).
    pub passport: String,
    /// Departure country.
    pub from_country: String,
    /// Destination country.
    pub to_country: String,
    /// Travel class (free text, e.g. "Economy").
    pub category: String,
    /// Ticket price (currency unit implicit).
    pub price: i64,
    /// Departure date as entered (no format or chronology check).
    pub departure_date: String,
    /// Arrival date as entered.
    pub arrival_date: String,
}

impl Booking {
    /// Assemble a booking from a step-one draft and step-two travel details.
    #[must_use]
    pub fn from_parts(ticket_id: TicketId, draft: Draft, travel: TravelDetails) -> Self {
        Self {
            ticket_id,
            name: draft.name,
            age: draft.age,
            passport: draft.passport,
            from_country: draft.from_country,
            to_country: draft.to_country,
            category: travel.category,
            price: travel.price,
            departure_date: travel.departure_date,
            arrival_date: travel.arrival_date,
        }
    }
}

/// Step-one booking state, held per user until step two completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Passenger name.
    pub name: String,
    /// Passenger age.
    pub age: i64,
    /// Passport number.
    pub passport: String,
    /// Departure country.
    pub from_country: String,
    /// Destination country.
    pub to_country: String,
}

/// Parsed step-two fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelDetails {
    /// Travel class.
    pub category: String,
    /// Ticket price.
    pub price: i64,
    /// Departure date as entered.
    pub departure_date: String,
    /// Arrival date as entered.
    pub arrival_date: String,
}

/// Errors produced while converting a form submission.
///
/// These are recovered locally: the offending submission is rejected with a
/// user-visible message and no state is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A numeric field contained non-numeric input.
    #[error("{field} must be a whole number (got {value:?})")]
    NotANumber {
        /// Label of the offending field.
        field: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },

    /// The submission arrived with the wrong number of values.
    #[error("form submitted with {got} values, expected {expected}")]
    FieldCount {
        /// Number of values the form defines.
        expected: usize,
        /// Number of values received.
        got: usize,
    },
}

/// Raw step-one form submission (basic passenger details).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicDetailsForm {
    /// Passenger name.
    pub name: String,
    /// Age as entered.
    pub age: String,
    /// Passport number.
    pub passport: String,
    /// Departure country.
    pub from_country: String,
    /// Destination country.
    pub to_country: String,
}

impl BasicDetailsForm {
    /// Number of fields in this form.
    pub const FIELD_COUNT: usize = 5;

    /// Build the form from positional values as delivered by the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::FieldCount`] if the value count is wrong.
    pub fn from_values(values: &[String]) -> Result<Self, FormError> {
        match values {
            [name, age, passport, from_country, to_country] => Ok(Self {
                name: name.clone(),
                age: age.clone(),
                passport: passport.clone(),
                from_country: from_country.clone(),
                to_country: to_country.clone(),
            }),
            _ => Err(FormError::FieldCount {
                expected: Self::FIELD_COUNT,
                got: values.len(),
            }),
        }
    }

    /// Parse the raw submission into a draft.
    ///
    /// The whole submission fails if `age` is not an integer; no draft is
    /// created in that case.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NotANumber`] for non-numeric age input.
    pub fn parse(self) -> Result<Draft, FormError> {
        let age = parse_integer("age", &self.age)?;
        Ok(Draft {
            name: self.name,
            age,
            passport: self.passport,
            from_country: self.from_country,
            to_country: self.to_country,
        })
    }
}

/// Raw step-two form submission (additional booking details).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelDetailsForm {
    /// Travel class as entered.
    pub category: String,
    /// Price as entered.
    pub price: String,
    /// Departure date as entered.
    pub departure_date: String,
    /// Arrival date as entered.
    pub arrival_date: String,
}

impl TravelDetailsForm {
    /// Number of fields in this form.
    pub const FIELD_COUNT: usize = 4;

    /// Build the form from positional values as delivered by the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::FieldCount`] if the value count is wrong.
    pub fn from_values(values: &[String]) -> Result<Self, FormError> {
        match values {
            [category, price, departure_date, arrival_date] => Ok(Self {
                category: category.clone(),
                price: price.clone(),
                departure_date: departure_date.clone(),
                arrival_date: arrival_date.clone(),
            }),
            _ => Err(FormError::FieldCount {
                expected: Self::FIELD_COUNT,
                got: values.len(),
            }),
        }
    }

    /// Parse the raw submission into travel details.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NotANumber`] for non-numeric price input.
    pub fn parse(self) -> Result<TravelDetails, FormError> {
        let price = parse_integer("price", &self.price)?;
        Ok(TravelDetails {
            category: self.category,
            price,
            departure_date: self.departure_date,
            arrival_date: self.arrival_date,
        })
    }
}

fn parse_integer(field: &'static str, value: &str) -> Result<i64, FormError> {
    value
        .trim()
        .parse()
        .map_err(|_| FormError::NotANumber {
            field,
            value: value.to_string(),
        })
}
