//! Noticeboard Types - Core types for the noticeboard service
//!
//! This module defines the data types shared by the persistence layer and the
//! HTTP gateway: identifiers, the message record, request payloads and the
//! per-item outcome records returned by bulk mutations.

mod column;
mod error;
mod message;
mod request;
mod tenant;
mod validation;

pub use column::{Column, SortDirection};
pub use error::TypesError;
pub use message::{Message, MessageId, MessageStatus};
pub use request::{DeleteOutcome, DeleteRequest, MessageDraft, StatusChange, StatusOutcome};
pub use tenant::TenantId;
pub use validation::{field_errors, FieldError};
