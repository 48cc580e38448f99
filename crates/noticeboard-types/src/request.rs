use crate::{MessageId, MessageStatus, TenantId, TypesError};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Full message payload used for both create and update
///
/// Updates replace every field; there is no partial patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    #[validate(length(min = 1, max = 25))]
    pub title: String,

    #[validate(length(min = 1, max = 50))]
    pub content: String,

    #[validate(length(min = 1, max = 50))]
    pub category: String,

    #[validate(length(min = 1))]
    pub big_content: String,

    #[validate(length(min = 1), custom(function = "validate_tenant_ids"))]
    pub introducer_ids: Vec<String>,
}

fn validate_tenant_ids(ids: &[String]) -> Result<(), ValidationError> {
    match ids.iter().find(|id| TenantId::new(id.as_str()).is_err()) {
        Some(bad) => {
            let mut err = ValidationError::new("tenant_id");
            err.add_param("value".into(), bad);
            Err(err)
        }
        None => Ok(()),
    }
}

impl MessageDraft {
    /// Introducer ids as a de-duplicated tenant set, first occurrence wins
    pub fn introducers(&self) -> Result<Vec<TenantId>, TypesError> {
        let mut out: Vec<TenantId> = Vec::with_capacity(self.introducer_ids.len());
        for raw in &self.introducer_ids {
            let id = TenantId::new(raw.as_str())?;
            if !out.contains(&id) {
                out.push(id);
            }
        }
        Ok(out)
    }
}

/// One element of a bulk status update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: MessageId,
    pub status: MessageStatus,
}

/// One element of a bulk delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub message_id: MessageId,
    #[serde(default, alias = "delete")]
    pub hard_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusOutcome {
    pub id: MessageId,
    pub status: MessageStatus,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub id: MessageId,
    pub hard_delete: bool,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_errors;

    fn draft() -> MessageDraft {
        MessageDraft {
            title: "Standup".into(),
            content: "moved to 10:30".into(),
            category: "important".into(),
            big_content: "The daily standup is moved to 10:30 for this week.".into(),
            introducer_ids: vec!["bob".into(), "carol".into(), "bob".into()],
        }
    }

    #[test]
    fn test_valid_draft() {
        let draft = draft();
        assert!(draft.validate().is_ok());
        let ids: Vec<String> = draft
            .introducers()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, vec!["bob", "carol"]);
    }

    #[test]
    fn test_title_length_counts_characters() {
        let mut d = draft();
        d.title = "消".repeat(25);
        assert!(d.validate().is_ok());
        d.title = "消".repeat(26);
        let errors = field_errors(&d.validate().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
        assert_eq!(errors[0].constraint, "length");
        assert!(errors[0].param.contains("max=25"));
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let d = MessageDraft {
            title: String::new(),
            content: String::new(),
            category: "x".into(),
            big_content: String::new(),
            introducer_ids: vec![],
        };
        let fields: Vec<String> = field_errors(&d.validate().unwrap_err())
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec!["big_content", "content", "introducer_ids", "title"]
        );
    }

    #[test]
    fn test_introducer_with_separator_rejected() {
        let mut d = draft();
        d.introducer_ids = vec!["bob,eve".into()];
        let errors = field_errors(&d.validate().unwrap_err());
        assert_eq!(errors[0].constraint, "tenant_id");
    }

    #[test]
    fn test_bulk_payloads_deserialize() {
        let change: StatusChange =
            serde_json::from_str(r#"{"id":"7e55cb38290f49ee2b0e9cfd2adf13e4","status":1}"#)
                .unwrap();
        assert_eq!(change.status, MessageStatus::Read);

        let delete: DeleteRequest = serde_json::from_str(
            r#"{"messageId":"7e55cb38290f49ee2b0e9cfd2adf13e4","delete":true}"#,
        )
        .unwrap();
        assert!(delete.hard_delete);

        assert!(serde_json::from_str::<StatusChange>(r#"{"id":"short","status":1}"#).is_err());
    }

    #[test]
    fn test_delete_outcome_shape() {
        let outcome = DeleteOutcome {
            id: MessageId::parse("7e55cb38290f49ee2b0e9cfd2adf13e4").unwrap(),
            hard_delete: true,
            success: false,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["hardDelete"], true);
        assert_eq!(json["success"], false);
    }
}
