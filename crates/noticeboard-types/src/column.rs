use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Message columns a caller may filter or sort on
///
/// This is the whole allow-list: every column name that reaches query text
/// comes from [`Column::as_sql`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    #[default]
    CreatedAt,
    UpdatedAt,
    SenderIds,
    Title,
    Content,
    Category,
    BigContent,
    IntroducerIds,
    Status,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::CreatedAt,
        Column::UpdatedAt,
        Column::SenderIds,
        Column::Title,
        Column::Content,
        Column::Category,
        Column::BigContent,
        Column::IntroducerIds,
        Column::Status,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            Column::CreatedAt => "created_at",
            Column::UpdatedAt => "updated_at",
            Column::SenderIds => "sender_ids",
            Column::Title => "title",
            Column::Content => "content",
            Column::Category => "category",
            Column::BigContent => "big_content",
            Column::IntroducerIds => "introducer_ids",
            Column::Status => "status",
        }
    }

    /// Space separated list of accepted names, for error reporting
    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_sql())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromStr for Column {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_sql() == s)
            .ok_or_else(|| TypesError::UnknownColumn(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(TypesError::UnknownDirection(other.to_string())),
        }
    }
}
