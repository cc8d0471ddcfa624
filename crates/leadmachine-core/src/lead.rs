//! Lead records as stored by the record store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeadSource {
    #[serde(rename = "Incoming Call")]
    IncomingCall,
    #[serde(rename = "Website Form")]
    WebsiteForm,
    #[serde(rename = "Webhook")]
    Webhook,
    #[serde(rename = "Manual")]
    Manual,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomingCall => "Incoming Call",
            Self::WebsiteForm => "Website Form",
            Self::Webhook => "Webhook",
            Self::Manual => "Manual",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown lead source: {0:?}")]
pub struct UnknownLeadSource(pub String);

impl FromStr for LeadSource {
    type Err = UnknownLeadSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Incoming Call" => Ok(Self::IncomingCall),
            "Website Form" => Ok(Self::WebsiteForm),
            "Webhook" => Ok(Self::Webhook),
            "Manual" => Ok(Self::Manual),
            other => Err(UnknownLeadSource(other.to_string())),
        }
    }
}

/// A stored lead.
///
/// `source_conversation_id` is unique across the store when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub source: LeadSource,
    pub source_conversation_id: Option<String>,
    /// Call summary for `Incoming Call` leads.
    pub issue_description: Option<String>,
}

impl LeadRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A lead that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub source: LeadSource,
    pub source_conversation_id: Option<String>,
    pub issue_description: Option<String>,
}

impl NewLead {
    /// Attach a store-assigned id.
    pub fn into_record(self, id: i64) -> LeadRecord {
        LeadRecord {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            source: self.source,
            source_conversation_id: self.source_conversation_id,
            issue_description: self.issue_description,
        }
    }
}
