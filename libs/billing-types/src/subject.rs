use serde::{Deserialize, Serialize};

/// The owner of a subscription or payment record.
///
/// Produced once per webhook event from customer metadata and consumed
/// exhaustively by the projectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Individual {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Team {
        #[serde(rename = "teamId")]
        team_id: String,
    },
}

impl Subject {
    pub fn individual(user_id: impl Into<String>) -> Self {
        Self::Individual {
            user_id: user_id.into(),
        }
    }

    pub fn team(team_id: impl Into<String>) -> Self {
        Self::Team {
            team_id: team_id.into(),
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Individual { .. } => SubjectKind::User,
            Self::Team { .. } => SubjectKind::Team,
        }
    }

    /// The user id or team id, depending on the variant.
    pub fn id(&self) -> &str {
        match self {
            Self::Individual { user_id } => user_id,
            Self::Team { team_id } => team_id,
        }
    }

    pub fn is_team(&self) -> bool {
        matches!(self, Self::Team { .. })
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    User,
    Team,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Team => "team",
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
