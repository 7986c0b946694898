use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Homepage hero banner with an optional active window.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "banners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_path: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the banner should be shown at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(starts) = self.starts_at {
            if now < starts {
                return false;
            }
        }
        if let Some(ends) = self.ends_at {
            if now > ends {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn banner(active: bool, starts: Option<i64>, ends: Option<i64>) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            title: "Summer sale".into(),
            subtitle: None,
            image_path: "uploads/banners/summer.jpg".into(),
            link_url: None,
            position: 0,
            is_active: active,
            starts_at: starts.map(|h| now + Duration::hours(h)),
            ends_at: ends.map(|h| now + Duration::hours(h)),
            created_at: now,
        }
    }

    #[test]
    fn active_window_is_respected() {
        let now = Utc::now();
        assert!(banner(true, None, None).is_live(now));
        assert!(banner(true, Some(-1), Some(1)).is_live(now));
        assert!(!banner(true, Some(1), None).is_live(now));
        assert!(!banner(true, None, Some(-1)).is_live(now));
        assert!(!banner(false, None, None).is_live(now));
    }
}
