use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub priority: Priority,
    pub posted_by: String,
    pub posted_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub is_active: bool,
    pub views: u64,
}

impl Announcement {
    /// A fresh record with zero views.
    pub fn from_input(id: Uuid, input: AnnouncementInput) -> Self {
        Self {
            id,
            title: input.title,
            content: input.content,
            category: input.category,
            priority: input.priority,
            posted_by: input.posted_by,
            posted_date: input.posted_date,
            expiry_date: input.expiry_date,
            image_url: input.image_url,
            attachments: input.attachments,
            is_active: input.is_active,
            views: 0,
        }
    }

    /// Active means flagged active and not yet expired at `as_of`.
    pub fn is_active_at(&self, as_of: DateTime<Utc>) -> bool {
        self.is_active && self.expiry_date.map_or(true, |expiry| expiry > as_of)
    }

    /// Shallow-merge a patch. `id` is never touched and `views` only moves up.
    pub fn apply(&mut self, patch: AnnouncementPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(posted_by) = patch.posted_by {
            self.posted_by = posted_by;
        }
        if let Some(posted_date) = patch.posted_date {
            self.posted_date = posted_date;
        }
        if let Some(expiry_date) = patch.expiry_date {
            self.expiry_date = expiry_date;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = image_url;
        }
        if let Some(attachments) = patch.attachments {
            self.attachments = attachments;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        if let Some(views) = patch.views {
            self.views = self.views.max(views);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Academic,
    Event,
    Urgent,
    Maintenance,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::Academic,
        Category::Event,
        Category::Urgent,
        Category::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Academic => "academic",
            Category::Event => "event",
            Category::Urgent => "urgent",
            Category::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Category::General),
            "academic" => Ok(Category::Academic),
            "event" => Ok(Category::Event),
            "urgent" => Ok(Category::Urgent),
            "maintenance" => Ok(Category::Maintenance),
            other => Err(format!("Invalid category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Sort rank: urgent first, low last.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("Invalid priority: {}", other)),
        }
    }
}

/// Everything the store needs to create an announcement. The store assigns
/// `id` and starts `views` at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementInput {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub priority: Priority,
    pub posted_by: String,
    pub posted_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
    pub is_active: bool,
}

/// Partial update. For the optional fields, `Some(None)` clears the value
/// and an absent key leaves it alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AnnouncementPatch {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub posted_by: Option<String>,
    #[serde(default)]
    pub posted_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub expiry_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub attachments: Option<Option<Vec<Attachment>>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub views: Option<u64>,
}

impl AnnouncementPatch {
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.content = self.content.map(|c| c.trim().to_string());
        self
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementStats {
    pub total: usize,
    pub active: usize,
    pub total_views: u64,
}

impl AnnouncementStats {
    pub fn from_announcements(announcements: &[Announcement]) -> Self {
        Self {
            total: announcements.len(),
            active: announcements.iter().filter(|a| a.is_active).count(),
            total_views: announcements.iter().map(|a| a.views).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, announcement: &Announcement) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => announcement.category == *category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") || s.trim().is_empty() {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

/// Priority rank ascending, then newest first.
pub fn compare_for_display(a: &Announcement, b: &Announcement) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| b.posted_date.cmp(&a.posted_date))
}

/// The active set at `as_of`, in display order. `sort_by` is stable so
/// remaining ties keep their collection order.
pub fn active_sorted(announcements: &[Announcement], as_of: DateTime<Utc>) -> Vec<Announcement> {
    let mut active: Vec<Announcement> = announcements
        .iter()
        .filter(|a| a.is_active_at(as_of))
        .cloned()
        .collect();
    active.sort_by(compare_for_display);
    active
}

/// Active-flagged entries of one category in collection order. Expiry is
/// not considered here.
pub fn by_category(announcements: &[Announcement], category: Category) -> Vec<Announcement> {
    announcements
        .iter()
        .filter(|a| a.is_active && a.category == category)
        .cloned()
        .collect()
}

/// The four announcements the portal ships with when nothing is persisted.
pub fn demo_announcements() -> Vec<AnnouncementInput> {
    vec![
        AnnouncementInput {
            title: "Welcome to Campus Connect+".to_string(),
            content: "We are excited to launch our new campus management system. Stay tuned for updates and announcements!".to_string(),
            category: Category::General,
            priority: Priority::High,
            posted_by: "Admin".to_string(),
            posted_date: utc_date(2024, 11, 20),
            expiry_date: None,
            image_url: None,
            attachments: None,
            is_active: true,
        },
        AnnouncementInput {
            title: "Library Hours Extended".to_string(),
            content: "The university library will now be open until 10 PM on weekdays to accommodate students during finals week.".to_string(),
            category: Category::Academic,
            priority: Priority::Normal,
            posted_by: "Library Department".to_string(),
            posted_date: utc_date(2024, 11, 22),
            expiry_date: Some(utc_date(2024, 12, 15)),
            image_url: None,
            attachments: None,
            is_active: true,
        },
        AnnouncementInput {
            title: "Campus Maintenance Notice".to_string(),
            content: "The IT department will conduct system maintenance on November 28. Some services may be temporarily unavailable from 2 AM to 6 AM.".to_string(),
            category: Category::Maintenance,
            priority: Priority::Urgent,
            posted_by: "IT Department".to_string(),
            posted_date: utc_date(2024, 11, 25),
            expiry_date: Some(utc_date(2024, 11, 28)),
            image_url: None,
            attachments: None,
            is_active: true,
        },
        AnnouncementInput {
            title: "Sports Fest 2024".to_string(),
            content: "Join us for the annual MinSU Sports Fest! Registration is now open for all students. Various sports competitions will be held from December 5-10.".to_string(),
            category: Category::Event,
            priority: Priority::Normal,
            posted_by: "Sports Committee".to_string(),
            posted_date: utc_date(2024, 11, 23),
            expiry_date: Some(utc_date(2024, 12, 10)),
            image_url: None,
            attachments: None,
            is_active: true,
        },
    ]
}

const DEMO_VIEWS: [u64; 4] = [45, 128, 89, 234];

/// The demo set as stored records, carrying the view counts it ships with.
pub fn demo_board() -> Vec<Announcement> {
    demo_announcements()
        .into_iter()
        .zip(DEMO_VIEWS)
        .map(|(input, views)| Announcement {
            views,
            ..Announcement::from_input(Uuid::new_v4(), input)
        })
        .collect()
}

pub fn utc_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announcement(priority: Priority, posted: DateTime<Utc>) -> Announcement {
        Announcement {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            content: "c".to_string(),
            category: Category::General,
            priority,
            posted_by: "Admin".to_string(),
            posted_date: posted,
            expiry_date: None,
            image_url: None,
            attachments: None,
            is_active: true,
            views: 0,
        }
    }

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Urgent.rank() < Priority::High.rank());
        assert!(Priority::High.rank() < Priority::Normal.rank());
        assert!(Priority::Normal.rank() < Priority::Low.rank());
    }

    #[test]
    fn test_parse_category_and_filter() {
        assert_eq!("Academic".parse::<Category>(), Ok(Category::Academic));
        assert!("news".parse::<Category>().is_err());
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!(
            "event".parse::<CategoryFilter>(),
            Ok(CategoryFilter::Only(Category::Event))
        );
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let as_of = utc_date(2024, 11, 28);
        let mut a = announcement(Priority::Normal, utc_date(2024, 11, 1));
        a.expiry_date = Some(as_of);
        assert!(!a.is_active_at(as_of));
        a.expiry_date = Some(as_of + chrono::Duration::seconds(1));
        assert!(a.is_active_at(as_of));
    }

    #[test]
    fn test_active_sorted_keeps_collection_order_on_full_ties() {
        let posted = utc_date(2024, 11, 20);
        let first = announcement(Priority::High, posted);
        let second = announcement(Priority::High, posted);
        let items = vec![first.clone(), second.clone()];

        let sorted = active_sorted(&items, utc_date(2024, 11, 21));
        assert_eq!(sorted[0].id, first.id);
        assert_eq!(sorted[1].id, second.id);
    }

    #[test]
    fn test_patch_never_lowers_views() {
        let mut a = announcement(Priority::Low, utc_date(2024, 11, 20));
        a.views = 10;
        a.apply(AnnouncementPatch {
            views: Some(3),
            ..Default::default()
        });
        assert_eq!(a.views, 10);
        a.apply(AnnouncementPatch {
            views: Some(12),
            ..Default::default()
        });
        assert_eq!(a.views, 12);
    }

    #[test]
    fn test_patch_can_clear_optional_fields() {
        let patch: AnnouncementPatch =
            serde_json::from_str(r#"{"expiry_date": null, "title": "New"}"#).unwrap();
        assert_eq!(patch.expiry_date, Some(None));
        assert_eq!(patch.image_url, None);

        let mut a = announcement(Priority::Low, utc_date(2024, 11, 20));
        a.expiry_date = Some(utc_date(2024, 12, 1));
        let id = a.id;
        a.apply(patch);
        assert_eq!(a.expiry_date, None);
        assert_eq!(a.title, "New");
        assert_eq!(a.id, id);
    }

    #[test]
    fn test_demo_board_carries_view_counts() {
        let board = demo_board();
        let views: Vec<u64> = board.iter().map(|a| a.views).collect();
        assert_eq!(views, vec![45, 128, 89, 234]);
        assert_eq!(AnnouncementStats::from_announcements(&board).total_views, 496);
        assert_eq!(board[0].title, "Welcome to Campus Connect+");
    }

    #[test]
    fn test_stats() {
        let mut a = announcement(Priority::Low, utc_date(2024, 11, 20));
        a.views = 4;
        let mut b = announcement(Priority::Low, utc_date(2024, 11, 21));
        b.views = 6;
        b.is_active = false;

        let stats = AnnouncementStats::from_announcements(&[a, b]);
        assert_eq!(stats, AnnouncementStats { total: 2, active: 1, total_views: 10 });
    }
}
