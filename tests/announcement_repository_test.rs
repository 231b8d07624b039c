use campus_connect::{
    domain::{demo_announcements, utc_date, Attachment, AnnouncementPatch, Priority},
    repository::{AnnouncementRepository, AnnouncementStore, SqliteAnnouncementRepository},
    service::AnnouncementService,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::Arc;

async fn pool() -> anyhow::Result<SqlitePool> {
    // A single connection so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

#[tokio::test]
async fn test_announcement_crud() -> anyhow::Result<()> {
    let repo = SqliteAnnouncementRepository::new(pool().await?);
    assert!(repo.load_all().await?.is_empty());

    let store = AnnouncementStore::with_inputs(demo_announcements());
    let mut first = store.snapshot().announcements[0].clone();
    first.attachments = Some(vec![Attachment {
        name: "schedule.pdf".to_string(),
        url: "https://example.edu/schedule.pdf".to_string(),
    }]);
    repo.save(&first).await?;

    let loaded = repo.load_all().await?;
    assert_eq!(loaded, vec![first.clone()]);

    // Upsert keeps the row and never lowers the stored view count
    first.views = 5;
    first.priority = Priority::Urgent;
    repo.save(&first).await?;
    first.views = 2;
    repo.save(&first).await?;

    let loaded = repo.load_all().await?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].views, 5);
    assert_eq!(loaded[0].priority, Priority::Urgent);

    repo.delete(first.id).await?;
    assert!(repo.load_all().await?.is_empty());

    // Deleting twice is harmless
    repo.delete(first.id).await?;

    Ok(())
}

#[tokio::test]
async fn test_expiry_and_clearing_round_trip() -> anyhow::Result<()> {
    let repo = SqliteAnnouncementRepository::new(pool().await?);
    let store = AnnouncementStore::with_inputs(demo_announcements());
    let id = store.snapshot().announcements[1].id;

    let with_expiry = store.get(id).unwrap();
    assert_eq!(with_expiry.expiry_date, Some(utc_date(2024, 12, 15)));
    repo.save(&with_expiry).await?;
    assert_eq!(repo.load_all().await?[0].expiry_date, Some(utc_date(2024, 12, 15)));

    store.update(id, AnnouncementPatch {
        expiry_date: Some(None),
        ..Default::default()
    });
    repo.save(&store.get(id).unwrap()).await?;
    assert_eq!(repo.load_all().await?[0].expiry_date, None);

    Ok(())
}

#[tokio::test]
async fn test_bootstrap_reloads_in_seeded_order() -> anyhow::Result<()> {
    let pool = pool().await?;
    let repo: Arc<dyn AnnouncementRepository> = Arc::new(SqliteAnnouncementRepository::new(pool.clone()));

    let seeded = AnnouncementService::bootstrap(Some(repo.clone()), true).await?;
    let created = seeded
        .add(demo_announcements().remove(0))
        .await?;
    let expected: Vec<_> = seeded
        .store()
        .snapshot()
        .announcements
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(expected[0], created.id);

    let reloaded = AnnouncementService::bootstrap(Some(repo), true).await?;
    let ids: Vec<_> = reloaded
        .store()
        .snapshot()
        .announcements
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, expected);

    Ok(())
}
