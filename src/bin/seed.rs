use campus_connect::{
    domain::{demo_board, Announcement, AnnouncementInput, Category, Priority},
    repository::{AnnouncementRepository, AnnouncementStore, SqliteAnnouncementRepository},
};
use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{lorem::en::{Paragraph, Sentence}, name::en::Name},
    Fake,
};
use rand::{seq::SliceRandom, Rng};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "Seed the announcement board database")]
struct Args {
    /// SQLite connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://campus-connect.db?mode=rwc")]
    database_url: String,

    /// Extra generated announcements on top of the demo set
    #[arg(long, default_value_t = 0)]
    fake: usize,
}

const PRIORITIES: [Priority; 4] = [Priority::Low, Priority::Normal, Priority::High, Priority::Urgent];

fn fake_announcement(rng: &mut impl Rng) -> AnnouncementInput {
    let posted_date = Utc::now() - Duration::days(rng.gen_range(0..30));
    let expiry_date = rng
        .gen_bool(0.3)
        .then(|| posted_date + Duration::days(rng.gen_range(1..60)));

    AnnouncementInput {
        title: Sentence(3..7).fake_with_rng(rng),
        content: Paragraph(2..4).fake_with_rng(rng),
        category: *Category::ALL.choose(rng).unwrap_or(&Category::General),
        priority: *PRIORITIES.choose(rng).unwrap_or(&Priority::Normal),
        posted_by: Name().fake_with_rng(rng),
        posted_date,
        expiry_date,
        image_url: None,
        attachments: None,
        is_active: rng.gen_bool(0.85),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!("🌱 Starting database seeding...");

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let repo = SqliteAnnouncementRepository::new(db_pool);

    let mut board = demo_board();
    let mut rng = rand::thread_rng();
    board.extend(
        (0..args.fake).map(|_| Announcement::from_input(Uuid::new_v4(), fake_announcement(&mut rng))),
    );

    println!("📢 Creating announcements...");
    let store = AnnouncementStore::from_announcements(board);
    let snapshot = store.snapshot();
    // Newest rows load first, so insert back to front.
    for announcement in snapshot.announcements.iter().rev() {
        repo.save(announcement).await?;
    }
    println!("  ✅ Created {} announcements ({} generated)", snapshot.announcements.len(), args.fake);

    println!("\n✨ Database seeding complete!");
    Ok(())
}
