use clap::Parser;
use snapspot_dal::{
    category::{CategoryRepository, CreateCategory},
    spot::{CreateSpot, SpotRepository},
};
use snapspot_types::config::BackendConfig;
use tracing::info;

use crate::commands::Executor;

struct PredefinedSpot {
    name: &'static str,
    description: &'static str,
    address: &'static str,
    latitude: f64,
    longitude: f64,
    image_urls: &'static [&'static str],
    categories: &'static [&'static str],
}

const SAN_FRANCISCO_SPOTS: &[PredefinedSpot] = &[
    PredefinedSpot {
        name: "Golden Gate Bridge",
        description: "Iconic suspension bridge with stunning views of the bay and city skyline. Perfect for sunrise and sunset photography.",
        address: "Golden Gate Bridge, San Francisco, CA",
        latitude: 37.8199,
        longitude: -122.4783,
        image_urls: &[
            "https://images.unsplash.com/photo-1501594907352-04cda38ebc29",
            "https://images.unsplash.com/photo-1534050359320-02900022671e",
        ],
        categories: &["Landmarks", "Scenic Views", "Outdoors"],
    },
    PredefinedSpot {
        name: "Painted Ladies",
        description: "Row of colorful Victorian houses with the city skyline in the background. Best photographed from Alamo Square Park.",
        address: "Steiner St & Hayes St, San Francisco, CA 94117",
        latitude: 37.7759,
        longitude: -122.4332,
        image_urls: &[
            "https://images.unsplash.com/photo-1580740135578-6c7f0f988291",
            "https://images.unsplash.com/photo-1569388330292-79cc1ec67270",
        ],
        categories: &["Architecture", "Historic", "Urban"],
    },
    PredefinedSpot {
        name: "Palace of Fine Arts",
        description: "Beautiful Beaux-Arts monument with a stunning dome and reflecting pool. Popular for wedding and fashion photography.",
        address: "3601 Lyon St, San Francisco, CA 94123",
        latitude: 37.8029,
        longitude: -122.4484,
        image_urls: &[
            "https://images.unsplash.com/photo-1549346155-7b5d5f0e1c3a",
            "https://images.unsplash.com/photo-1566792066681-6dc1e79b3a0b",
        ],
        categories: &["Architecture", "Historic", "Romantic"],
    },
    PredefinedSpot {
        name: "Lombard Street",
        description: "Famous winding street with eight hairpin turns and beautiful flower gardens. Great for unique urban photography.",
        address: "Lombard St, San Francisco, CA 94133",
        latitude: 37.8021,
        longitude: -122.4186,
        image_urls: &[
            "https://images.unsplash.com/photo-1551191886-b761cd1aef93",
            "https://images.unsplash.com/photo-1571169755236-22da7e39d61b",
        ],
        categories: &["Urban", "Unique", "Architecture"],
    },
    PredefinedSpot {
        name: "Twin Peaks",
        description: "Elevated viewpoint offering panoramic views of the city and bay. Perfect for sunset and night photography.",
        address: "501 Twin Peaks Blvd, San Francisco, CA 94114",
        latitude: 37.7544,
        longitude: -122.4477,
        image_urls: &["https://images.unsplash.com/photo-1521464302861-ce943915d1c3"],
        categories: &["Scenic Views", "Outdoors"],
    },
];

#[derive(Parser, Debug)]
pub struct SeedSpotsCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(
        long,
        help = "Name recorded as the creator of the seeded spots",
        default_value = "seed"
    )]
    created_by: String,
}

impl Executor for SeedSpotsCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = snapspot_dal::new_pool(&self.backend.database_url()).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;

        let categories = CategoryRepository::new(pool.clone());
        let spots = SpotRepository::new(pool.clone());

        let mut created = 0;
        let mut skipped = 0;
        for spot in SAN_FRANCISCO_SPOTS {
            let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM spot WHERE name = ?")
                .bind(spot.name)
                .fetch_optional(&pool)
                .await?;
            if existing.is_some() {
                skipped += 1;
                continue;
            }

            let mut category_ids = Vec::with_capacity(spot.categories.len());
            for name in spot.categories {
                let category = match categories.find_by_name(name).await? {
                    Some(category) => category,
                    None => categories.create(CreateCategory::new(*name)).await?,
                };
                category_ids.push(category.id);
            }

            spots
                .create(CreateSpot {
                    name: spot.name.to_string(),
                    description: Some(spot.description.to_string()),
                    address: Some(spot.address.to_string()),
                    latitude: Some(spot.latitude),
                    longitude: Some(spot.longitude),
                    category_ids: Some(category_ids),
                    image_urls: Some(spot.image_urls.iter().map(|u| u.to_string()).collect()),
                    created_by: Some(self.created_by.clone()),
                })
                .await?;
            created += 1;
        }

        info!("Seeded {created} spots ({skipped} already present)");
        Ok(())
    }
}
