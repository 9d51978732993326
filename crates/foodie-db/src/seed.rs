//! # Demo Data
//!
//! The storefront's demo catalog: four accounts (one admin), eight
//! restaurants with menus, and the `WELCOME20` promotion. Used by the `seed`
//! binary and by tests that need a populated database.
//!
//! Seeding is skipped when restaurants already exist, so running it twice
//! never duplicates rows.

use chrono::{Duration, Utc};
use tracing::info;

use crate::error::DbResult;
use crate::password::hash_password;
use crate::pool::Database;
use crate::repository::menu::{NewMenuCategory, NewMenuItem};
use crate::repository::promotion::NewPromotion;
use crate::repository::restaurant::{RestaurantFilter, RestaurantInput};
use crate::repository::user::NewUser;
use foodie_core::{Discount, Money, UserRole};

const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=200&width=300";
const PLACEHOLDER_DISH: &str = "/placeholder.svg?height=100&width=100";

/// (username, email, password, first, last, phone, role)
const USERS: &[(&str, &str, &str, &str, &str, &str, UserRole)] = &[
    ("johndoe", "john@example.com", "password", "John", "Doe", "+1234567890", UserRole::User),
    ("janesmith", "jane@example.com", "password", "Jane", "Smith", "+1234567891", UserRole::User),
    ("mikejohnson", "mike@example.com", "password", "Mike", "Johnson", "+1234567892", UserRole::User),
    ("admin", "admin@foodie.com", "admin123", "Admin", "User", "+1555000000", UserRole::Admin),
];

struct SeedRestaurant {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    cuisine: &'static str,
    rating: f64,
    review_count: i64,
    delivery_fee_cents: i64,
    minimum_order_cents: i64,
    delivery_time: (i64, i64),
    is_featured: bool,
    phone_suffix: &'static str,
    email_domain: &'static str,
}

const RESTAURANTS: &[SeedRestaurant] = &[
    SeedRestaurant {
        name: "Bella Italia",
        slug: "bella-italia",
        description: "Authentic Italian cuisine with fresh ingredients and traditional recipes",
        cuisine: "Italian",
        rating: 4.8,
        review_count: 324,
        delivery_fee_cents: 299,
        minimum_order_cents: 1500,
        delivery_time: (25, 35),
        is_featured: true,
        phone_suffix: "001",
        email_domain: "bellaitalia.com",
    },
    SeedRestaurant {
        name: "Sushi Master",
        slug: "sushi-master",
        description: "Fresh sushi and Japanese cuisine prepared by master chefs",
        cuisine: "Japanese",
        rating: 4.9,
        review_count: 567,
        delivery_fee_cents: 399,
        minimum_order_cents: 2000,
        delivery_time: (30, 40),
        is_featured: true,
        phone_suffix: "002",
        email_domain: "sushimaster.com",
    },
    SeedRestaurant {
        name: "Burger Palace",
        slug: "burger-palace",
        description: "Gourmet burgers and American classics",
        cuisine: "American",
        rating: 4.6,
        review_count: 892,
        delivery_fee_cents: 199,
        minimum_order_cents: 1000,
        delivery_time: (20, 30),
        is_featured: false,
        phone_suffix: "003",
        email_domain: "burgerpalace.com",
    },
    SeedRestaurant {
        name: "Spice Garden",
        slug: "spice-garden",
        description: "Authentic Indian cuisine with aromatic spices",
        cuisine: "Indian",
        rating: 4.7,
        review_count: 445,
        delivery_fee_cents: 249,
        minimum_order_cents: 1200,
        delivery_time: (35, 45),
        is_featured: true,
        phone_suffix: "004",
        email_domain: "spicegarden.com",
    },
    SeedRestaurant {
        name: "Dragon Palace",
        slug: "dragon-palace",
        description: "Traditional Chinese dishes with modern flair",
        cuisine: "Chinese",
        rating: 4.5,
        review_count: 678,
        delivery_fee_cents: 299,
        minimum_order_cents: 1500,
        delivery_time: (25, 35),
        is_featured: false,
        phone_suffix: "005",
        email_domain: "dragonpalace.com",
    },
    SeedRestaurant {
        name: "Taco Fiesta",
        slug: "taco-fiesta",
        description: "Authentic Mexican street food and tacos",
        cuisine: "Mexican",
        rating: 4.4,
        review_count: 234,
        delivery_fee_cents: 149,
        minimum_order_cents: 800,
        delivery_time: (20, 30),
        is_featured: false,
        phone_suffix: "006",
        email_domain: "tacofiesta.com",
    },
    SeedRestaurant {
        name: "Mediterranean Delight",
        slug: "mediterranean-delight",
        description: "Fresh Mediterranean cuisine with healthy options",
        cuisine: "Mediterranean",
        rating: 4.6,
        review_count: 156,
        delivery_fee_cents: 299,
        minimum_order_cents: 1800,
        delivery_time: (30, 40),
        is_featured: false,
        phone_suffix: "007",
        email_domain: "meddelight.com",
    },
    SeedRestaurant {
        name: "Thai Orchid",
        slug: "thai-orchid",
        description: "Authentic Thai flavors with fresh herbs and spices",
        cuisine: "Thai",
        rating: 4.7,
        review_count: 389,
        delivery_fee_cents: 249,
        minimum_order_cents: 1400,
        delivery_time: (25, 35),
        is_featured: false,
        phone_suffix: "008",
        email_domain: "thaiorchid.com",
    },
];

/// (name, description, price cents, popular, dietary tags)
type Dish = (&'static str, &'static str, i64, bool, &'static [&'static str]);

/// Menus by restaurant slug: categories in display order.
const MENUS: &[(&str, &[(&str, &[Dish])])] = &[
    (
        "bella-italia",
        &[
            (
                "Appetizers",
                &[
                    ("Bruschetta", "Grilled bread topped with fresh tomatoes, garlic, and basil", 899, true, &["vegetarian"]),
                    ("Calamari Rings", "Crispy fried squid rings served with marinara sauce", 1299, false, &[]),
                ],
            ),
            (
                "Pasta",
                &[
                    ("Spaghetti Carbonara", "Classic pasta with eggs, cheese, pancetta, and black pepper", 1699, true, &[]),
                    ("Fettuccine Alfredo", "Creamy pasta with parmesan cheese and butter", 1599, false, &["vegetarian"]),
                ],
            ),
        ],
    ),
    (
        "sushi-master",
        &[
            (
                "Rolls",
                &[
                    ("California Roll", "Crab, avocado and cucumber", 899, true, &[]),
                    ("Avocado Roll", "Ripe avocado wrapped in seasoned rice", 699, false, &["vegan"]),
                ],
            ),
            (
                "Nigiri",
                &[("Salmon Nigiri", "Two pieces of fresh salmon over rice", 799, true, &["gluten-free"])],
            ),
        ],
    ),
    (
        "burger-palace",
        &[
            (
                "Burgers",
                &[
                    ("Classic Cheeseburger", "Beef patty, cheddar, lettuce, tomato", 1199, true, &[]),
                    ("Veggie Burger", "Black bean patty with chipotle mayo", 1099, false, &["vegetarian"]),
                ],
            ),
            ("Sides", &[("Fries", "Hand-cut fries with sea salt", 399, true, &["vegan"])]),
        ],
    ),
    (
        "spice-garden",
        &[(
            "Curries",
            &[
                ("Butter Chicken", "Tandoori chicken in a creamy tomato sauce", 1599, true, &["gluten-free"]),
                ("Chana Masala", "Chickpeas simmered with onions and spices", 1299, false, &["vegan"]),
            ],
        )],
    ),
    (
        "dragon-palace",
        &[(
            "Mains",
            &[
                ("Kung Pao Chicken", "Wok-fried chicken with peanuts and chili", 1399, true, &[]),
                ("Vegetable Lo Mein", "Egg noodles with seasonal vegetables", 1199, false, &["vegetarian"]),
            ],
        )],
    ),
    (
        "taco-fiesta",
        &[(
            "Tacos",
            &[
                ("Carne Asada Taco", "Grilled steak, onion, cilantro", 399, true, &["gluten-free"]),
                ("Al Pastor Taco", "Marinated pork with pineapple", 399, false, &["gluten-free"]),
            ],
        )],
    ),
    (
        "mediterranean-delight",
        &[(
            "Plates",
            &[
                ("Falafel Plate", "Falafel, hummus, tabbouleh and pita", 1499, true, &["vegan"]),
                ("Chicken Shawarma", "Spiced chicken with garlic sauce", 1599, false, &[]),
            ],
        )],
    ),
    (
        "thai-orchid",
        &[(
            "Noodles",
            &[
                ("Pad Thai", "Rice noodles, tamarind, peanuts and lime", 1399, true, &[]),
                ("Drunken Noodles", "Wide noodles with basil and chili", 1399, false, &[]),
            ],
        )],
    ),
];

/// Row counts written by a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub restaurants: usize,
    pub menu_items: usize,
    pub promotions: usize,
}

/// Seeds accounts and the catalog. Returns `None` when the database already
/// has restaurants.
pub async fn seed_demo_data(db: &Database) -> DbResult<Option<SeedSummary>> {
    if already_seeded(db).await? {
        info!("Restaurants present, skipping seed");
        return Ok(None);
    }

    let users = seed_users(db).await?;
    let summary = seed_catalog(db).await?.map(|catalog| SeedSummary { users, ..catalog });

    Ok(summary)
}

/// Seeds the demo accounts. Passwords are hashed once per distinct value.
pub async fn seed_users(db: &Database) -> DbResult<usize> {
    let user_hash = hash_password("password")?;
    let admin_hash = hash_password("admin123")?;

    for (username, email, password, first, last, phone, role) in USERS {
        let password_hash = if *password == "admin123" {
            admin_hash.clone()
        } else {
            user_hash.clone()
        };

        db.users()
            .insert(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                first_name: first.to_string(),
                last_name: last.to_string(),
                phone: Some(phone.to_string()),
                role: *role,
            })
            .await?;
    }

    info!(count = USERS.len(), "Users seeded");
    Ok(USERS.len())
}

/// Seeds restaurants, menus and the welcome promotion, without accounts.
/// Returns `None` when the database already has restaurants.
pub async fn seed_catalog(db: &Database) -> DbResult<Option<SeedSummary>> {
    if already_seeded(db).await? {
        return Ok(None);
    }

    let mut summary = SeedSummary::default();

    for (index, seed) in RESTAURANTS.iter().enumerate() {
        let restaurant = db
            .restaurants()
            .insert(&RestaurantInput {
                name: seed.name.to_string(),
                slug: seed.slug.to_string(),
                description: seed.description.to_string(),
                cuisine: seed.cuisine.to_string(),
                phone: format!("+1555123{}", seed.phone_suffix),
                email: Some(format!("info@{}", seed.email_domain)),
                image_url: Some(PLACEHOLDER_IMAGE.to_string()),
                address: format!("{} Main Street, Downtown", 100 * (index + 1)),
                delivery_fee: Money::from_cents(seed.delivery_fee_cents),
                minimum_order: Money::from_cents(seed.minimum_order_cents),
                delivery_time_min: seed.delivery_time.0,
                delivery_time_max: seed.delivery_time.1,
                is_open: true,
                is_featured: seed.is_featured,
            })
            .await?;

        // Listing ratings predate the reviews table
        sqlx::query("UPDATE restaurants SET rating = ?2, review_count = ?3 WHERE id = ?1")
            .bind(restaurant.id)
            .bind(seed.rating)
            .bind(seed.review_count)
            .execute(db.pool())
            .await?;

        summary.restaurants += 1;

        let Some((_, categories)) = MENUS.iter().find(|(slug, _)| *slug == seed.slug) else {
            continue;
        };

        for (category_order, (category_name, dishes)) in categories.iter().enumerate() {
            let category = db
                .menus()
                .insert_category(&NewMenuCategory {
                    restaurant_id: restaurant.id,
                    name: category_name.to_string(),
                    description: None,
                    sort_order: category_order as i64 + 1,
                })
                .await?;

            for (dish_order, (name, description, cents, popular, tags)) in dishes.iter().enumerate() {
                db.menus()
                    .insert_item(&NewMenuItem {
                        restaurant_id: restaurant.id,
                        category_id: category.id,
                        name: name.to_string(),
                        description: description.to_string(),
                        price: Money::from_cents(*cents),
                        image_url: Some(PLACEHOLDER_DISH.to_string()),
                        is_popular: *popular,
                        dietary_tags: tags.iter().map(|t| t.to_string()).collect(),
                        allergens: Vec::new(),
                        calories: None,
                        preparation_time: 15,
                        sort_order: dish_order as i64 + 1,
                    })
                    .await?;
                summary.menu_items += 1;
            }
        }
    }

    let now = Utc::now();
    db.promotions()
        .insert(&NewPromotion {
            title: "Welcome Offer".to_string(),
            description: "Get 20% off your first order".to_string(),
            code: "WELCOME20".to_string(),
            discount: Discount::Percentage(2000),
            minimum_order: Money::from_cents(1500),
            max_discount: Some(Money::from_cents(1000)),
            usage_limit: Some(100),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
            is_active: true,
            applicable_restaurants: Vec::new(),
        })
        .await?;
    summary.promotions = 1;

    info!(
        restaurants = summary.restaurants,
        menu_items = summary.menu_items,
        "Catalog seeded"
    );
    Ok(Some(summary))
}

async fn already_seeded(db: &Database) -> DbResult<bool> {
    let filter = RestaurantFilter {
        include_inactive: true,
        ..Default::default()
    };
    Ok(db.restaurants().list(&filter).await?.total > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    #[tokio::test]
    async fn test_catalog_seed_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let summary = seed_catalog(&db).await.unwrap().unwrap();
        assert_eq!(summary.restaurants, 8);
        assert_eq!(summary.promotions, 1);
        assert!(summary.menu_items >= 16);

        assert!(seed_catalog(&db).await.unwrap().is_none());
        assert!(seed_demo_data(&db).await.unwrap().is_none());

        let bella = db.restaurants().get_by_slug("bella-italia").await.unwrap().unwrap();
        assert_eq!(bella.id, 1);
        assert_eq!(bella.rating, 4.8);
        assert_eq!(bella.phone, "+1555123001");

        let menu = db.menus().menu_for_restaurant(bella.id).await.unwrap();
        assert_eq!(menu[0].name, "Appetizers");
        assert_eq!(menu[0].items[0].price.cents(), 899);
    }

    #[tokio::test]
    async fn test_demo_data_includes_admin() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let summary = seed_demo_data(&db).await.unwrap().unwrap();
        assert_eq!(summary.users, 4);

        let admin = db.users().get_by_email("admin@foodie.com").await.unwrap().unwrap();
        assert!(admin.user.is_admin());
        assert!(crate::password::verify_password("admin123", &admin.password_hash));
    }
}
